/// The authenticated-caller capability the HTTP layer asks of a user record.
///
/// Only bearer access tokens and fresh logins authenticate a caller; the
/// remember-me auth key flow is unsupported, so implementors return no key
/// and reject every key presented.
pub trait Identity: Send + Sync {
    fn id(&self) -> &str;

    fn auth_key(&self) -> Option<&str> {
        None
    }

    fn validate_auth_key(&self, _auth_key: &str) -> bool {
        false
    }
}
