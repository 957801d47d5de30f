use serde::Serialize;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::answers::Answer;
use crate::auth::identity::Identity;
use crate::datetime::sql_datetime;

use super::repo::UserStore;

/// Row of the `user` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Argon2id PHC string, never serialized. Bounded at 128 chars rather than
    /// bcrypt's 60, since PHC strings run to about 97.
    pub encrypted_password: String,
    pub access_token: String,
    pub created_at: Option<PrimitiveDateTime>,
    pub updated_at: Option<PrimitiveDateTime>,
    /// Plaintext input; hashed into `encrypted_password` on the next save.
    #[sqlx(skip)]
    pub password: Option<String>,
    #[sqlx(skip)]
    pub(crate) is_new: bool,
}

/// Outbound projection of a [`User`].
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(with = "sql_datetime::option")]
    pub created_at: Option<PrimitiveDateTime>,
    #[serde(with = "sql_datetime::option")]
    pub updated_at: Option<PrimitiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<Answer>>,
}

pub fn attribute_label(attr: &str) -> &'static str {
    match attr {
        "id" => "ID",
        "username" => "Login",
        "email" => "Email",
        "password" => "Password",
        "encrypted_password" => "Encrypted Password",
        "access_token" => "Access Token",
        "updated_at" => "Updated At",
        "created_at" => "Created At",
        _ => "Value",
    }
}

impl User {
    /// Unsaved record; `id`, `access_token` and `created_at` are assigned on insert.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            username: username.into(),
            email: email.into(),
            encrypted_password: String::new(),
            access_token: String::new(),
            created_at: None,
            updated_at: None,
            password: None,
            is_new: true,
        }
    }

    pub fn is_new_record(&self) -> bool {
        self.is_new
    }

    fn is_owned_by(&self, requester: Option<&dyn Identity>) -> bool {
        requester.is_some_and(|who| !self.id.is_empty() && who.id() == self.id)
    }

    /// Projection for `requester`: `encrypted_password` is never included and
    /// `access_token` only when the requester is this user.
    pub fn fields(&self, requester: Option<&dyn Identity>) -> UserResponse {
        UserResponse {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            access_token: self
                .is_owned_by(requester)
                .then(|| self.access_token.clone()),
            answers: None,
        }
    }

    /// [`User::fields`] plus the related answers, queried now.
    pub async fn to_response(
        &self,
        store: &dyn UserStore,
        requester: Option<&dyn Identity>,
    ) -> anyhow::Result<UserResponse> {
        let mut out = self.fields(requester);
        out.answers = Some(self.answers(store).await?);
        Ok(out)
    }

    /// Answers owned by this user. Not cached: every call hits the store.
    pub async fn answers(&self, store: &dyn UserStore) -> anyhow::Result<Vec<Answer>> {
        if self.id.is_empty() {
            return Ok(Vec::new());
        }
        store.answers_by_user(&self.id).await
    }
}

impl Identity for User {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved(id: &str) -> User {
        let mut u = User::new("alice", "alice@x.com");
        u.id = id.into();
        u.encrypted_password = "$argon2id$v=19$stub".into();
        u.access_token = "tok-123".into();
        u.is_new = false;
        u
    }

    #[test]
    fn owner_sees_access_token() {
        let u = saved("u1");
        let out = u.fields(Some(&u));
        assert_eq!(out.access_token.as_deref(), Some("tok-123"));
    }

    #[test]
    fn other_caller_and_anonymous_do_not() {
        let u = saved("u1");
        let other = saved("u2");
        assert!(u.fields(Some(&other)).access_token.is_none());
        assert!(u.fields(None).access_token.is_none());
    }

    #[test]
    fn unsaved_record_never_matches_a_caller() {
        let u = User::new("a", "a@x.com");
        let blank = User::new("b", "b@x.com");
        assert!(u.fields(Some(&blank)).access_token.is_none());
    }

    #[test]
    fn serialized_json_never_has_hash() {
        let u = saved("u1");
        let json = serde_json::to_value(u.fields(Some(&u))).unwrap();
        assert!(json.get("encrypted_password").is_none());
        assert!(json.get("password").is_none());
        assert_eq!(json["access_token"], "tok-123");

        let json = serde_json::to_value(u.fields(None)).unwrap();
        assert!(json.get("access_token").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn auth_key_flow_is_unsupported() {
        let u = saved("u1");
        assert_eq!(Identity::id(&u), "u1");
        assert!(u.auth_key().is_none());
        assert!(!u.validate_auth_key(""));
        assert!(!u.validate_auth_key("tok-123"));
    }

    #[test]
    fn labels() {
        assert_eq!(attribute_label("username"), "Login");
        assert_eq!(attribute_label("encrypted_password"), "Encrypted Password");
    }
}
