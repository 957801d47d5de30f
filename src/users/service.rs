use tracing::{debug, info, warn};

use crate::auth::password::{generate_access_token, generate_id, hash_password, verify_password};
use crate::datetime::now_seconds;
use crate::error::UserError;

use super::dto::{CreateUser, UpdateUser};
use super::model::User;
use super::repo::{UserField, UserStore};
use super::validation::{self, Scenario};

impl User {
    /// Validate and insert a new user. Username, email and password are required.
    pub async fn create(store: &dyn UserStore, input: CreateUser) -> Result<User, UserError> {
        let mut user = User::new(input.username, input.email);
        user.password = input.password;
        user.persist(store, Scenario::Create).await?;
        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    /// Replace username and email, and the password when one is given.
    ///
    /// On error `self` is left as it was.
    pub async fn update(&mut self, store: &dyn UserStore, input: UpdateUser) -> Result<(), UserError> {
        let mut next = self.clone();
        next.username = input.username;
        next.email = input.email;
        next.password = input.password;
        next.persist(store, Scenario::Update).await?;
        info!(user_id = %next.id, "user updated");
        *self = next;
        Ok(())
    }

    /// Save with no required fields: inserts when new, updates otherwise.
    pub async fn save(&mut self, store: &dyn UserStore) -> Result<(), UserError> {
        let mut next = self.clone();
        next.persist(store, Scenario::Default).await?;
        *self = next;
        Ok(())
    }

    async fn persist(&mut self, store: &dyn UserStore, scenario: Scenario) -> Result<(), UserError> {
        let errors = validation::validate(store, self, scenario).await?;
        if !errors.is_empty() {
            warn!(?scenario, %errors, "user validation failed");
            return Err(UserError::Validation(errors));
        }

        let insert = self.is_new_record();
        if !self.before_save(insert)? {
            return Err(UserError::SaveAborted);
        }

        if insert {
            store.insert(self).await?;
            self.is_new = false;
        } else {
            store.update(self).await?;
        }
        Ok(())
    }

    /// Runs right before every write; returning `false` cancels it.
    ///
    /// Hashes a pending plaintext password, stamps `updated_at`, and on insert
    /// assigns `id`, `created_at` and `access_token`.
    pub(crate) fn before_save(&mut self, insert: bool) -> Result<bool, UserError> {
        if let Some(plain) = self.password.take().filter(|p| !p.is_empty()) {
            self.encrypted_password =
                hash_password(&plain).map_err(|e| UserError::Hash(e.to_string()))?;
            debug!("password re-hashed");
        }

        let now = now_seconds();
        if insert {
            self.id = generate_id();
            self.created_at = Some(now);
            self.access_token = generate_access_token();
        }
        self.updated_at = Some(now);
        Ok(true)
    }

    pub async fn find_identity(store: &dyn UserStore, id: &str) -> anyhow::Result<Option<User>> {
        store.find_by_id(id).await
    }

    /// Exact match on `access_token`. `kind` is accepted for the caller's
    /// convenience and ignored.
    pub async fn find_identity_by_access_token(
        store: &dyn UserStore,
        token: &str,
        _kind: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        if token.is_empty() {
            return Ok(None);
        }
        store.find_by_field(UserField::AccessToken, token).await
    }

    /// Fresh login: the user with `email` if `password` matches its hash.
    pub async fn authenticate(
        store: &dyn UserStore,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, UserError> {
        let Some(user) = store.find_by_field(UserField::Email, email).await? else {
            return Ok(None);
        };
        if user.encrypted_password.is_empty() {
            return Ok(None);
        }
        let ok = verify_password(password, &user.encrypted_password)
            .map_err(|e| UserError::Hash(e.to_string()))?;
        Ok(ok.then_some(user))
    }
}
