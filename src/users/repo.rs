use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::answers::Answer;
use crate::error::UserError;

use super::model::User;
use super::validation::ValidationErrors;

/// Columns a user can be looked up by besides `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Username,
    Email,
    AccessToken,
}

impl UserField {
    pub fn column(self) -> &'static str {
        match self {
            UserField::Username => "username",
            UserField::Email => "email",
            UserField::AccessToken => "access_token",
        }
    }

    pub fn value_of(self, user: &User) -> &str {
        match self {
            UserField::Username => &user.username,
            UserField::Email => &user.email,
            UserField::AccessToken => &user.access_token,
        }
    }
}

/// Persistence gateway for [`User`] rows and their answers.
///
/// `insert` and `update` must reject duplicate `username`, `email` and
/// `access_token` values with [`UserError::Validation`], independently of the
/// check done by validation before the write.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_field(&self, field: UserField, value: &str) -> anyhow::Result<Option<User>>;
    async fn insert(&self, user: &User) -> Result<(), UserError>;
    async fn update(&self, user: &User) -> Result<(), UserError>;
    async fn answers_by_user(&self, user_id: &str) -> anyhow::Result<Vec<Answer>>;
}

// Blank username / email are stored as NULL so UNIQUE ignores them.
const USER_COLUMNS: &str = "id, COALESCE(username, '') AS username, COALESCE(email, '') AS email, \
     encrypted_password, access_token, created_at, updated_at";

fn nullable(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn constraint_field(constraint: &str) -> Option<UserField> {
    match constraint {
        "user_username_key" => Some(UserField::Username),
        "user_email_key" => Some(UserField::Email),
        "user_access_token_key" => Some(UserField::AccessToken),
        _ => None,
    }
}

fn map_write_error(user: &User, e: sqlx::Error) -> UserError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(field) = db_err.constraint().and_then(constraint_field) {
                debug!(field = field.column(), "unique constraint rejected write");
                return UserError::Validation(ValidationErrors::taken(field, field.value_of(user)));
            }
        }
    }
    UserError::from(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM "user" WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_field(&self, field: UserField, value: &str) -> anyhow::Result<Option<User>> {
        if value.is_empty() {
            return Ok(None);
        }
        let user = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM "user" WHERE {} = $1 LIMIT 1"#,
            field.column()
        ))
        .bind(value)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: &User) -> Result<(), UserError> {
        sqlx::query(
            r#"
            INSERT INTO "user" (id, username, email, encrypted_password, access_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&user.id)
        .bind(nullable(&user.username))
        .bind(nullable(&user.email))
        .bind(&user.encrypted_password)
        .bind(&user.access_token)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| map_write_error(user, e))?;
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), UserError> {
        // id, created_at and access_token are immutable after insert
        let res = sqlx::query(
            r#"
            UPDATE "user"
               SET username = $2, email = $3, encrypted_password = $4, updated_at = $5
             WHERE id = $1
            "#,
        )
        .bind(&user.id)
        .bind(nullable(&user.username))
        .bind(nullable(&user.email))
        .bind(&user.encrypted_password)
        .bind(user.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| map_write_error(user, e))?;
        if res.rows_affected() == 0 {
            return Err(UserError::NotFound);
        }
        Ok(())
    }

    async fn answers_by_user(&self, user_id: &str) -> anyhow::Result<Vec<Answer>> {
        let rows = sqlx::query_as::<_, Answer>(
            r#"
            SELECT id, user_id, question_id, body, created_at
              FROM user_answer
             WHERE user_id = $1
             ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
