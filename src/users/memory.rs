use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::answers::Answer;
use crate::error::UserError;

use super::model::User;
use super::repo::{UserField, UserStore};
use super::validation::ValidationErrors;

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    answers: Vec<Answer>,
}

/// In-process [`UserStore`] for running without Postgres.
///
/// Enforces the same uniqueness constraints as the `user` table.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<Inner>,
}

impl MemoryUserStore {
    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory user store lock poisoned"))
    }

    #[cfg(test)]
    pub fn push_answer(&self, user_id: &str, question_id: i64, body: &str) -> Answer {
        let mut inner = self.lock().expect("lock");
        let answer = Answer {
            id: inner.answers.len() as i64 + 1,
            user_id: user_id.to_string(),
            question_id,
            body: body.to_string(),
            created_at: crate::datetime::now_seconds(),
        };
        inner.answers.push(answer.clone());
        answer
    }
}

/// Stored copy: no plaintext, marked persisted.
fn stored(user: &User) -> User {
    let mut row = user.clone();
    row.password = None;
    row.is_new = false;
    row
}

/// Blank values never collide, like NULLs under a UNIQUE constraint.
fn check_unique(rows: &[User], user: &User) -> Result<(), UserError> {
    for field in [UserField::Username, UserField::Email, UserField::AccessToken] {
        let value = field.value_of(user);
        if value.is_empty() {
            continue;
        }
        if rows
            .iter()
            .any(|r| r.id != user.id && field.value_of(r) == value)
        {
            return Err(UserError::Validation(ValidationErrors::taken(field, value)));
        }
    }
    Ok(())
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_field(&self, field: UserField, value: &str) -> anyhow::Result<Option<User>> {
        if value.is_empty() {
            return Ok(None);
        }
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|u| field.value_of(u) == value)
            .cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), UserError> {
        let mut inner = self.lock()?;
        if inner.users.iter().any(|u| u.id == user.id) {
            return Err(UserError::Store(anyhow::anyhow!("duplicate primary key {}", user.id)));
        }
        check_unique(&inner.users, user)?;
        inner.users.push(stored(user));
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), UserError> {
        let mut inner = self.lock()?;
        check_unique(&inner.users, user)?;
        let row = inner
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(UserError::NotFound)?;
        row.username = user.username.clone();
        row.email = user.email.clone();
        row.encrypted_password = user.encrypted_password.clone();
        row.updated_at = user.updated_at;
        Ok(())
    }

    async fn answers_by_user(&self, user_id: &str) -> anyhow::Result<Vec<Answer>> {
        Ok(self
            .lock()?
            .answers
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, username: &str, email: &str, token: &str) -> User {
        let mut u = User::new(username, email);
        u.id = id.into();
        u.access_token = token.into();
        u
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryUserStore::default();
        let mut u = row("1", "alice", "alice@x.com", "t1");
        u.password = Some("secret1".into());
        store.insert(&u).await.unwrap();

        let found = store.find_by_id("1").await.unwrap().unwrap();
        assert_eq!(found.email, "alice@x.com");
        assert!(found.password.is_none());
        assert!(!found.is_new_record());

        let by_token = store.find_by_field(UserField::AccessToken, "t1").await.unwrap();
        assert_eq!(by_token.unwrap().id, "1");
        assert!(store.find_by_id("2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn storage_backstop_rejects_duplicates() {
        let store = MemoryUserStore::default();
        store.insert(&row("1", "alice", "alice@x.com", "t1")).await.unwrap();

        let err = store
            .insert(&row("2", "bob", "alice@x.com", "t2"))
            .await
            .unwrap_err();
        match err {
            UserError::Validation(errors) => assert!(errors.has("email")),
            other => panic!("unexpected {other:?}"),
        }

        let err = store
            .insert(&row("3", "alice", "carol@x.com", "t3"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Validation(ref e) if e.has("username")));
    }

    #[tokio::test]
    async fn blank_values_do_not_collide() {
        let store = MemoryUserStore::default();
        store.insert(&row("1", "carol", "", "t1")).await.unwrap();
        store.insert(&row("2", "dave", "", "t2")).await.unwrap();
        store.insert(&row("3", "", "erin@x.com", "t3")).await.unwrap();
        store.insert(&row("4", "", "frank@x.com", "t4")).await.unwrap();
        assert!(store.find_by_field(UserField::Email, "").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_keeps_immutable_columns() {
        let store = MemoryUserStore::default();
        store.insert(&row("1", "alice", "alice@x.com", "t1")).await.unwrap();

        let mut changed = row("1", "alice2", "alice2@x.com", "forged");
        changed.created_at = Some(crate::datetime::now_seconds());
        store.update(&changed).await.unwrap();

        let found = store.find_by_id("1").await.unwrap().unwrap();
        assert_eq!(found.username, "alice2");
        assert_eq!(found.access_token, "t1");
        assert!(found.created_at.is_none());
    }

    #[tokio::test]
    async fn update_missing_row_is_not_found() {
        let store = MemoryUserStore::default();
        let err = store.update(&row("9", "x", "x@x.com", "t")).await.unwrap_err();
        assert!(matches!(err, UserError::NotFound));
    }

    #[tokio::test]
    async fn answers_filtered_by_user() {
        let store = MemoryUserStore::default();
        store.push_answer("1", 10, "yes");
        store.push_answer("2", 10, "no");
        store.push_answer("1", 11, "maybe");
        let answers = store.answers_by_user("1").await.unwrap();
        assert_eq!(answers.len(), 2);
        assert!(answers.iter().all(|a| a.user_id == "1"));
    }
}
