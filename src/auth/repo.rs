use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    auth::password::verify_off_thread,
    db::{is_unique_violation, DbError},
};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user; a taken email is `DbError::DuplicateEmail`.
    async fn insert(&self, name: &str, email: &str, password_hash: &str) -> Result<(), DbError>;
    /// Return the id of the user matching both email and password.
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, DbError>;
    async fn exists(&self, id: i64) -> Result<bool, DbError>;
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

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, name: &str, email: &str, password_hash: &str) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, hashed_password, created)
            VALUES ($1, $2, $3, now())
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .execute(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e, "users_uc_email") => Err(DbError::DuplicateEmail),
            Err(e) => Err(e.into()),
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, DbError> {
        let row: Option<(i64, String)> =
            sqlx::query_as(r#"SELECT id, hashed_password FROM users WHERE email = $1"#)
                .bind(email)
                .fetch_optional(&self.db)
                .await?;

        let Some((id, hash)) = row else {
            return Err(DbError::InvalidCredentials);
        };

        if !verify_off_thread(password.to_owned(), hash).await? {
            return Err(DbError::InvalidCredentials);
        }
        Ok(id)
    }

    async fn exists(&self, id: i64) -> Result<bool, DbError> {
        let exists: bool = sqlx::query_scalar(r#"SELECT EXISTS(SELECT true FROM users WHERE id = $1)"#)
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        Ok(exists)
    }
}

#[cfg(test)]
pub mod fake {
    use std::sync::Mutex;

    use super::*;

    /// In-memory users. `alice@example.com` (id 1) signs in with `pa55word`;
    /// `dupe@example.com` (id 2) exists only to collide on signup.
    pub struct FakeUserStore {
        users: Mutex<Vec<(i64, String, String)>>,
    }

    impl FakeUserStore {
        pub fn seeded() -> Self {
            Self {
                users: Mutex::new(vec![
                    (1, "alice@example.com".into(), String::new()),
                    (2, "dupe@example.com".into(), String::new()),
                ]),
            }
        }

        pub fn password_hash(&self, email: &str) -> Option<String> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|(_, e, _)| e == email)
                .map(|(_, _, hash)| hash.clone())
        }

        pub fn remove(&self, id: i64) {
            self.users.lock().unwrap().retain(|(uid, _, _)| *uid != id);
        }

        pub fn len(&self) -> usize {
            self.users.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl UserStore for FakeUserStore {
        async fn insert(&self, _name: &str, email: &str, password_hash: &str) -> Result<(), DbError> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|(_, e, _)| e == email) {
                return Err(DbError::DuplicateEmail);
            }
            let id = users.iter().map(|(id, _, _)| *id).max().unwrap_or(0) + 1;
            users.push((id, email.into(), password_hash.into()));
            Ok(())
        }

        async fn authenticate(&self, email: &str, password: &str) -> Result<i64, DbError> {
            if email == "alice@example.com" && password == "pa55word" {
                return Ok(1);
            }
            Err(DbError::InvalidCredentials)
        }

        async fn exists(&self, id: i64) -> Result<bool, DbError> {
            Ok(self.users.lock().unwrap().iter().any(|(uid, _, _)| *uid == id))
        }
    }
}
