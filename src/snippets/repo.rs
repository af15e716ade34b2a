use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::db::DbError;

/// How many snippets the home page lists.
pub const LATEST_LIMIT: i64 = 10;

/// Snippet record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: OffsetDateTime,
    pub expires: OffsetDateTime,
}

#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Fetch a live (unexpired) snippet by id.
    async fn get(&self, id: i64) -> Result<Snippet, DbError>;
    /// Newest live snippets first, at most `limit` of them.
    async fn latest(&self, limit: i64) -> Result<Vec<Snippet>, DbError>;
    /// Insert a snippet that expires `expires_days` from now and return its id.
    async fn insert(&self, title: &str, content: &str, expires_days: i32) -> Result<i64, DbError>;
}

#[derive(Clone)]
pub struct PgSnippetStore {
    db: PgPool,
}

impl PgSnippetStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SnippetStore for PgSnippetStore {
    async fn get(&self, id: i64) -> Result<Snippet, DbError> {
        sqlx::query_as::<_, Snippet>(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > now() AND id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(DbError::NotFound)
    }

    async fn latest(&self, limit: i64) -> Result<Vec<Snippet>, DbError> {
        let rows = sqlx::query_as::<_, Snippet>(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > now()
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn insert(&self, title: &str, content: &str, expires_days: i32) -> Result<i64, DbError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO snippets (title, content, created, expires)
            VALUES ($1, $2, now(), now() + make_interval(days => $3))
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(expires_days)
        .fetch_one(&self.db)
        .await?;
        Ok(id)
    }
}

#[cfg(test)]
pub mod fake {
    use std::sync::Mutex;

    use time::{Duration, OffsetDateTime};

    use super::*;

    /// In-memory store seeded with a single snippet (id 1).
    pub struct FakeSnippetStore {
        rows: Mutex<Vec<Snippet>>,
    }

    impl FakeSnippetStore {
        pub fn seeded() -> Self {
            let now = OffsetDateTime::now_utc();
            Self {
                rows: Mutex::new(vec![Snippet {
                    id: 1,
                    title: "An old silent pond...".into(),
                    content: "An old silent pond...\nA frog jumps into the pond,\nsplash! Silence again.".into(),
                    created: now,
                    expires: now + Duration::days(365),
                }]),
            }
        }

        pub fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SnippetStore for FakeSnippetStore {
        async fn get(&self, id: i64) -> Result<Snippet, DbError> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .ok_or(DbError::NotFound)
        }

        async fn latest(&self, limit: i64) -> Result<Vec<Snippet>, DbError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().rev().take(limit as usize).cloned().collect())
        }

        async fn insert(&self, title: &str, content: &str, expires_days: i32) -> Result<i64, DbError> {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.last().map(|s| s.id + 1).unwrap_or(1);
            let now = OffsetDateTime::now_utc();
            rows.push(Snippet {
                id,
                title: title.into(),
                content: content.into(),
                created: now,
                expires: now + Duration::days(expires_days.into()),
            });
            Ok(id)
        }
    }
}
