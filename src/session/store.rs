use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use tower_sessions::{
    session::{Id, Record},
    session_store::{self, ExpiredDeletion},
    SessionStore,
};

/// Session records kept in the `sessions` table.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    db: PgPool,
}

impl PgSessionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// A `sessions` row as loaded; the key is the `Id` it was looked up by.
#[derive(Debug, FromRow)]
struct SessionRow {
    data: Json<HashMap<String, serde_json::Value>>,
    expiry: OffsetDateTime,
}

impl SessionRow {
    fn into_record(self, id: Id) -> Record {
        Record {
            id,
            data: self.data.0,
            expiry_date: self.expiry,
        }
    }
}

fn backend(e: sqlx::Error) -> session_store::Error {
    session_store::Error::Backend(e.to_string())
}

#[async_trait]
impl ExpiredDeletion for PgSessionStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let result = sqlx::query(r#"DELETE FROM sessions WHERE expiry < now()"#)
            .execute(&self.db)
            .await
            .map_err(backend)?;
        if result.rows_affected() > 0 {
            tracing::debug!(deleted = result.rows_affected(), "expired sessions purged");
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        loop {
            let inserted = sqlx::query(
                r#"
                INSERT INTO sessions (id, data, expiry)
                VALUES ($1, $2, $3)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(record.id.to_string())
            .bind(Json(&record.data))
            .bind(record.expiry_date)
            .execute(&self.db)
            .await
            .map_err(backend)?;

            if inserted.rows_affected() == 1 {
                return Ok(());
            }
            record.id = Id::default();
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, data, expiry)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET data = excluded.data, expiry = excluded.expiry
            "#,
        )
        .bind(record.id.to_string())
        .bind(Json(&record.data))
        .bind(record.expiry_date)
        .execute(&self.db)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"SELECT data, expiry FROM sessions WHERE id = $1 AND expiry > now()"#,
        )
        .bind(session_id.to_string())
        .fetch_optional(&self.db)
        .await
        .map_err(backend)?;

        Ok(row.map(|row| row.into_record(*session_id)))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        sqlx::query(r#"DELETE FROM sessions WHERE id = $1"#)
            .bind(session_id.to_string())
            .execute(&self.db)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
