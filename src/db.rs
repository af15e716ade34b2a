use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Errors surfaced by the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("no matching record found")]
    NotFound,
    #[error("duplicate email")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")?;
    Ok(db)
}

/// True when `err` is a unique-constraint violation on `constraint`.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505") && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}
