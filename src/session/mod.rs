//! Server-side sessions.
//!
//! The session id lives in a signed cookie; the key/value state lives in a
//! pluggable `SessionStore` (memory in tests, Postgres in production). The
//! cookie layer itself is assembled in `app::build_app`.

pub mod store;

use rand::{distributions::Alphanumeric, Rng};
use tower_sessions::{cookie::Key, Session};

pub use store::PgSessionStore;

pub const SESSION_COOKIE_NAME: &str = "snippetbox_session";
pub const AUTHENTICATED_USER_ID: &str = "authenticatedUserID";
pub const FLASH: &str = "flash";
pub const CSRF_TOKEN: &str = "csrfToken";

const CSRF_TOKEN_LEN: usize = 32;

pub type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// Cookie signing key derived from the configured secret.
pub fn signing_key(secret: &str) -> anyhow::Result<Key> {
    Key::try_from(secret.as_bytes()).map_err(|e| anyhow::anyhow!("invalid session secret: {e}"))
}

pub async fn put_flash(session: &Session, message: &str) -> SessionResult<()> {
    session.insert(FLASH, message).await
}

/// Read-once: the flash is gone after this returns it. A session without a
/// flash is left untouched.
pub async fn pop_flash(session: &Session) -> SessionResult<Option<String>> {
    if !exists(session, FLASH).await? {
        return Ok(None);
    }
    session.remove::<String>(FLASH).await
}

pub async fn authenticated_user_id(session: &Session) -> SessionResult<Option<i64>> {
    session.get::<i64>(AUTHENTICATED_USER_ID).await
}

pub async fn exists(session: &Session, key: &str) -> SessionResult<bool> {
    Ok(session.get::<serde_json::Value>(key).await?.is_some())
}

/// The CSRF token bound to this session, minted on first use.
pub async fn csrf_token(session: &Session) -> SessionResult<String> {
    if let Some(token) = session.get::<String>(CSRF_TOKEN).await? {
        return Ok(token);
    }
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LEN)
        .map(char::from)
        .collect();
    session.insert(CSRF_TOKEN, &token).await?;
    Ok(token)
}
