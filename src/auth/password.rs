//! argon2id password hashing.
//!
//! Hashing is CPU-heavy; handlers and stores call the `*_off_thread`
//! wrappers, which run it on tokio's blocking pool.

use anyhow::Context;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

/// PHC string for `plain` under a fresh random salt.
pub fn hash_password(plain: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(plain.as_bytes(), &salt)?
        .to_string())
}

/// `Ok(false)` on a mismatch. Errors only when `hash` is not a usable PHC
/// string.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

pub async fn hash_off_thread(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .context("password hashing task")?
        .map_err(|e| anyhow::anyhow!("hash password: {e}"))
}

pub async fn verify_off_thread(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .context("password verification task")?
        .map_err(|e| anyhow::anyhow!("verify password: {e}"))
}
