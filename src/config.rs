use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;

/// Minimum length accepted for the cookie signing secret.
pub const MIN_SESSION_SECRET_LEN: usize = 64;

/// `read` bounds receiving a request body, `write` bounds the whole request,
/// `idle` bounds how long a connection may wait for its next request head.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub read: Duration,
    pub write: Duration,
    pub idle: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub static_dir: PathBuf,
    pub database_url: String,
    pub session_secret: String,
    pub timeouts: TimeoutConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let addr = var("APP_ADDR")
            .unwrap_or_else(|| "0.0.0.0:4000".into())
            .parse::<SocketAddr>()
            .context("APP_ADDR must be a socket address")?;
        let static_dir = PathBuf::from(var("STATIC_DIR").unwrap_or_else(|| "./ui/static".into()));
        let database_url = var("DATABASE_URL").context("DATABASE_URL is not set")?;

        let session_secret = var("SESSION_SECRET").context("SESSION_SECRET is not set")?;
        anyhow::ensure!(
            session_secret.len() >= MIN_SESSION_SECRET_LEN,
            "SESSION_SECRET must be at least {} bytes",
            MIN_SESSION_SECRET_LEN
        );

        let secs = |key: &str, default: u64| -> anyhow::Result<Duration> {
            match var(key) {
                Some(v) => v
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("{} must be a number of seconds", key)),
                None => Ok(Duration::from_secs(default)),
            }
        };
        let timeouts = TimeoutConfig {
            read: secs("READ_TIMEOUT_SECS", 5)?,
            write: secs("WRITE_TIMEOUT_SECS", 10)?,
            idle: secs("IDLE_TIMEOUT_SECS", 60)?,
        };

        Ok(Self {
            addr,
            static_dir,
            database_url,
            session_secret,
            timeouts,
        })
    }
}
