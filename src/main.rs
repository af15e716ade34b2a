use std::time::Duration;

mod app;
mod auth;
mod config;
mod db;
mod error;
mod form;
mod middleware;
mod session;
mod snippets;
mod state;
mod templates;
mod validator;

use tower_sessions::session_store::ExpiredDeletion;

use crate::{config::AppConfig, session::PgSessionStore, state::AppState};

const SESSION_CLEANUP_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "snippetbox=debug,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let addr = config.addr;
    let idle = config.timeouts.idle;

    let db = db::connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let session_store = PgSessionStore::new(db.clone());
    let cleanup = session_store.clone();
    tokio::spawn(async move {
        if let Err(e) = cleanup
            .continuously_delete_expired(SESSION_CLEANUP_PERIOD)
            .await
        {
            tracing::error!(error = %e, "session cleanup stopped");
        }
    });

    let state = AppState::init(config, db)?;
    let app = app::build_app(state, session_store)?;

    app::serve(app, addr, idle).await
}
