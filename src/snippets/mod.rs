use axum::{routing::get, Router};

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod repo;

/// Home page and snippet viewing.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::home))
        .route("/snippet/view/:id", get(handlers::snippet_view))
}

/// Snippet creation; needs a signed-in user.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route(
        "/snippet/create",
        get(handlers::snippet_create_form).post(handlers::snippet_create),
    )
}
