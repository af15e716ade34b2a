use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod repo;

/// Signup and login; reachable without a session user.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/user/signup", get(handlers::signup_form).post(handlers::signup))
        .route("/user/login", get(handlers::login_form).post(handlers::login))
}

/// Routes that need a signed-in user.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/user/logout", post(handlers::logout))
}
