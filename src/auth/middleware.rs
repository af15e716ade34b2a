use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::debug;

use crate::{
    auth::extractors::Authenticated,
    error::AppError,
    session::{self, AUTHENTICATED_USER_ID},
    state::AppState,
};

/// Resolves the session's user id. A confirmed id becomes an [`Authenticated`]
/// extension; an id whose user is gone is dropped from the session.
pub async fn authenticate(
    State(state): State<AppState>,
    session: Session,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(user_id) = session::authenticated_user_id(&session).await? {
        if state.users.exists(user_id).await? {
            req.extensions_mut().insert(Authenticated(user_id));
        } else {
            debug!(user_id, "session references a missing user");
            session.remove::<i64>(AUTHENTICATED_USER_ID).await?;
        }
    }
    Ok(next.run(req).await)
}

/// Sends anonymous visitors to the login page. Pages behind this guard are
/// never cached.
pub async fn require_authentication(req: Request, next: Next) -> Response {
    if req.extensions().get::<Authenticated>().is_none() {
        return (
            StatusCode::SEE_OTHER,
            [
                (header::LOCATION, "/user/login"),
                (header::CACHE_CONTROL, "no-store"),
            ],
        )
            .into_response();
    }

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
