use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Request extension set by `authenticate` once the session's user id has been
/// confirmed to reference an existing user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authenticated(pub i64);

/// Whether the current request carries a confirmed user.
pub struct IsAuthenticated(pub bool);

#[async_trait]
impl<S> FromRequestParts<S> for IsAuthenticated
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(IsAuthenticated(parts.extensions.get::<Authenticated>().is_some()))
    }
}
