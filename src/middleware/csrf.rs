//! CSRF guard for form posts.
//!
//! The token is bound to the session (see `session::csrf_token`), so re-rendering
//! a form after a validation failure keeps the same token valid.

use axum::{
    body::Body,
    extract::Request,
    http::Method,
    middleware::Next,
    response::Response,
};
use bytes::Bytes;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::warn;

use crate::{
    error::{bad_request, AppError},
    session::CSRF_TOKEN,
};

const MAX_FORM_BYTES: usize = 1024 * 1024;

#[derive(Debug, Default, Deserialize)]
struct CsrfField {
    #[serde(default)]
    csrf_token: String,
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Constant-time comparison for equal-length tokens.
fn tokens_match(submitted: &str, expected: &str) -> bool {
    submitted.len() == expected.len()
        && submitted
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn submitted_token(body: &Bytes) -> String {
    serde_urlencoded::from_bytes::<CsrfField>(body)
        .map(|f| f.csrf_token)
        .unwrap_or_default()
}

/// Rejects unsafe requests whose `csrf_token` form field does not match the
/// session's token. The buffered body is handed on to the handler untouched.
pub async fn verify_csrf(session: Session, req: Request, next: Next) -> Result<Response, AppError> {
    if is_safe(req.method()) {
        return Ok(next.run(req).await);
    }

    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_FORM_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, uri = %parts.uri, "unreadable form body");
            return Ok(bad_request());
        }
    };

    let expected = session.get::<String>(CSRF_TOKEN).await?;
    let ok = expected
        .as_deref()
        .is_some_and(|expected| tokens_match(&submitted_token(&bytes), expected));
    if !ok {
        warn!(method = %parts.method, uri = %parts.uri, "csrf token missing or invalid");
        return Ok(bad_request());
    }

    let req = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(req).await)
}
