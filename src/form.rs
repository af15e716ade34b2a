use axum::{
    async_trait,
    extract::{FromRequest, Request},
    response::Response,
    Form,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::bad_request;

/// `Form` whose rejection is the generic 400 page. Decoder messages stay in
/// the log.
pub struct HtmlForm<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for HtmlForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Form::<T>::from_request(req, state).await {
            Ok(Form(value)) => Ok(Self(value)),
            Err(rejection) => {
                warn!(error = %rejection, "malformed form body");
                Err(bad_request())
            }
        }
    }
}
