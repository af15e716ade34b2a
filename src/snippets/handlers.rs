use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{debug, info, instrument};

use crate::{
    auth::extractors::IsAuthenticated,
    error::AppError,
    form::HtmlForm,
    session,
    snippets::{
        dto::SnippetCreateForm,
        repo::LATEST_LIMIT,
    },
    state::AppState,
    templates::{SnippetView, TemplateData},
    validator::{max_chars, not_blank},
};

/// Accepts only canonical positive decimal ids: no sign, no leading zero,
/// nothing but ASCII digits.
pub fn parse_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || raw.starts_with('0') || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<i64>().ok()
}

#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    IsAuthenticated(is_authenticated): IsAuthenticated,
    session: Session,
) -> Result<Response, AppError> {
    let snippets = state.snippets.latest(LATEST_LIMIT).await?;

    let mut data = TemplateData::new(&session, is_authenticated).await?;
    data.snippets = snippets.into_iter().map(SnippetView::from).collect();
    state.templates.page(StatusCode::OK, "home.html", &data)
}

#[instrument(skip_all)]
pub async fn snippet_view(
    State(state): State<AppState>,
    IsAuthenticated(is_authenticated): IsAuthenticated,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(id) = parse_id(&id) else {
        debug!("malformed snippet id");
        return Err(AppError::NotFound);
    };
    let snippet = state.snippets.get(id).await?;

    let mut data = TemplateData::new(&session, is_authenticated).await?;
    data.snippet = Some(snippet.into());
    state.templates.page(StatusCode::OK, "view.html", &data)
}

#[instrument(skip_all)]
pub async fn snippet_create_form(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let data = TemplateData::new(&session, true)
        .await?
        .with_form(&SnippetCreateForm::blank());
    state.templates.page(StatusCode::OK, "create.html", &data)
}

#[instrument(skip_all)]
pub async fn snippet_create(
    State(state): State<AppState>,
    session: Session,
    HtmlForm(mut form): HtmlForm<SnippetCreateForm>,
) -> Result<Response, AppError> {
    let expires = form.expires_days();

    let v = &mut form.validator;
    v.check_field(not_blank(&form.title), "title", "This field cannot be blank");
    v.check_field(
        max_chars(&form.title, 100),
        "title",
        "This field cannot be more than 100 characters long",
    );
    v.check_field(not_blank(&form.content), "content", "This field cannot be blank");
    v.check_field(expires.is_some(), "expires", "This field must equal 1, 7 or 365");

    let Some(expires) = expires.filter(|_| form.validator.valid()) else {
        debug!(errors = ?form.validator.field_errors, "snippet rejected");
        let data = TemplateData::new(&session, true).await?.with_form(&form);
        return state.templates.page(StatusCode::UNPROCESSABLE_ENTITY, "create.html", &data);
    };

    let id = state.snippets.insert(&form.title, &form.content, expires).await?;
    session::put_flash(&session, "Snippet successfully created!").await?;

    info!(snippet_id = id, "snippet created");
    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_ids_parse() {
        assert_eq!(parse_id("1"), Some(1));
        assert_eq!(parse_id("42"), Some(42));
    }

    #[test]
    fn non_canonical_ids_are_rejected() {
        for raw in ["", "0", "-1", "+1", "01", "1.23", "foo", "1 ", "99999999999999999999"] {
            assert_eq!(parse_id(raw), None, "{raw:?} should be rejected");
        }
    }
}
