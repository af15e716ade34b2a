use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, SignupForm},
        extractors::IsAuthenticated,
        password::hash_off_thread,
    },
    db::DbError,
    error::AppError,
    form::HtmlForm,
    session::{self, AUTHENTICATED_USER_ID},
    state::AppState,
    templates::TemplateData,
    validator::{matches, min_chars, not_blank, EMAIL_RX},
};

const BLANK: &str = "This field cannot be blank";
const BAD_EMAIL: &str = "This field must be a valid email address";

#[instrument(skip_all)]
pub async fn signup_form(
    State(state): State<AppState>,
    IsAuthenticated(is_authenticated): IsAuthenticated,
    session: Session,
) -> Result<Response, AppError> {
    let data = TemplateData::new(&session, is_authenticated)
        .await?
        .with_form(&SignupForm::default());
    state.templates.page(StatusCode::OK, "signup.html", &data)
}

#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    IsAuthenticated(is_authenticated): IsAuthenticated,
    session: Session,
    HtmlForm(mut form): HtmlForm<SignupForm>,
) -> Result<Response, AppError> {
    form.email = form.email.trim().to_lowercase();

    let v = &mut form.validator;
    v.check_field(not_blank(&form.name), "name", BLANK);
    v.check_field(not_blank(&form.email), "email", BLANK);
    v.check_field(matches(&form.email, &EMAIL_RX), "email", BAD_EMAIL);
    v.check_field(not_blank(&form.password), "password", BLANK);
    v.check_field(
        min_chars(&form.password, 8),
        "password",
        "This field must be at least 8 characters long",
    );

    if !form.validator.valid() {
        warn!(errors = ?form.validator.field_errors, "signup rejected");
        let data = TemplateData::new(&session, is_authenticated).await?.with_form(&form);
        return state.templates.page(StatusCode::UNPROCESSABLE_ENTITY, "signup.html", &data);
    }

    let hash = hash_off_thread(form.password.clone()).await?;

    match state.users.insert(&form.name, &form.email, &hash).await {
        Ok(()) => {}
        Err(DbError::DuplicateEmail) => {
            form.validator
                .add_field_error("email", "Email address is already in use");
            let data = TemplateData::new(&session, is_authenticated).await?.with_form(&form);
            return state.templates.page(StatusCode::UNPROCESSABLE_ENTITY, "signup.html", &data);
        }
        Err(e) => return Err(e.into()),
    }

    session::put_flash(&session, "Your signup was successful. Please log in.").await?;
    info!("user signed up");
    Ok(Redirect::to("/user/login").into_response())
}

#[instrument(skip_all)]
pub async fn login_form(
    State(state): State<AppState>,
    IsAuthenticated(is_authenticated): IsAuthenticated,
    session: Session,
) -> Result<Response, AppError> {
    let data = TemplateData::new(&session, is_authenticated)
        .await?
        .with_form(&LoginForm::default());
    state.templates.page(StatusCode::OK, "login.html", &data)
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    IsAuthenticated(is_authenticated): IsAuthenticated,
    session: Session,
    HtmlForm(mut form): HtmlForm<LoginForm>,
) -> Result<Response, AppError> {
    form.email = form.email.trim().to_lowercase();

    let v = &mut form.validator;
    v.check_field(not_blank(&form.email), "email", BLANK);
    v.check_field(matches(&form.email, &EMAIL_RX), "email", BAD_EMAIL);
    v.check_field(not_blank(&form.password), "password", BLANK);

    if !form.validator.valid() {
        let data = TemplateData::new(&session, is_authenticated).await?.with_form(&form);
        return state.templates.page(StatusCode::UNPROCESSABLE_ENTITY, "login.html", &data);
    }

    let user_id = match state.users.authenticate(&form.email, &form.password).await {
        Ok(id) => id,
        Err(DbError::InvalidCredentials) => {
            warn!("login invalid credentials");
            form.validator
                .add_non_field_error("Email or password is incorrect");
            let data = TemplateData::new(&session, is_authenticated).await?.with_form(&form);
            return state.templates.page(StatusCode::UNPROCESSABLE_ENTITY, "login.html", &data);
        }
        Err(e) => return Err(e.into()),
    };

    session.cycle_id().await?;
    session.insert(AUTHENTICATED_USER_ID, user_id).await?;

    info!(user_id, "user logged in");
    Ok(Redirect::to("/snippet/create").into_response())
}

#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Response, AppError> {
    session.cycle_id().await?;
    session.remove::<i64>(AUTHENTICATED_USER_ID).await?;
    session::put_flash(&session, "You've been logged out successfully!").await?;
    Ok(Redirect::to("/").into_response())
}
