//! HTML pages.
//!
//! The template set is embedded in the binary and parsed once at startup.

use anyhow::Context;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use minijinja::{Environment, Value};
use serde::Serialize;
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime, UtcOffset};
use tower_sessions::Session;

use crate::{
    error::AppError,
    session::{self, SessionResult},
    snippets::repo::Snippet,
};

const SOURCES: &[(&str, &str)] = &[
    ("base.html", include_str!("templates/base.html")),
    ("partials/nav.html", include_str!("templates/partials/nav.html")),
    ("home.html", include_str!("templates/home.html")),
    ("view.html", include_str!("templates/view.html")),
    ("create.html", include_str!("templates/create.html")),
    ("signup.html", include_str!("templates/signup.html")),
    ("login.html", include_str!("templates/login.html")),
];

const HUMAN_DATE: &[FormatItem<'static>] =
    format_description!("[day] [month repr:short] [year] at [hour]:[minute]");

pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> anyhow::Result<Self> {
        let mut env = Environment::new();
        for &(name, source) in SOURCES {
            env.add_template(name, source)
                .with_context(|| format!("parse template {}", name))?;
        }
        Ok(Self { env })
    }

    pub fn render(&self, page: &str, data: &TemplateData) -> Result<String, minijinja::Error> {
        self.env.get_template(page)?.render(data)
    }

    /// Render `page` into a full HTML response.
    pub fn page(&self, status: StatusCode, page: &str, data: &TemplateData) -> Result<Response, AppError> {
        let body = self.render(page, data)?;
        Ok((status, Html(body)).into_response())
    }
}

/// `02 Jan 2006 at 15:04`, always in UTC.
pub fn human_date(t: OffsetDateTime) -> String {
    t.to_offset(UtcOffset::UTC)
        .format(HUMAN_DATE)
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
pub struct SnippetView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: String,
    pub expires: String,
}

impl From<Snippet> for SnippetView {
    fn from(s: Snippet) -> Self {
        Self {
            id: s.id,
            title: s.title,
            content: s.content,
            created: human_date(s.created),
            expires: human_date(s.expires),
        }
    }
}

/// Everything a page template can see.
#[derive(Debug, Default, Serialize)]
pub struct TemplateData {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub csrf_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<SnippetView>,
    pub snippets: Vec<SnippetView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<Value>,
}

impl TemplateData {
    /// Per-request defaults. Consumes any pending flash.
    pub async fn new(session: &Session, is_authenticated: bool) -> SessionResult<Self> {
        Ok(Self {
            current_year: OffsetDateTime::now_utc().year(),
            flash: session::pop_flash(session).await?,
            is_authenticated,
            csrf_token: session::csrf_token(session).await?,
            ..Default::default()
        })
    }

    pub fn with_form(mut self, form: &impl Serialize) -> Self {
        self.form = Some(Value::from_serialize(form));
        self
    }
}
