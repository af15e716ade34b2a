use serde::{Deserialize, Serialize};

use crate::validator::{permitted_value, Validator};

/// Lifetimes, in days, a new snippet may be given.
pub const PERMITTED_EXPIRES: [i32; 3] = [1, 7, 365];

/// Create-snippet submission. Every field arrives as text so that a missing or
/// malformed value becomes a field error instead of an extractor rejection.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SnippetCreateForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub expires: String,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

impl SnippetCreateForm {
    /// The blank form, one year preselected.
    pub fn blank() -> Self {
        Self {
            expires: "365".into(),
            ..Default::default()
        }
    }

    /// Parsed lifetime, if it is one of [`PERMITTED_EXPIRES`].
    pub fn expires_days(&self) -> Option<i32> {
        self.expires
            .parse::<i32>()
            .ok()
            .filter(|days| permitted_value(days, &PERMITTED_EXPIRES))
    }
}
