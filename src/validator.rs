//! Form validation.
//!
//! A [`Validator`] collects the outcome of every check run against one
//! submission. Handlers run all checks first and only then branch on
//! [`Validator::valid`], so a single response reports every problem.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    /// The HTML5 `type=email` pattern.
    pub static ref EMAIL_RX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    )
    .unwrap();
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct Validator {
    pub field_errors: HashMap<String, String>,
    pub non_field_errors: Vec<String>,
}

impl Validator {
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Record `message` for `field` unless the field already has one.
    pub fn add_field_error(&mut self, field: &str, message: &str) {
        self.field_errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_string());
    }

    pub fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_field_error(field, message);
        }
    }
}

pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_wins_per_field() {
        let mut v = Validator::default();
        v.check_field(false, "title", "This field cannot be blank");
        v.check_field(false, "title", "This field cannot be more than 100 characters long");
        v.check_field(true, "content", "unused");

        assert!(!v.valid());
        assert_eq!(v.field_errors.len(), 1);
        assert_eq!(v.field_errors["title"], "This field cannot be blank");
    }

    #[test]
    fn non_field_errors_make_it_invalid() {
        let mut v = Validator::default();
        assert!(v.valid());
        v.add_non_field_error("Email or password is incorrect");
        assert!(!v.valid());
        assert!(v.field_errors.is_empty());
    }

    #[test]
    fn blank_means_whitespace_only() {
        assert!(!not_blank(""));
        assert!(!not_blank(" \t\n"));
        assert!(not_blank(" x "));
    }

    #[test]
    fn lengths_count_chars_not_bytes() {
        let title = "é".repeat(100);
        assert!(title.len() > 100);
        assert!(max_chars(&title, 100));
        assert!(!max_chars(&format!("{title}a"), 100));
        assert!(min_chars("pa55word", 8));
        assert!(!min_chars("pa$$", 8));
    }

    #[test]
    fn permitted_values() {
        assert!(permitted_value(&7, &[1, 7, 365]));
        assert!(!permitted_value(&4, &[1, 7, 365]));
    }

    #[test]
    fn email_pattern() {
        for ok in ["bob@example.com", "alice.smith+tag@mail.example.co.uk", "x@localhost"] {
            assert!(matches(ok, &EMAIL_RX), "{ok} should match");
        }
        for bad in ["bob@example.", "bob", "@example.com", "bob@-example.com", "bob @example.com"] {
            assert!(!matches(bad, &EMAIL_RX), "{bad} should not match");
        }
    }
}
