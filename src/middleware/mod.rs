//! Cross-cutting request handling shared by every route.

pub mod csrf;
pub mod recover;
pub mod security_headers;
