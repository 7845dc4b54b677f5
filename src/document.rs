use serde::Serialize;
use std::fmt;

use crate::detect::is_plain_json;

/// How a target document may be edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    /// No comments, no trailing commas: safe to decode and re-encode.
    StrictJson,
    /// JSON5-style content that has to be patched in place.
    ExtendedJson,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrictJson => f.write_str("strict-json"),
            Self::ExtendedJson => f.write_str("extended-json"),
        }
    }
}

/// Classify a document. Empty content is a fresh strict document.
#[must_use]
pub fn classify(text: &str) -> DocumentKind {
    if text.trim().is_empty() || is_plain_json(text) {
        DocumentKind::StrictJson
    } else {
        DocumentKind::ExtendedJson
    }
}
