#![allow(missing_docs)]

pub mod app_config;
pub mod cli;
pub mod detect;
pub mod document;
pub mod entry;
pub mod indent;
pub(crate) mod lexer;
pub mod merge;
pub mod writer;

pub use document::{classify, DocumentKind};
pub use entry::{PendingEntries, ServerEntry};
pub use merge::{merge, MergeConfig, MergeOutcome, MergeStrategy};
pub use writer::ConfigWriter;

/// Default top-level key under which server entries live.
pub const DEFAULT_CONFIG_KEY: &str = "mcpServers";

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document root is not a JSON object")]
    NotAnObject,

    #[error("Key '{key}' holds {found}, expected an object")]
    InvalidConfigKey { key: String, found: &'static str },

    #[error("Unbalanced brackets or unterminated string near byte {offset}")]
    Unbalanced { offset: usize },

    #[error("Malformed document near byte {offset}: {reason}")]
    Malformed { offset: usize, reason: &'static str },
}
