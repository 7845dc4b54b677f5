//! Merging pending server entries into a target document.
//!
//! Strict JSON documents are decoded, updated and re-encoded. Anything else
//! (comments, trailing commas) is patched in place so every byte outside the
//! inserted entries survives.

use tracing::{debug, info, warn};

use crate::document::{classify, DocumentKind};
use crate::entry::PendingEntries;
use crate::{MergeError, DEFAULT_CONFIG_KEY};

pub mod strategy;
mod structural;
mod textual;

pub use strategy::MergeStrategy;

/// Immutable settings for one merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConfig {
    pub config_key: String,
    pub strategy: MergeStrategy,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self { config_key: DEFAULT_CONFIG_KEY.to_string(), strategy: MergeStrategy::default() }
    }
}

impl MergeConfig {
    pub fn new(config_key: impl Into<String>) -> Self {
        Self { config_key: config_key.into(), ..Self::default() }
    }

    #[must_use]
    pub const fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The complete new document.
    pub document: String,
    /// The mode the document was edited in.
    pub mode: DocumentKind,
    pub added: Vec<String>,
    pub updated: Vec<String>,
    /// Entries left as they were because the key already existed.
    pub skipped: Vec<String>,
    /// Whether `document` differs from the input.
    pub changed: bool,
}

/// Per-mode merge result, before it is tagged with the mode used.
#[derive(Debug, Default)]
struct Applied {
    document: String,
    added: Vec<String>,
    updated: Vec<String>,
    skipped: Vec<String>,
}

/// Merge `entries` into `existing` (absent means a new file).
///
/// # Errors
///
/// Returns an error when the document root is not an object, the configured
/// key holds something other than an object, or an extended document cannot
/// be bracket-matched. Nothing is partially applied on error.
pub fn merge(
    config: &MergeConfig,
    existing: Option<&str>,
    entries: &PendingEntries,
) -> Result<MergeOutcome, MergeError> {
    let original = existing.unwrap_or_default();
    let kind = classify(original);
    debug!("Document classified as {kind}");

    let (mode, applied) = match kind {
        DocumentKind::StrictJson => match structural::merge(config, original, entries) {
            Ok(applied) => (DocumentKind::StrictJson, applied),
            Err(MergeError::Json(e)) => {
                warn!("Strict JSON decode failed ({e}), patching the document in place instead");
                (DocumentKind::ExtendedJson, textual::merge(config, original, entries)?)
            },
            Err(e) => return Err(e),
        },
        DocumentKind::ExtendedJson => {
            (DocumentKind::ExtendedJson, textual::merge(config, original, entries)?)
        },
    };

    for key in &applied.added {
        info!("Added '{key}' under '{}'", config.config_key);
    }
    for key in &applied.updated {
        info!("Replaced '{key}' under '{}'", config.config_key);
    }
    for key in &applied.skipped {
        debug!("'{key}' already present under '{}', left unchanged", config.config_key);
    }

    let changed = existing.map_or(true, |text| text != applied.document);

    Ok(MergeOutcome {
        document: applied.document,
        mode,
        added: applied.added,
        updated: applied.updated,
        skipped: applied.skipped,
        changed,
    })
}

/// Human-readable JSON type of a value, for error messages.
const fn describe(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
