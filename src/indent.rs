//! Indentation inference for entries spliced into hand-formatted documents.

use regex::Regex;
use std::sync::OnceLock;

use crate::lexer::{Lexed, Region};

/// Column width used when the document offers no object-opening key line.
pub const FALLBACK_INDENT: usize = 8;

/// Indentation step used by rendered entry snippets.
const SNIPPET_STEP: usize = 4;

/// A key (quoted or JSON5 identifier) immediately opening an object.
const KEY_OPENS_OBJECT: &str =
    r#"^([ \t]*)(?:"(?:[^"\\]|\\.)*"|[A-Za-z_$][A-Za-z0-9_$]*)[ \t]*:[ \t]*\{"#;

fn key_opens_object() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(KEY_OPENS_OBJECT).ok()).as_ref()
}

/// Infer the column at which a member inserted at `position` should start.
///
/// Walks backward line by line looking for a key that opens an object. A key
/// at the same nesting depth as `position` is a sibling and its indentation
/// is reused; the key line of the enclosing object contributes its own
/// indentation plus one level. Returns [`FALLBACK_INDENT`] when neither exists
/// or the document cannot be lexed.
#[must_use]
pub fn detect_indentation(text: &str, position: usize) -> usize {
    Lexed::new(text).map_or(FALLBACK_INDENT, |lexed| prefix_in(&lexed, position).chars().count())
}

/// Leading whitespace, tabs included, for a member inserted at `position`.
pub(crate) fn prefix_in(lexed: &Lexed<'_>, position: usize) -> String {
    let fallback = || " ".repeat(FALLBACK_INDENT);
    let Some(pattern) = key_opens_object() else {
        return fallback();
    };
    let text = lexed.text();
    let position = position.min(text.len());
    let target = lexed.depth_at(position);
    let mut end = position;

    loop {
        let start = lexed.line_start(end);
        let line = text.get(start..end).unwrap_or_default();

        if let Some(indent) = pattern.captures(line).and_then(|caps| caps.get(1)) {
            let key_offset = start.saturating_add(indent.end());
            let in_comment = matches!(
                lexed.region(key_offset),
                Some(Region::LineComment | Region::BlockComment)
            );
            let depth = lexed.depth_at(key_offset);

            if !in_comment && depth == target {
                return indent.as_str().to_string();
            }
            if !in_comment && depth > 0 && depth.saturating_add(1) == target {
                return format!("{}{}", indent.as_str(), level_unit(indent.as_str(), depth));
            }
        }

        if start == 0 {
            return fallback();
        }
        end = start.saturating_sub(1);
    }
}

/// One nesting level of `indent`, which sits `depth` levels deep.
fn level_unit(indent: &str, depth: u32) -> String {
    if indent.contains('\t') {
        return "\t".to_string();
    }
    let levels = usize::try_from(depth).unwrap_or(1).max(1);
    " ".repeat(indent.len() / levels)
}

/// Prefix every non-empty line of `snippet` with `width` spaces.
#[must_use]
pub fn reindent(snippet: &str, width: usize) -> String {
    reindent_with(snippet, &" ".repeat(width))
}

/// Prefix every non-empty line of `snippet` with `prefix`.
///
/// `snippet` is indented in steps of four spaces. When `prefix` uses tabs,
/// each step becomes a tab.
pub(crate) fn reindent_with(snippet: &str, prefix: &str) -> String {
    let tabs = prefix.contains('\t');
    snippet
        .lines()
        .map(|line| {
            if line.is_empty() {
                return String::new();
            }
            let body = line.trim_start_matches(' ');
            let spaces = line.len().saturating_sub(body.len());
            if tabs {
                let steps = spaces / SNIPPET_STEP;
                format!("{prefix}{}{}{body}", "\t".repeat(steps), " ".repeat(spaces % SNIPPET_STEP))
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
