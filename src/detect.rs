//! Classification helpers that decide whether a document is strict JSON.

use crate::lexer::{regions, Region};

/// Whether `text` contains a `//` or `/* */` comment outside string literals.
#[must_use]
pub fn has_unquoted_comments(text: &str) -> bool {
    regions(text).iter().any(|r| matches!(r, Region::LineComment | Region::BlockComment))
}

/// Whether a comma is followed, across whitespace and comments only, by a
/// closing `}` or `]`. Commas inside strings are ignored.
#[must_use]
pub fn has_trailing_comma(text: &str) -> bool {
    let mut pending_comma = false;

    for (&byte, region) in text.as_bytes().iter().zip(regions(text)) {
        if region != Region::Code {
            if region == Region::String {
                pending_comma = false;
            }
            continue;
        }
        match byte {
            b',' => pending_comma = true,
            b'}' | b']' if pending_comma => return true,
            b if b.is_ascii_whitespace() => {},
            _ => pending_comma = false,
        }
    }

    false
}

/// True when the document has neither unquoted comments nor trailing commas.
#[must_use]
pub fn is_plain_json(text: &str) -> bool {
    !has_unquoted_comments(text) && !has_trailing_comma(text)
}
