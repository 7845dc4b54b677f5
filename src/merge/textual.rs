//! In-place patching of documents that carry comments or trailing commas.
//!
//! All edits are computed against the original text in one scan and applied
//! together, so offsets found by the scan stay valid.

use tracing::debug;

use super::{Applied, MergeConfig, MergeStrategy};
use crate::entry::{generate_server_json, generate_server_value, quote, PendingEntries, ServerEntry};
use crate::indent::{prefix_in, reindent_with};
use crate::lexer::{Lexed, Member};
use crate::MergeError;

#[derive(Debug)]
struct Splice {
    offset: usize,
    remove: usize,
    insert: String,
}

/// Pending edits, written with the line ending of the document they target.
#[derive(Debug)]
struct Splices {
    edits: Vec<Splice>,
    crlf: bool,
}

impl Splices {
    fn for_text(text: &str) -> Self {
        Self { edits: Vec::new(), crlf: text.contains("\r\n") }
    }

    /// Convert `\n` line breaks in generated text to the document's style.
    fn line_endings(&self, text: impl Into<String>) -> String {
        let text = text.into();
        if self.crlf {
            text.replace('\n', "\r\n")
        } else {
            text
        }
    }

    fn insert(&mut self, offset: usize, text: impl Into<String>) {
        let insert = self.line_endings(text);
        self.edits.push(Splice { offset, remove: 0, insert });
    }

    /// Replace `start..end` with `text`, which must already carry the
    /// document's line endings.
    fn replace(&mut self, start: usize, end: usize, text: impl Into<String>) {
        self.edits.push(Splice { offset: start, remove: end.saturating_sub(start), insert: text.into() });
    }

    /// Rebuild `text` with every splice applied. Splices sharing an offset
    /// keep the order they were recorded in.
    fn apply(mut self, text: &str) -> String {
        self.edits.sort_by_key(|splice| splice.offset);
        let mut out = String::with_capacity(
            text.len().saturating_add(self.edits.iter().map(|s| s.insert.len()).sum()),
        );
        let mut cursor = 0;
        for splice in self.edits {
            out.push_str(text.get(cursor..splice.offset).unwrap_or_default());
            out.push_str(&splice.insert);
            cursor = splice.offset.saturating_add(splice.remove);
        }
        out.push_str(text.get(cursor..).unwrap_or_default());
        out
    }
}

pub(super) fn merge(
    config: &MergeConfig,
    text: &str,
    entries: &PendingEntries,
) -> Result<Applied, MergeError> {
    let lexed = Lexed::new(text)?;
    let (root_open, _) = lexed.root_object()?;
    let root_members = lexed.members(root_open)?;
    let mut splices = Splices::for_text(text);
    let mut applied = Applied::default();

    match root_members.iter().rev().find(|member| member.key == config.config_key) {
        None => {
            debug!("'{}' not found, injecting it at the top of the document", config.config_key);
            inject_config_key(&lexed, root_open, &root_members, config, entries, &mut splices);
            applied.added.extend(entries.iter().map(|entry| entry.key.clone()));
        },
        Some(member) => {
            if lexed.text().as_bytes().get(member.value_start) != Some(&b'{') {
                return Err(MergeError::InvalidConfigKey {
                    key: config.config_key.clone(),
                    found: describe_raw(&lexed, member),
                });
            }
            patch_block(&lexed, member, config, entries, &mut splices, &mut applied)?;
        },
    }

    let document = splices.apply(text);
    if document != text {
        Lexed::new(&document)?;
    }
    applied.document = document;
    Ok(applied)
}

/// Render entries behind `prefix`, separated by commas.
fn render_entries<'a>(entries: impl IntoIterator<Item = &'a ServerEntry>, prefix: &str) -> String {
    entries
        .into_iter()
        .map(|entry| reindent_with(&generate_server_json(&entry.key, entry), prefix))
        .collect::<Vec<_>>()
        .join(",\n")
}

/// Add a brand-new `"<key>": { ... }` member right after the root `{`.
fn inject_config_key(
    lexed: &Lexed<'_>,
    root_open: usize,
    root_members: &[Member],
    config: &MergeConfig,
    entries: &PendingEntries,
    splices: &mut Splices,
) {
    let text = lexed.text();
    let first = root_members.first();
    let sibling_indent = first
        .filter(|member| lexed.starts_line(member.key_start))
        .map(|member| lexed.line_indent(member.key_start));

    // Top-level members sit one level deep, so their indentation is the unit.
    let (pad, entry_prefix) = sibling_indent.map_or_else(
        || {
            let entry_prefix = prefix_in(lexed, root_open.saturating_add(1));
            let half = entry_prefix.get(..entry_prefix.len() / 2).unwrap_or_default().to_string();
            (half, entry_prefix)
        },
        |indent| (indent.to_string(), indent.repeat(2)),
    );

    let body = render_entries(entries, &entry_prefix);
    let section = if body.is_empty() {
        format!("{pad}{}: {{}}", quote(&config.config_key))
    } else {
        format!("{pad}{}: {{\n{body}\n{pad}}}", quote(&config.config_key))
    };

    let mut insert = format!("\n{section}");
    match first {
        Some(member) => {
            insert.push(',');
            if !lexed.starts_line(member.key_start) {
                insert.push('\n');
                insert.push_str(&pad);
            }
        },
        None => {
            let root_close = lexed.partner(root_open).unwrap_or(root_open);
            let inner = text.get(root_open..root_close).unwrap_or_default();
            if !inner.contains('\n') {
                insert.push('\n');
            }
        },
    }

    splices.insert(root_open.saturating_add(1), insert);
}

/// Add pending entries to the existing object under the configured key.
fn patch_block(
    lexed: &Lexed<'_>,
    block: &Member,
    config: &MergeConfig,
    entries: &PendingEntries,
    splices: &mut Splices,
    applied: &mut Applied,
) -> Result<(), MergeError> {
    let text = lexed.text();
    let open = block.value_start;
    let close = lexed.partner(open).ok_or(MergeError::Unbalanced { offset: open })?;
    let existing = lexed.members(open)?;
    let mut pending = Vec::new();

    for entry in entries {
        let Some(found) = existing.iter().rev().find(|member| member.key == entry.key) else {
            pending.push(entry);
            continue;
        };

        if config.strategy == MergeStrategy::PreserveExisting {
            applied.skipped.push(entry.key.clone());
            continue;
        }

        let prefix = lexed.line_indent(found.key_start);
        let indented = splices.line_endings(reindent_with(&generate_server_value(entry), prefix));
        let rendered = indented.get(prefix.len()..).unwrap_or(&indented);
        if text.get(found.value_start..found.value_end) == Some(rendered) {
            applied.skipped.push(entry.key.clone());
        } else {
            splices.replace(found.value_start, found.value_end, rendered);
            applied.updated.push(entry.key.clone());
        }
    }

    if pending.is_empty() {
        return Ok(());
    }
    applied.added.extend(pending.iter().map(|entry| entry.key.clone()));
    let block_indent = lexed.line_indent(block.key_start);

    let Some(last) = existing.last() else {
        let position = open.saturating_add(1);
        let snippet = render_entries(pending, &prefix_in(lexed, position));
        let mut insert = format!("\n{snippet}");
        if !text.get(open..close).unwrap_or_default().contains('\n') {
            insert.push('\n');
            insert.push_str(block_indent);
        }
        splices.insert(position, insert);
        return Ok(());
    };

    let closer_on_own_line = lexed.starts_line(close);
    let position = if closer_on_own_line { lexed.line_start(close) } else { close };
    let snippet = render_entries(pending, &prefix_in(lexed, position));
    let trailing_comma = last.comma.is_some();

    if !trailing_comma {
        splices.insert(last.value_end, ",");
    }

    let mut insert = String::new();
    if !closer_on_own_line {
        insert.push('\n');
    }
    insert.push_str(&snippet);
    if trailing_comma {
        insert.push(',');
    }
    insert.push('\n');
    if !closer_on_own_line {
        insert.push_str(block_indent);
    }
    splices.insert(position, insert);

    Ok(())
}

/// JSON type of a raw value, judged by its first byte.
fn describe_raw(lexed: &Lexed<'_>, member: &Member) -> &'static str {
    match lexed.text().as_bytes().get(member.value_start) {
        Some(b'[') => "an array",
        Some(b'"') => "a string",
        Some(b'n') => "null",
        Some(b't' | b'f') => "a boolean",
        _ => "a number",
    }
}
