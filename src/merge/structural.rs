use serde::Serialize;
use serde_json::{Map, Value};

use super::{describe, Applied, MergeConfig, MergeStrategy};
use crate::entry::PendingEntries;
use crate::MergeError;

/// Decode, update and re-encode a strict JSON document.
///
/// Key order survives because `serde_json` is built with `preserve_order`.
/// When nothing changes the original text is returned untouched so an
/// already-merged file is never reformatted.
pub(super) fn merge(
    config: &MergeConfig,
    text: &str,
    entries: &PendingEntries,
) -> Result<Applied, MergeError> {
    let mut root: Value = if text.trim().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str(text)?
    };

    let Value::Object(root_map) = &mut root else {
        return Err(MergeError::NotAnObject);
    };

    let created_key = !root_map.contains_key(&config.config_key);
    let servers =
        root_map.entry(config.config_key.clone()).or_insert_with(|| Value::Object(Map::new()));
    let found = describe(servers);
    let Value::Object(servers) = servers else {
        return Err(MergeError::InvalidConfigKey { key: config.config_key.clone(), found });
    };

    let mut applied = Applied::default();
    for entry in entries {
        let value = entry.to_value();
        let identical = servers.get(&entry.key).map(|existing| *existing == value);
        match identical {
            None => {
                servers.insert(entry.key.clone(), value);
                applied.added.push(entry.key.clone());
            },
            Some(same) if same || config.strategy == MergeStrategy::PreserveExisting => {
                applied.skipped.push(entry.key.clone());
            },
            Some(_) => {
                servers.insert(entry.key.clone(), value);
                applied.updated.push(entry.key.clone());
            },
        }
    }

    applied.document = if created_key || !applied.added.is_empty() || !applied.updated.is_empty()
    {
        let encoded = encode(&root)?;
        if text.contains("\r\n") {
            encoded.replace('\n', "\r\n")
        } else {
            encoded
        }
    } else {
        text.to_string()
    };

    Ok(applied)
}

/// Pretty-print with 4-space indentation and a trailing newline.
fn encode(root: &Value) -> Result<String, MergeError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    root.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
