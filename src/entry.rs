use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One named command-line integration written under the configured key.
///
/// Serialized field order is fixed: `command`, then `args`, then `env`; empty
/// `args`/`env` are omitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerEntry {
    #[serde(skip)]
    pub key: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl ServerEntry {
    pub fn new(key: impl Into<String>, command: impl Into<String>) -> Self {
        Self { key: key.into(), command: command.into(), args: Vec::new(), env: BTreeMap::new() }
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env.extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// The entry as a JSON value, without its key.
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("command".to_string(), Value::String(self.command.clone()));
        if !self.args.is_empty() {
            map.insert(
                "args".to_string(),
                Value::Array(self.args.iter().cloned().map(Value::String).collect()),
            );
        }
        if !self.env.is_empty() {
            map.insert(
                "env".to_string(),
                Value::Object(
                    self.env.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect(),
                ),
            );
        }
        Value::Object(map)
    }
}

/// Entries queued for one merge, in insertion order. Adding a key that is
/// already queued replaces the queued entry in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingEntries {
    entries: Vec<ServerEntry>,
}

impl PendingEntries {
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn insert(&mut self, entry: ServerEntry) {
        match self.entries.iter_mut().find(|queued| queued.key == entry.key) {
            Some(queued) => *queued = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServerEntry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[ServerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ServerEntry> for PendingEntries {
    fn from_iter<T: IntoIterator<Item = ServerEntry>>(iter: T) -> Self {
        let mut pending = Self::new();
        for entry in iter {
            pending.insert(entry);
        }
        pending
    }
}

impl<'a> IntoIterator for &'a PendingEntries {
    type Item = &'a ServerEntry;
    type IntoIter = std::slice::Iter<'a, ServerEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub(crate) fn quote(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

/// Render the object value of an entry with 4-space relative indentation.
pub fn generate_server_value(entry: &ServerEntry) -> String {
    let mut fields = vec![format!("    \"command\": {}", quote(&entry.command))];

    if !entry.args.is_empty() {
        let args: Vec<String> =
            entry.args.iter().map(|arg| format!("        {}", quote(arg))).collect();
        fields.push(format!("    \"args\": [\n{}\n    ]", args.join(",\n")));
    }

    if !entry.env.is_empty() {
        let vars: Vec<String> = entry
            .env
            .iter()
            .map(|(name, value)| format!("        {}: {}", quote(name), quote(value)))
            .collect();
        fields.push(format!("    \"env\": {{\n{}\n    }}", vars.join(",\n")));
    }

    format!("{{\n{}\n}}", fields.join(",\n"))
}

/// Render `"<key>": { ... }` for one entry, unindented at the top level.
pub fn generate_server_json(key: &str, entry: &ServerEntry) -> String {
    format!("{}: {}", quote(key), generate_server_value(entry))
}
