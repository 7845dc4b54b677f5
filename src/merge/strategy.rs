#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Leave entries that already exist under the configured key untouched
    #[default]
    PreserveExisting,
    /// Replace existing entries that share a key with a pending entry
    Overwrite,
}
