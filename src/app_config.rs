use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::entry::{PendingEntries, ServerEntry};
use crate::merge::MergeStrategy;
use crate::writer::{ConfigWriter, SaveReport};

const CONFIG_PATH_ENV: &str = "MCP_INJECT_CONFIG";

/// Batch description of which servers go into which files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    #[serde(default)]
    pub default: DefaultConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<TargetConfig>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub servers: BTreeMap<String, ServerEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct DefaultConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_key: Option<String>,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub backup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct TargetConfig {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_key: Option<String>,
}

/// Outcome of applying the configuration to one target.
#[derive(Debug)]
pub struct TargetResult {
    pub path: PathBuf,
    pub result: Result<SaveReport>,
}

impl AppConfig {
    /// Load the application configuration from the default path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Unable to determine the config directory
    /// - Unable to read the config file (other than it not existing)
    /// - The config file contains invalid TOML
    pub fn load() -> Result<Option<Self>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(None);
        }

        Self::load_from(&config_path).map(Some)
    }

    /// Load the application configuration from an explicit path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config at {}", config_path.display()))?;

        debug!(
            "Loaded {} target(s) and {} server(s) from {}",
            config.targets.len(),
            config.servers.len(),
            config_path.display()
        );
        Ok(config)
    }

    /// Get the path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if unable to determine the config directory
    pub fn config_path() -> Result<PathBuf> {
        if let Some(explicit) = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
        {
            Ok(PathBuf::from(explicit))
        } else if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
            Ok(PathBuf::from(config_home).join("mcp-inject").join("config.toml"))
        } else if let Some(proj_dirs) = ProjectDirs::from("", "", "mcp-inject") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            anyhow::bail!("Could not determine config directory")
        }
    }

    /// Servers as pending entries, keyed by their table name.
    pub fn entries(&self) -> PendingEntries {
        self.servers
            .iter()
            .map(|(name, server)| ServerEntry { key: name.clone(), ..server.clone() })
            .collect()
    }

    fn strategy(&self) -> MergeStrategy {
        if self.default.overwrite {
            MergeStrategy::Overwrite
        } else {
            MergeStrategy::PreserveExisting
        }
    }

    /// One writer per distinct target path, in declaration order.
    pub fn writers(&self) -> Vec<ConfigWriter> {
        let entries = self.entries();
        let mut seen = BTreeSet::new();

        self.targets
            .iter()
            .filter_map(|target| {
                let path = expand_home(&target.path);
                if !seen.insert(file_identity(&path)) {
                    warn!("Target {} listed more than once, ignoring duplicate", path.display());
                    return None;
                }

                let mut writer = ConfigWriter::new(path)
                    .strategy(self.strategy())
                    .backup(self.default.backup);
                if let Some(key) = target.config_key.as_ref().or(self.default.config_key.as_ref())
                {
                    writer = writer.config_key(key.clone());
                }
                Some(entries.iter().cloned().fold(writer, ConfigWriter::add_server))
            })
            .collect()
    }

    /// Merge every server into every target. Targets are distinct files, so
    /// they are processed in parallel.
    pub fn apply(&self, dry_run: bool) -> Vec<TargetResult> {
        if self.targets.is_empty() {
            warn!("No targets configured");
        }

        self.writers()
            .par_iter()
            .map(|writer| {
                let result = if dry_run {
                    writer.preview().map(|outcome| SaveReport {
                        outcome,
                        written: false,
                        backup_path: None,
                    })
                } else {
                    writer.try_save()
                };
                TargetResult { path: writer.path().to_path_buf(), result }
            })
            .collect()
    }
}

/// A path naming the same file as `path` for every spelling of it.
///
/// Existing files resolve through symlinks; otherwise `.` components are
/// dropped and the parent directory is canonicalized when it exists.
fn file_identity(path: &Path) -> PathBuf {
    if let Ok(resolved) = std::fs::canonicalize(path) {
        return resolved;
    }

    let lexical: PathBuf =
        path.components().filter(|component| !matches!(component, Component::CurDir)).collect();
    let parent = lexical.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    match (std::fs::canonicalize(parent), lexical.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => lexical,
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) => match rest.strip_prefix(['/', '\\']) {
            Some(rest) => rest,
            None => return PathBuf::from(path),
        },
        None => return PathBuf::from(path),
    };

    BaseDirs::new().map_or_else(
        || PathBuf::from(path),
        |dirs| if rest.is_empty() { dirs.home_dir().to_path_buf() } else { dirs.home_dir().join(rest) },
    )
}
