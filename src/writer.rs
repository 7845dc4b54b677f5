use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::entry::{PendingEntries, ServerEntry};
use crate::merge::{merge, MergeConfig, MergeOutcome, MergeStrategy};
use crate::DEFAULT_CONFIG_KEY;

/// Installs server entries into one configuration file.
///
/// ```no_run
/// use mcp_inject::{ConfigWriter, ServerEntry};
///
/// let saved = ConfigWriter::new(".vscode/mcp.json")
///     .config_key("servers")
///     .add_server(ServerEntry::new("boost", "php").args(["artisan", "boost:mcp"]))
///     .save();
/// assert!(saved);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigWriter {
    path: PathBuf,
    config_key: String,
    strategy: MergeStrategy,
    backup: bool,
    entries: PendingEntries,
}

/// What a successful [`ConfigWriter::try_save`] did.
#[derive(Debug, Clone)]
pub struct SaveReport {
    pub outcome: MergeOutcome,
    /// Whether the target file was rewritten.
    pub written: bool,
    pub backup_path: Option<String>,
}

impl ConfigWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config_key: DEFAULT_CONFIG_KEY.to_string(),
            strategy: MergeStrategy::default(),
            backup: false,
            entries: PendingEntries::new(),
        }
    }

    #[must_use]
    pub fn config_key(mut self, key: impl Into<String>) -> Self {
        self.config_key = key.into();
        self
    }

    /// Queue an entry. A later entry with the same key replaces it.
    #[must_use]
    pub fn add_server(mut self, entry: ServerEntry) -> Self {
        self.entries.insert(entry);
        self
    }

    #[must_use]
    pub const fn strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Copy an existing target to a timestamped sibling before rewriting it.
    #[must_use]
    pub const fn backup(mut self, enabled: bool) -> Self {
        self.backup = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn merge_config(&self) -> MergeConfig {
        MergeConfig::new(self.config_key.clone()).with_strategy(self.strategy)
    }

    fn read_existing(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(Some(content))
    }

    /// Compute the merged document without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing file cannot be read or merged.
    pub fn preview(&self) -> Result<MergeOutcome> {
        let existing = self.read_existing()?;
        merge(&self.merge_config(), existing.as_deref(), &self.entries)
            .with_context(|| format!("Failed to merge servers into {}", self.path.display()))
    }

    /// Merge the queued entries into the target file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The parent directory cannot be created
    /// - The existing file cannot be read
    /// - The document cannot be merged (not an object, unbalanced brackets)
    /// - The new document cannot be written
    ///
    /// The target is left untouched on every error.
    pub fn try_save(&self) -> Result<SaveReport> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let outcome = self.preview()?;
        if !outcome.changed {
            debug!("{} already up to date", self.path.display());
            return Ok(SaveReport { outcome, written: false, backup_path: None });
        }

        let backup_path = if self.backup { backup_file(&self.path)? } else { None };
        if let Some(ref backup) = backup_path {
            info!("Backup created: {backup}");
        }

        write_atomically(&self.path, &outcome.document)?;
        info!("Updated {} ({} mode)", self.path.display(), outcome.mode);

        Ok(SaveReport { outcome, written: true, backup_path })
    }

    /// Merge and write, reporting only success.
    pub fn save(&self) -> bool {
        match self.try_save() {
            Ok(_) => true,
            Err(e) => {
                error!("Failed to update {}: {e:#}", self.path.display());
                false
            },
        }
    }
}

/// Replace `path` with `content` through a temporary file in the same
/// directory, so readers never observe a partially written document.
///
/// A symlinked `path` keeps its link; the file it points to is replaced.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, written or
/// renamed over the target.
pub fn write_atomically<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let resolved = resolve_target(path.as_ref())?;
    let path_ref = resolved.as_path();
    let dir = path_ref.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    temp.write_all(content.as_bytes())?;
    temp.flush()?;

    if let Ok(metadata) = fs::metadata(path_ref) {
        fs::set_permissions(temp.path(), metadata.permissions())?;
    }

    temp.persist(path_ref)
        .map_err(|e| anyhow::anyhow!("Failed to replace {}: {}", path_ref.display(), e.error))?;

    Ok(())
}

/// The file a write to `path` should land in, following symlinks.
fn resolve_target(path: &Path) -> Result<PathBuf> {
    let is_link = fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink());
    if !is_link {
        return Ok(path.to_path_buf());
    }

    match fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        // Dangling link: create the file it names.
        Err(_) => {
            let target = fs::read_link(path)
                .with_context(|| format!("Failed to read symlink {}", path.display()))?;
            let base = path.parent().unwrap_or(Path::new(""));
            Ok(if target.is_absolute() { target } else { base.join(target) })
        },
    }
}

/// Create a backup of a file with timestamp
///
/// # Errors
///
/// Returns an error if unable to copy the file
pub fn backup_file<P: AsRef<Path>>(path: P) -> Result<Option<String>> {
    let path_ref = path.as_ref();

    if !path_ref.exists() {
        return Ok(None);
    }

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let backup_path = path_ref.with_file_name(format!(
        "{}.backup.{}",
        path_ref.file_name().and_then(|n| n.to_str()).unwrap_or("mcp.json"),
        timestamp
    ));

    fs::copy(path_ref, &backup_path)?;

    Ok(Some(backup_path.to_string_lossy().to_string()))
}
