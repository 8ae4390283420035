//! Infrastructure implementation of the `AppConfigStore` port.
//!
//! `StateManager` keeps one JSON record per app key under the state
//! directory, written atomically (temp file + rename) to prevent corruption.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::AppConfigStore;
use crate::domain::app_config::AppRecord;
use crate::domain::descriptor::validate_key;

/// Per-key state file manager.
#[derive(Debug, Clone)]
pub struct StateManager {
    dir: PathBuf,
}

impl StateManager {
    /// Create a state manager rooted at `dir`.
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not a valid app key.
    pub fn record_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn load_sync(path: &Path) -> Result<Option<AppRecord>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading state file {}", path.display()))?;
        let record: AppRecord = serde_json::from_str(&content)
            .with_context(|| format!("parsing state file {}", path.display()))?;
        Ok(Some(record))
    }

    fn save_sync(path: &Path, record: &AppRecord) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(record).context("serializing state")?;

        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, path)
            .with_context(|| format!("finalizing state file {}", path.display()))?;
        Ok(())
    }

    fn clear_sync(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)
                .with_context(|| format!("removing state file {}", path.display()))?;
        }
        Ok(())
    }
}

impl AppConfigStore for StateManager {
    async fn load(&self, key: &str) -> Result<Option<AppRecord>> {
        let path = self.record_path(key)?;
        tokio::task::spawn_blocking(move || Self::load_sync(&path))
            .await
            .context("state load task panicked")?
    }

    async fn save(&self, key: &str, record: &AppRecord) -> Result<()> {
        let path = self.record_path(key)?;
        let record = record.clone();
        tokio::task::spawn_blocking(move || Self::save_sync(&path, &record))
            .await
            .context("state save task panicked")?
    }

    async fn clear(&self, key: &str) -> Result<()> {
        let path = self.record_path(key)?;
        tokio::task::spawn_blocking(move || Self::clear_sync(&path))
            .await
            .context("state clear task panicked")?
    }
}
