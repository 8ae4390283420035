//! Infrastructure implementation of the `ConfigStore` port.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppHubConfig;

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "APPHUB_CONFIG";

/// Production implementation of `ConfigStore` that uses a YAML file on disk.
///
/// The default store reads `APPHUB_CONFIG`, falling back to
/// `~/.apphub/config.yaml`.
#[derive(Debug, Clone, Default)]
pub struct YamlConfigStore {
    path: Option<PathBuf>,
}

impl YamlConfigStore {
    /// A store bound to an explicit file.
    #[must_use]
    pub fn at(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// AppHub home: the directory containing the configuration file.
    ///
    /// Default directories (images, apps, state) resolve under it.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn home(&self) -> Result<PathBuf> {
        let path = self.path()?;
        path.parent()
            .map(std::path::Path::to_path_buf)
            .ok_or_else(|| anyhow::anyhow!("config path {} has no parent", path.display()))
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<AppHubConfig> {
        let path = self.path()?;
        if !path.exists() {
            return Ok(AppHubConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }

    fn save(&self, config: &AppHubConfig) -> Result<()> {
        let path = self.path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(config).context("cannot serialize config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("cannot write {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("cannot set permissions on {}", path.display()))?;
        }
        Ok(())
    }

    fn path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        if let Ok(val) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(val));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(home.join(".apphub").join("config.yaml"))
    }
}
