//! Install-time configuration of one app and its lifecycle state.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of one app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    Uninstalled,
    Installed,
    Running,
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninstalled => "uninstalled",
            Self::Installed => "installed",
            Self::Running => "running",
        })
    }
}

/// Install-time parameters of one app.
///
/// `source_directory` is `Some` exactly when installation completed.
/// `docker_image_directory` comes from the global configuration and is never
/// written to the state file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_location: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_directory: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub docker_image_directory: PathBuf,
}

impl AppConfig {
    /// An empty config bound to the externally configured image directory.
    #[must_use]
    pub fn empty(docker_image_directory: PathBuf) -> Self {
        Self {
            docker_image_directory,
            ..Self::default()
        }
    }

    /// Whether installation completed for this config.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.source_directory.is_some()
    }
}

/// The record persisted per app key (`<state_dir>/<key>.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    #[serde(flatten)]
    pub config: AppConfig,
    /// Set after a successful `start`, cleared by `close`.
    #[serde(default)]
    pub running: bool,
}

impl AppRecord {
    /// Lifecycle state implied by this record.
    #[must_use]
    pub fn state(&self) -> AppState {
        match (self.config.is_installed(), self.running) {
            (false, _) => AppState::Uninstalled,
            (true, false) => AppState::Installed,
            (true, true) => AppState::Running,
        }
    }
}
