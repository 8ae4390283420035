//! Domain types and validators for AppHub configuration.
//!
//! Pure functions only (no I/O, no async, no filesystem access).

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "host",
    "images.directory",
    "apps.directory",
    "state.directory",
    "exec.timeout_secs",
];

/// Host substituted into the start command when none is configured.
pub const DEFAULT_HOST: &str = "127.0.0.1";

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.apphub/config.yaml`.
///
/// Directory fields left unset resolve under the AppHub home directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppHubConfig {
    /// External host address handed to applications on start.
    pub host: String,
    pub images: DirectoryConfig,
    pub apps: DirectoryConfig,
    pub state: DirectoryConfig,
    pub exec: ExecConfig,
}

impl Default for AppHubConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            images: DirectoryConfig::default(),
            apps: DirectoryConfig::default(),
            state: DirectoryConfig::default(),
            exec: ExecConfig::default(),
        }
    }
}

/// A configurable directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DirectoryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

/// Command execution settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecConfig {
    /// Timeout for synchronous commands in seconds; `0` disables it.
    pub timeout_secs: u64,
}

impl AppHubConfig {
    /// Directory holding image archives (`docker_image_directory`).
    #[must_use]
    pub fn images_dir(&self, home: &Path) -> PathBuf {
        resolve(self.images.directory.as_deref(), home, "images")
    }

    /// Directory holding extra descriptor YAML files.
    #[must_use]
    pub fn apps_dir(&self, home: &Path) -> PathBuf {
        resolve(self.apps.directory.as_deref(), home, "apps")
    }

    /// Directory holding app records, lock files and daemon logs.
    #[must_use]
    pub fn state_dir(&self, home: &Path) -> PathBuf {
        resolve(self.state.directory.as_deref(), home, "state")
    }

    /// Synchronous command timeout, if enabled.
    #[must_use]
    pub fn exec_timeout(&self) -> Option<std::time::Duration> {
        (self.exec.timeout_secs > 0).then(|| std::time::Duration::from_secs(self.exec.timeout_secs))
    }

    /// Apply a validated `key = value` pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        match key {
            "host" => self.host = value.to_string(),
            "images.directory" => self.images.directory = Some(PathBuf::from(value)),
            "apps.directory" => self.apps.directory = Some(PathBuf::from(value)),
            "state.directory" => self.state.directory = Some(PathBuf::from(value)),
            "exec.timeout_secs" => self.exec.timeout_secs = parse_timeout(key, value)?,
            _ => anyhow::bail!("Unknown setting: {key}"),
        }
        Ok(())
    }
}

fn resolve(configured: Option<&Path>, home: &Path, default: &str) -> PathBuf {
    configured.map_or_else(|| home.join(default), Path::to_path_buf)
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |reason: &str| -> anyhow::Error {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
        .into()
    };
    match key {
        "host" => {
            if value.trim().is_empty() || value.chars().any(char::is_whitespace) {
                return Err(invalid("Host must be a non-empty address without whitespace."));
            }
            if value.contains('\'') || value.contains('"') {
                return Err(invalid("Host must not contain quotes."));
            }
        }
        "images.directory" | "apps.directory" | "state.directory" => {
            if !Path::new(value).is_absolute() {
                return Err(invalid("Directories must be absolute paths."));
            }
        }
        "exec.timeout_secs" => {
            parse_timeout(key, value)?;
        }
        _ => {}
    }
    Ok(())
}

fn parse_timeout(key: &str, value: &str) -> Result<u64> {
    value.parse::<u64>().map_err(|_| {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "Timeout must be a whole number of seconds (0 disables it).".to_string(),
        }
        .into()
    })
}

// ── Unit tests ───────────────────────────────────────────────────────────────
