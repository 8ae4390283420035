//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppHubConfig;

/// Load configuration.
///
/// # Errors
///
/// Returns an error if the stored configuration cannot be read or parsed.
pub fn load_config(store: &impl ConfigStore) -> Result<AppHubConfig> {
    store.load()
}

/// Save configuration.
///
/// # Errors
///
/// Returns an error if the configuration cannot be written.
pub fn save_config(store: &impl ConfigStore, config: &AppHubConfig) -> Result<()> {
    store.save(config)
}

/// Validate and apply `key = value`, then persist.
///
/// # Errors
///
/// Returns an error if validation fails or the configuration cannot be
/// loaded or saved. Nothing is written when validation fails.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<AppHubConfig> {
    let mut config = load_config(store)?;
    config.set(key, value)?;
    save_config(store, &config)?;
    Ok(config)
}

/// Host handed to applications: `APPHUB_HOST` if set, else the configured one.
#[must_use]
pub fn effective_host(config: &AppHubConfig, env_override: Option<String>) -> String {
    env_override
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| config.host.clone())
}
