//! JSON output helpers.
//!
//! Provides the renderer used by `--json` and the error-object formatter
//! used when a command fails in JSON mode.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::services::lifecycle::AppStatus;
use crate::domain::AppHubConfig;

/// Renders domain types as pretty-printed JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// Render the CLI version.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        print_json(&serde_json::json!({ "version": version }))
    }

    /// Render every app.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_app_list(&self, apps: &[AppStatus]) -> Result<()> {
        print_json(&serde_json::json!({ "apps": apps }))
    }

    /// Render one app.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_status(&self, status: &AppStatus) -> Result<()> {
        print_json(status)
    }

    /// Render the effective configuration with resolved directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_config(&self, config: &AppHubConfig, path: &Path, home: &Path) -> Result<()> {
        print_json(&serde_json::json!({
            "path": path,
            "host": config.host,
            "images": { "directory": config.images_dir(home) },
            "apps": { "directory": config.apps_dir(home) },
            "state": { "directory": config.state_dir(home) },
            "exec": { "timeout_secs": config.exec.timeout_secs },
        }))
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    println!("{out}");
    Ok(())
}

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}
