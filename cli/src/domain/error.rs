//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::app_config::AppState;

// ── Command execution errors ──────────────────────────────────────────────────

/// Errors raised by a `CommandExecutor` for a single invocation.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Working directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Command `{command}` exited with code {exit_code}{}", format_tail(.tail))]
    CommandFailed {
        command: String,
        exit_code: i32,
        tail: Vec<String>,
    },

    #[error("Command `{command}` was terminated by a signal")]
    Terminated { command: String },

    #[error("Command `{command}` timed out after {timeout:?}")]
    TimedOut { command: String, timeout: Duration },
}

fn format_tail(tail: &[String]) -> String {
    if tail.is_empty() {
        String::new()
    } else {
        format!(":\n{}", tail.join("\n"))
    }
}

// ── Image provisioning errors ─────────────────────────────────────────────────

/// Errors raised while restoring container images from archives.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Image '{image}' is missing and no archive was found at {}", .archive.display())]
    MissingArchive { image: String, archive: PathBuf },
}

// ── Lifecycle errors ──────────────────────────────────────────────────────────

/// Errors raised when a lifecycle transition is not allowed.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("'{key}' cannot {operation} while {state}.")]
    InvalidTransition {
        key: String,
        operation: &'static str,
        state: AppState,
    },

    #[error("'{0}' is running. Stop it first: apphub stop {0} (or pass --force).")]
    AppRunning(String),

    #[error("Version '{requested}' is not available for '{key}'. Available: {available}")]
    UnsupportedVersion {
        key: String,
        requested: String,
        available: String,
    },

    #[error(
        "Source directory already exists: {}. Pass --force to replace it.",
        .0.display()
    )]
    SourceDirectoryExists(PathBuf),

    #[error("Installation of '{0}' was interrupted; the partial checkout was removed.")]
    Interrupted(String),

    #[error("Another apphub process is operating on '{key}' (lock: {}).", .path.display())]
    LockHeld { key: String, path: PathBuf },
}

// ── Descriptor errors ─────────────────────────────────────────────────────────

/// Errors related to plugin descriptor validation and lookup.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Invalid app key '{0}': must match ^[A-Za-z0-9_-]+$")]
    InvalidKey(String),

    #[error("App '{key}' is invalid: {reason}")]
    Invalid { key: String, reason: String },

    #[error("Unknown app '{0}'. Run 'apphub list' to see available apps.")]
    NotFound(String),

    #[error("Duplicate app key '{0}'.")]
    DuplicateKey(String),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\n{reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}
