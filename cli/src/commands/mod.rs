//! Command implementations

pub mod config;
pub mod install;
pub mod list;
pub mod start;
pub mod status;
pub mod stop;
pub mod uninstall;
pub mod version;

use clap::Args;

use crate::domain::error::{
    ConfigError, DescriptorError, ExecError, LifecycleError, ProvisionError,
};

/// Arguments for commands addressing a single app.
#[derive(Args)]
pub struct KeyArgs {
    /// App key (see `apphub list`)
    pub key: String,
}

/// Stable machine-readable code for an error, used by `--json` output.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<LifecycleError>() {
        return match e {
            LifecycleError::InvalidTransition { .. } => "invalid_transition",
            LifecycleError::AppRunning(_) => "app_running",
            LifecycleError::UnsupportedVersion { .. } => "unsupported_version",
            LifecycleError::SourceDirectoryExists(_) => "source_exists",
            LifecycleError::LockHeld { .. } => "lock_held",
            LifecycleError::Interrupted(_) => "interrupted",
        };
    }
    if let Some(e) = err.downcast_ref::<ExecError>() {
        return match e {
            ExecError::DirectoryNotFound(_) => "directory_not_found",
            ExecError::CommandFailed { .. } => "command_failed",
            ExecError::Terminated { .. } => "command_terminated",
            ExecError::TimedOut { .. } => "command_timed_out",
        };
    }
    if err.downcast_ref::<ProvisionError>().is_some() {
        return "missing_archive";
    }
    if let Some(e) = err.downcast_ref::<DescriptorError>() {
        return match e {
            DescriptorError::NotFound(_) => "unknown_app",
            _ => "invalid_descriptor",
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return "invalid_config";
    }
    "error"
}
