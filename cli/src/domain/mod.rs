//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod app_config;
pub mod command;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod images;

pub use app_config::{AppConfig, AppRecord, AppState};
pub use command::{CommandSpec, ExecutionRecord};
pub use config::{AppHubConfig, validate_config_key, validate_config_value};
pub use descriptor::{PluginDescriptor, SourceSpec, archive_file_name, validate_key};
pub use error::{ConfigError, DescriptorError, ExecError, LifecycleError, ProvisionError};
pub use images::{HostImages, missing_images};
