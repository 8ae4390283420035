//! Ensure required container images exist on the host, restoring missing
//! ones from local archives.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{CommandExecutor, LogSink};
use crate::domain::command::{CommandSpec, shell_quote};
use crate::domain::error::ProvisionError;
use crate::domain::{HostImages, archive_file_name, missing_images};

/// Host query listing every local image as `repository:tag`.
pub const LIST_IMAGES: &str = "docker image ls --format '{{.Repository}}:{{.Tag}}'";

/// What `ensure_present` found and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Required images that were already on the host.
    pub present: Vec<String>,
    /// Images restored from archives, in load order.
    pub loaded: Vec<String>,
}

/// Take one snapshot of the images present on the host.
///
/// # Errors
///
/// Returns an error if the listing command fails.
pub async fn list_host_images(exec: &impl CommandExecutor) -> Result<HostImages> {
    let record = exec
        .run(&CommandSpec::new(LIST_IMAGES).silent())
        .await
        .context("listing host images")?;
    let host = HostImages::parse(&record.stdout_text());
    tracing::debug!(repositories = host.len(), "host image snapshot");
    Ok(host)
}

/// Query the host once, then load every required image it lacks from
/// `archive_dir`.
///
/// # Errors
///
/// Returns `ProvisionError::MissingArchive` if a needed archive does not
/// exist, or the executor's error if a listing or load command fails.
pub async fn ensure_present(
    exec: &impl CommandExecutor,
    sink: &impl LogSink,
    required: &[String],
    archive_dir: &Path,
    timeout: Option<Duration>,
) -> Result<ProvisionReport> {
    let host = list_host_images(exec).await?;
    provision_from_snapshot(exec, sink, required, &host, archive_dir, timeout).await
}

/// Load the images in `required` that `host` lacks.
///
/// Every needed archive is checked before the first load, so a missing
/// archive aborts without touching the host.
///
/// # Errors
///
/// As for `ensure_present`.
pub async fn provision_from_snapshot(
    exec: &impl CommandExecutor,
    sink: &impl LogSink,
    required: &[String],
    host: &HostImages,
    archive_dir: &Path,
    timeout: Option<Duration>,
) -> Result<ProvisionReport> {
    let missing = missing_images(required, host);
    let present = required
        .iter()
        .filter(|image| !missing.contains(&image.as_str()))
        .cloned()
        .collect();

    let plan = missing
        .iter()
        .map(|image| {
            let archive = archive_dir.join(archive_file_name(image));
            if archive.is_file() {
                Ok((*image, archive))
            } else {
                Err(ProvisionError::MissingArchive {
                    image: (*image).to_string(),
                    archive,
                })
            }
        })
        .collect::<Result<Vec<(&str, PathBuf)>, ProvisionError>>()?;

    let mut loaded = Vec::with_capacity(plan.len());
    for (image, archive) in plan {
        sink.step(&format!("loading image {image}..."));
        let file_name = archive
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_owned)
            .with_context(|| format!("archive path {} is not valid UTF-8", archive.display()))?;
        let cmd = CommandSpec::new(format!("docker load < {}", shell_quote(&file_name)))
            .cwd(archive_dir)
            .timeout(timeout);
        exec.run(&cmd)
            .await
            .with_context(|| format!("loading image {image}"))?;
        tracing::info!(image, archive = %archive.display(), "image restored from archive");
        loaded.push(image.to_string());
    }

    if !loaded.is_empty() {
        sink.success(&format!("restored {} image(s)", loaded.len()));
    }
    Ok(ProvisionReport { present, loaded })
}
