//! `apphub install <key>`: check out an app's source and pull its images.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::domain::error::LifecycleError;

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// App key (see `apphub list`)
    pub key: String,

    /// Directory the source checkout is created in
    #[arg(long, short = 'l')]
    pub location: PathBuf,

    /// Version to install (defaults to the newest listed)
    #[arg(long, visible_alias = "release")]
    pub app_version: Option<String>,

    /// Replace a checkout left behind by an earlier, unfinished install
    #[arg(long)]
    pub force: bool,
}

/// Run `apphub install`.
///
/// # Errors
///
/// Returns an error if the app is unknown or already installed, another
/// process holds its lock, checkout or image pull fails, or the install is
/// interrupted. An interrupted install removes its partial checkout.
pub async fn run(app: &AppContext, args: &InstallArgs) -> Result<ExitCode> {
    let catalog = app.catalog()?;
    let descriptor = catalog.get(&args.key)?;
    let version = match &args.app_version {
        Some(v) => v.clone(),
        None => descriptor
            .default_version()
            .with_context(|| format!("'{}' lists no versions", descriptor.key))?
            .to_string(),
    };
    let location = std::path::absolute(&args.location)
        .with_context(|| format!("resolving {}", args.location.display()))?;

    let _lock = app.lock(&args.key)?;
    let deps = app.lifecycle_deps();
    let mut controller = deps.controller(app, &catalog, &args.key).await?;

    if args.force && controller.discard_partial_checkout(&location)? {
        app.output
            .info(&format!("Removed existing checkout under {}", location.display()));
    }

    app.output
        .header(&format!("Installing {} {version}", descriptor.name));
    let interrupted = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let finished = tokio::select! {
        result = controller.installation(&location, &version) => Some(result),
        () = interrupted => None,
    };
    match finished {
        Some(result) => result?,
        None => {
            controller.discard_partial_checkout(&location)?;
            return Err(LifecycleError::Interrupted(args.key.clone()).into());
        }
    }

    if app.is_json() {
        app.renderer().render_status(&controller.status())?;
    }
    Ok(ExitCode::SUCCESS)
}
