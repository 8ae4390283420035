//! `apphub uninstall <key>`: remove an app's images, checkout and record.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;

/// Arguments for the uninstall command.
#[derive(Args)]
pub struct UninstallArgs {
    /// App key (see `apphub list`)
    pub key: String,

    /// Stop the app first if it is running
    #[arg(long)]
    pub force: bool,
}

/// Run `apphub uninstall`.
///
/// # Errors
///
/// Returns an error if the app is not installed, is running without
/// `--force`, or its record cannot be cleared.
pub async fn run(app: &AppContext, args: &UninstallArgs) -> Result<ExitCode> {
    let catalog = app.catalog()?;
    let descriptor = catalog.get(&args.key)?;

    let prompt = format!(
        "Uninstall {}? Its images and source checkout will be removed.",
        descriptor.name
    );
    if !app.non_interactive && !app.confirm(&prompt, false)? {
        app.output.info("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let _lock = app.lock(&args.key)?;
    let deps = app.lifecycle_deps();
    let mut controller = deps.controller(app, &catalog, &args.key).await?;
    controller.uninstall(args.force).await?;

    if app.is_json() {
        app.renderer().render_status(&controller.status())?;
    } else {
        app.output
            .success(&format!("{} uninstalled.", descriptor.name));
    }
    Ok(ExitCode::SUCCESS)
}
