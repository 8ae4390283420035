//! `apphub status <key>`: one app's state and settings.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;

/// Run `apphub status`.
///
/// # Errors
///
/// Returns an error if the key is unknown or its record cannot be read.
pub async fn run(app: &AppContext, key: &str) -> Result<ExitCode> {
    let catalog = app.catalog()?;
    let deps = app.lifecycle_deps();
    let controller = deps.controller(app, &catalog, key).await?;
    app.renderer().render_status(&controller.status())?;
    Ok(ExitCode::SUCCESS)
}
