//! `apphub stop <key>`: stop a running app, keeping it installed.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::domain::AppState;

/// Run `apphub stop`.
///
/// # Errors
///
/// Returns an error if the stop command fails.
pub async fn run(app: &AppContext, key: &str) -> Result<ExitCode> {
    let catalog = app.catalog()?;
    let _lock = app.lock(key)?;
    let deps = app.lifecycle_deps();
    let mut controller = deps.controller(app, &catalog, key).await?;
    let ctx = &app.output;

    match controller.state() {
        AppState::Uninstalled => {
            ctx.info(&format!("'{key}' is not installed."));
        }
        AppState::Installed => {
            ctx.info(&format!("'{key}' is already stopped."));
            ctx.info(&format!("Start it: apphub start {key}"));
        }
        AppState::Running => {
            controller.close().await?;
            ctx.success(&format!("{} stopped.", controller.descriptor().name));
        }
    }

    if app.is_json() {
        app.renderer().render_status(&controller.status())?;
    }
    Ok(ExitCode::SUCCESS)
}
