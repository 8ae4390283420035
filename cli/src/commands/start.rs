//! `apphub start <key>`: launch an installed app in the background.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;

/// Run `apphub start`.
///
/// Returns once the app process is spawned. Its output is appended to
/// `<state dir>/logs/<key>.log`.
///
/// # Errors
///
/// Returns an error if the app is not installed, an image cannot be
/// restored, or the app process cannot be spawned.
pub async fn run(app: &AppContext, key: &str) -> Result<ExitCode> {
    let catalog = app.catalog()?;
    let _lock = app.lock(key)?;
    let deps = app.lifecycle_deps();
    let mut controller = deps.controller(app, &catalog, key).await?;

    let handle = controller.start().await?;
    tracing::debug!(app = key, command = handle.command(), "start returned");

    if app.is_json() {
        app.renderer().render_status(&controller.status())?;
    } else {
        let log = app.log_dir().join(format!("{key}.log"));
        app.output.kv("Log:", &log.display().to_string());
        app.output.info(&format!("Stop it: apphub stop {key}"));
    }
    Ok(ExitCode::SUCCESS)
}
