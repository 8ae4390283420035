//! `apphub list`: every known app with its recorded state.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;

/// Run `apphub list`.
///
/// # Errors
///
/// Returns an error if the catalog or a state record cannot be read.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let catalog = app.catalog()?;
    let deps = app.lifecycle_deps();
    let mut apps = Vec::new();
    for descriptor in catalog.iter() {
        let controller = deps.controller(app, &catalog, &descriptor.key).await?;
        apps.push(controller.status());
    }
    app.renderer().render_app_list(&apps)?;
    Ok(ExitCode::SUCCESS)
}
