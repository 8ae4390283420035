//! `apphub version`: print the CLI version.

use std::process::ExitCode;

use anyhow::Result;

use crate::output::{HumanRenderer, JsonRenderer, OutputContext};

/// Run the version command.
///
/// Needs no configuration, so it works even when the config file is broken.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(json: bool) -> Result<ExitCode> {
    let version = env!("CARGO_PKG_VERSION");
    if json {
        JsonRenderer.render_version(version)?;
    } else {
        HumanRenderer::new(&OutputContext::new(true, false)).render_version(version);
    }
    Ok(ExitCode::SUCCESS)
}
