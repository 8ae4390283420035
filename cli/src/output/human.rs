//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;

use crate::application::services::lifecycle::AppStatus;
use crate::domain::{AppHubConfig, AppState};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version.
    pub fn render_version(&self, version: &str) {
        println!("apphub {version}");
    }

    /// Render one line per app.
    pub fn render_app_list(&self, apps: &[AppStatus]) {
        if apps.is_empty() {
            self.ctx.info("No apps available.");
            return;
        }
        let width = apps.iter().map(|a| a.key.len()).max().unwrap_or(0);
        for app in apps {
            println!(
                "  {}  {}  {}",
                format!("{:<width$}", app.key).style(self.ctx.styles.bold),
                self.state_label(app.state, 11),
                app.name,
            );
        }
    }

    /// Render the details of one app.
    pub fn render_status(&self, status: &AppStatus) {
        self.ctx.header(&status.name);
        self.ctx.kv("Key:", &status.key);
        self.ctx.kv("State:", &self.state_label(status.state, 0));
        self.ctx.kv("Port:", &status.port.to_string());
        self.ctx.kv("Operator port:", &status.op_port.to_string());
        if let Some(version) = &status.version {
            self.ctx.kv("Version:", version);
        }
        if let Some(dir) = &status.source_directory {
            self.ctx.kv("Source:", &dir.display().to_string());
        }
        self.ctx
            .kv("Image archives:", &status.docker_image_directory.display().to_string());
        self.ctx.kv("Images:", &status.required_images.join(", "));
    }

    /// Render the effective configuration.
    pub fn render_config(&self, config: &AppHubConfig, path: &Path, home: &Path) {
        self.ctx.header("Configuration");
        self.ctx.kv("File:", &path.display().to_string());
        self.ctx.kv("host:", &config.host);
        self.ctx
            .kv("images.directory:", &config.images_dir(home).display().to_string());
        self.ctx
            .kv("apps.directory:", &config.apps_dir(home).display().to_string());
        self.ctx
            .kv("state.directory:", &config.state_dir(home).display().to_string());
        self.ctx
            .kv("exec.timeout_secs:", &config.exec.timeout_secs.to_string());
    }

    fn state_label(&self, state: AppState, width: usize) -> String {
        let style = match state {
            AppState::Running => self.ctx.styles.success,
            AppState::Installed => self.ctx.styles.info,
            AppState::Uninstalled => self.ctx.styles.dim,
        };
        format!("{:<width$}", state.to_string()).style(style).to_string()
    }
}
