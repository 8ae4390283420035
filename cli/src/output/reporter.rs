//! Presentation-layer implementations of `LogSink` and `LifecycleNotifier`.
//!
//! Both own a clone of the `OutputContext` so they can be shared with the
//! background task that streams daemon output.

use owo_colors::OwoColorize as _;

use crate::application::ports::{DaemonHandle, LifecycleNotifier, LogSink};
use crate::domain::{AppConfig, PluginDescriptor};
use crate::output::OutputContext;

/// Terminal log sink.
///
/// - `line()` prints `"    │ {line}"` dimmed
/// - `step()` prints `"  → {message}"`
/// - `success()` prints `"  ✓ {message}"`
/// - `warn()` prints `"  ! {message}"`
///
/// Everything is suppressed when `ctx.quiet`; command output is also
/// recorded as `debug` tracing events.
pub struct TerminalSink {
    ctx: OutputContext,
}

impl TerminalSink {
    /// Create a new `TerminalSink` over a copy of the given output context.
    #[must_use]
    pub fn new(ctx: &OutputContext) -> Self {
        Self { ctx: ctx.clone() }
    }
}

impl LogSink for TerminalSink {
    fn line(&self, line: &str) {
        tracing::debug!(target: "apphub::exec", "{line}");
        if !self.ctx.quiet {
            println!("    {} {}", "│".style(self.ctx.styles.dim), line.style(self.ctx.styles.dim));
        }
    }

    fn step(&self, message: &str) {
        if !self.ctx.quiet {
            println!("  {} {message}", "→".style(self.ctx.styles.step));
        }
    }

    fn success(&self, message: &str) {
        if !self.ctx.quiet {
            println!("  {} {message}", "✓".style(self.ctx.styles.success));
        }
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
        if !self.ctx.quiet {
            println!("  {} {message}", "!".style(self.ctx.styles.warning));
        }
    }
}

/// Reports lifecycle notifications on the terminal.
pub struct TerminalNotifier {
    ctx: OutputContext,
}

impl TerminalNotifier {
    #[must_use]
    pub fn new(ctx: &OutputContext) -> Self {
        Self { ctx: ctx.clone() }
    }
}

impl LifecycleNotifier for TerminalNotifier {
    fn app_installed(&self, descriptor: &PluginDescriptor, config: &AppConfig) {
        tracing::info!(app = %descriptor.key, "app_installed");
        let version = config.version.as_deref().unwrap_or("?");
        self.ctx
            .success(&format!("{} {version} installed.", descriptor.name));
        self.ctx
            .info(&format!("Start it: apphub start {}", descriptor.key));
    }

    fn app_started(&self, descriptor: &PluginDescriptor, handle: &DaemonHandle) {
        tracing::info!(app = %descriptor.key, pid = ?handle.pid(), "app_started");
        self.ctx.success(&format!("{} started.", descriptor.name));
        self.ctx.kv("Port:", &descriptor.port.to_string());
        if let Some(pid) = handle.pid() {
            self.ctx.kv("Pid:", &pid.to_string());
        }
        self.ctx
            .info("Readiness is not awaited; the app may need a minute to come up.");
    }
}
