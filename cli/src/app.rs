//! Application context: unified state passed to every command handler.
//!
//! `AppContext` resolves the configuration once and hands out the adapters
//! each command needs. Lifecycle commands borrow a `LifecycleDeps` bundle
//! and build an `AppController` over it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::application::services::catalog::Catalog;
use crate::application::services::config_service;
use crate::application::services::lifecycle::{AppController, ControllerSettings, LifecyclePorts};
use crate::domain::config::AppHubConfig;
use crate::infra::catalog::YamlDescriptorDir;
use crate::infra::command_runner::TokioCommandExecutor;
use crate::infra::config::YamlConfigStore;
use crate::infra::lock::KeyLock;
use crate::infra::state::StateManager;
use crate::output::{
    HumanRenderer, JsonRenderer, OutputContext, Renderer, TerminalNotifier, TerminalSink,
};

/// Environment variable overriding the configured host.
pub const HOST_ENV: &str = "APPHUB_HOST";

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `APPHUB_YES` env vars).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Controller type driven by the CLI.
pub type TerminalController<'d> =
    AppController<'d, TokioCommandExecutor, StateManager, TerminalNotifier, TerminalSink>;

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Global configuration file store.
    pub config_store: YamlConfigStore,
    /// Configuration loaded at startup.
    pub config: AppHubConfig,
    /// AppHub home; default directories resolve under it.
    pub home: PathBuf,
    /// When `true`, skip interactive prompts and use defaults.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or the
    /// configuration file cannot be parsed.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        Self::with_store(flags, YamlConfigStore::default())
    }

    /// Construct an `AppContext` over an explicit configuration store.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn with_store(flags: &AppFlags, config_store: YamlConfigStore) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("APPHUB_YES").is_ok();
        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        let config = config_service::load_config(&config_store)?;
        let home = config_store.home()?;

        Ok(Self {
            // stdout carries only the JSON document in JSON mode
            output: OutputContext::new(
                flags.output.no_color,
                flags.output.quiet || flags.output.json,
            ),
            mode,
            config_store,
            config,
            home,
            non_interactive: flags.behaviour.yes || ci_env,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `APPHUB_YES`
    /// env) or stdout is not a terminal, returns `default` without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive || !self.output.is_tty {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }

    /// Host handed to applications on start.
    #[must_use]
    pub fn host(&self) -> String {
        config_service::effective_host(&self.config, std::env::var(HOST_ENV).ok())
    }

    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.config.state_dir(&self.home)
    }

    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.state_dir().join("logs")
    }

    #[must_use]
    pub fn state_manager(&self) -> StateManager {
        StateManager::new(self.state_dir())
    }

    /// Built-in descriptors plus any found in the apps directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a descriptor file is unreadable or invalid.
    pub fn catalog(&self) -> Result<Catalog> {
        Catalog::load(&YamlDescriptorDir::new(self.config.apps_dir(&self.home)))
    }

    /// Take the per-app lock for a mutating lifecycle call.
    ///
    /// # Errors
    ///
    /// Returns an error if another process holds the lock.
    pub fn lock(&self, key: &str) -> Result<KeyLock> {
        KeyLock::acquire(&self.state_dir(), key)
    }

    #[must_use]
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            host: self.host(),
            docker_image_directory: self.config.images_dir(&self.home),
            exec_timeout: self.config.exec_timeout(),
            log_dir: Some(self.log_dir()),
        }
    }

    /// Adapters backing the lifecycle controller.
    #[must_use]
    pub fn lifecycle_deps(&self) -> LifecycleDeps {
        let sink = Arc::new(TerminalSink::new(&self.output));
        LifecycleDeps {
            executor: TokioCommandExecutor::new(sink.clone()),
            store: self.state_manager(),
            notifier: TerminalNotifier::new(&self.output),
            sink,
        }
    }
}

/// Owned adapters a `TerminalController` borrows.
pub struct LifecycleDeps {
    pub executor: TokioCommandExecutor,
    pub store: StateManager,
    pub notifier: TerminalNotifier,
    pub sink: Arc<TerminalSink>,
}

impl LifecycleDeps {
    /// Load the controller for `key`, recovering its persisted state.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or its record is unreadable.
    pub async fn controller(
        &self,
        app: &AppContext,
        catalog: &Catalog,
        key: &str,
    ) -> Result<TerminalController<'_>> {
        let descriptor = catalog.get(key)?.clone();
        let ports = LifecyclePorts {
            executor: &self.executor,
            store: &self.store,
            notifier: &self.notifier,
            sink: self.sink.as_ref(),
        };
        AppController::load(descriptor, app.controller_settings(), ports).await
    }
}
