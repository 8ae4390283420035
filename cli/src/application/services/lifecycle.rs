//! App lifecycle controller: install, start, close, uninstall.
//!
//! One generic controller serves every app; only the `PluginDescriptor`
//! varies. Calls on one key must be serialized by the caller.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::application::ports::{
    AppConfigStore, CommandExecutor, DaemonHandle, LifecycleNotifier, LogSink,
};
use crate::application::services::image_provisioner::{self, ProvisionReport};
use crate::domain::command::{CommandSpec, shell_quote};
use crate::domain::error::{LifecycleError, ProvisionError};
use crate::domain::{AppConfig, AppRecord, AppState, PluginDescriptor};

const COMPOSE_PULL: &str = "docker compose pull";
const COMPOSE_UP: &str = "docker compose up";
const COMPOSE_DOWN: &str = "docker compose down";

/// Host-level settings the controller needs beyond the descriptor.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// External host address substituted into the start command.
    pub host: String,
    /// `docker_image_directory` for every app.
    pub docker_image_directory: PathBuf,
    /// Timeout for synchronous commands.
    pub exec_timeout: Option<Duration>,
    /// Directory receiving `<key>.log` for daemon output. `None` streams
    /// daemon output to the log sink instead.
    pub log_dir: Option<PathBuf>,
}

/// The ports a controller drives.
pub struct LifecyclePorts<'a, E, S, N, L> {
    pub executor: &'a E,
    pub store: &'a S,
    pub notifier: &'a N,
    pub sink: &'a L,
}

/// Serializable snapshot of one app for status output.
#[derive(Debug, Clone, Serialize)]
pub struct AppStatus {
    pub key: String,
    pub name: String,
    pub state: AppState,
    pub port: u16,
    pub op_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_directory: Option<PathBuf>,
    pub docker_image_directory: PathBuf,
    pub required_images: Vec<String>,
}

/// Lifecycle state machine for one app.
pub struct AppController<'a, E, S, N, L> {
    descriptor: PluginDescriptor,
    settings: ControllerSettings,
    config: AppConfig,
    state: AppState,
    ports: LifecyclePorts<'a, E, S, N, L>,
}

impl<'a, E, S, N, L> AppController<'a, E, S, N, L>
where
    E: CommandExecutor,
    S: AppConfigStore,
    N: LifecycleNotifier,
    L: LogSink,
{
    /// A controller with an empty config, in `Uninstalled`.
    #[must_use]
    pub fn new(
        descriptor: PluginDescriptor,
        settings: ControllerSettings,
        ports: LifecyclePorts<'a, E, S, N, L>,
    ) -> Self {
        let config = AppConfig::empty(settings.docker_image_directory.clone());
        Self {
            descriptor,
            settings,
            config,
            state: AppState::Uninstalled,
            ports,
        }
    }

    /// A controller whose state is recovered from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored record cannot be read.
    pub async fn load(
        descriptor: PluginDescriptor,
        settings: ControllerSettings,
        ports: LifecyclePorts<'a, E, S, N, L>,
    ) -> Result<Self> {
        let mut controller = Self::new(descriptor, settings, ports);
        if let Some(record) = controller.ports.store.load(&controller.descriptor.key).await? {
            controller.state = record.state();
            if controller.state != AppState::Uninstalled {
                controller.config = AppConfig {
                    docker_image_directory: controller.settings.docker_image_directory.clone(),
                    ..record.config
                };
            }
        }
        Ok(controller)
    }

    #[must_use]
    pub fn state(&self) -> AppState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn status(&self) -> AppStatus {
        AppStatus {
            key: self.descriptor.key.clone(),
            name: self.descriptor.name.clone(),
            state: self.state,
            port: self.descriptor.port,
            op_port: self.descriptor.op_port,
            version: self.config.version.clone(),
            source_directory: self.config.source_directory.clone(),
            docker_image_directory: self.config.docker_image_directory.clone(),
            required_images: self.descriptor.required_images.clone(),
        }
    }

    fn require(&self, operation: &'static str, allowed: &[AppState]) -> Result<()> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        Err(LifecycleError::InvalidTransition {
            key: self.descriptor.key.clone(),
            operation,
            state: self.state,
        }
        .into())
    }

    fn source_directory(&self) -> Result<&Path> {
        self.config
            .source_directory
            .as_deref()
            .with_context(|| format!("'{}' has no source directory", self.descriptor.key))
    }

    /// Install the app under `install_location` at `version`.
    ///
    /// Checks out the source, pre-pulls images, persists the config and
    /// signals `app_installed`. On failure nothing is persisted and the
    /// state stays `Uninstalled`.
    ///
    /// # Errors
    ///
    /// Returns an error if the app is already installed, the version is
    /// unknown, the checkout directory already exists, or any command fails.
    pub async fn installation(&mut self, install_location: &Path, version: &str) -> Result<()> {
        self.require("install", &[AppState::Uninstalled])?;
        let key = self.descriptor.key.clone();
        if !self.descriptor.supports_version(version) {
            return Err(LifecycleError::UnsupportedVersion {
                key,
                requested: version.to_string(),
                available: self.descriptor.versions.join(", "),
            }
            .into());
        }

        let source_directory = install_location.join(&self.descriptor.source.directory);
        if source_directory.exists() {
            return Err(LifecycleError::SourceDirectoryExists(source_directory).into());
        }
        std::fs::create_dir_all(install_location)
            .with_context(|| format!("creating install location {}", install_location.display()))?;

        tracing::info!(app = %key, version, location = %install_location.display(), "installing");
        let mut config = AppConfig {
            version: Some(version.to_string()),
            install_location: Some(install_location.to_path_buf()),
            source_directory: None,
            installed_at: None,
            docker_image_directory: self.settings.docker_image_directory.clone(),
        };

        if let Err(err) = self.fetch(install_location, &source_directory, version).await {
            if source_directory.exists() {
                if let Err(cleanup) = std::fs::remove_dir_all(&source_directory) {
                    tracing::warn!(
                        app = %key,
                        error = %cleanup,
                        "could not remove partial checkout"
                    );
                }
            }
            tracing::warn!(app = %key, error = %format!("{err:#}"), "installation failed");
            return Err(err);
        }

        config.source_directory = Some(source_directory);
        config.installed_at = Some(Utc::now());
        let record = AppRecord {
            config: config.clone(),
            running: false,
        };
        self.ports
            .store
            .save(&key, &record)
            .await
            .context("saving app config")?;

        self.config = config;
        self.state = AppState::Installed;
        tracing::info!(app = %key, "installed");
        self.ports.notifier.app_installed(&self.descriptor, &self.config);
        Ok(())
    }

    /// Remove a checkout left under `install_location` by an installation
    /// that never completed. Returns whether a directory was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the app is installed or the directory cannot be
    /// removed.
    pub fn discard_partial_checkout(&self, install_location: &Path) -> Result<bool> {
        self.require("install", &[AppState::Uninstalled])?;
        let source_directory = install_location.join(&self.descriptor.source.directory);
        if !source_directory.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&source_directory)
            .with_context(|| format!("removing {}", source_directory.display()))?;
        tracing::info!(
            app = %self.descriptor.key,
            path = %source_directory.display(),
            "removed partial checkout"
        );
        Ok(true)
    }

    async fn fetch(
        &self,
        install_location: &Path,
        source_directory: &Path,
        version: &str,
    ) -> Result<()> {
        let source = &self.descriptor.source;
        let sink = self.ports.sink;
        sink.step(&format!("cloning {} {}...", self.descriptor.name, source.tag(version)));
        let clone = CommandSpec::new(format!(
            "git clone --depth 1 --branch {} {} {}",
            shell_quote(&source.tag(version)),
            shell_quote(&source.repository),
            shell_quote(&source.directory),
        ))
        .cwd(install_location)
        .timeout(self.settings.exec_timeout);
        self.ports
            .executor
            .run(&clone)
            .await
            .context("checking out application source")?;

        sink.step("pulling container images...");
        let pull = CommandSpec::new(COMPOSE_PULL)
            .cwd(source_directory)
            .timeout(self.settings.exec_timeout);
        self.ports
            .executor
            .run(&pull)
            .await
            .context("pulling container images")?;
        Ok(())
    }

    /// Ensure every required image is present, then launch the app as a
    /// detached process and signal `app_started`.
    ///
    /// Returns as soon as the process is spawned; readiness is not awaited.
    ///
    /// # Errors
    ///
    /// Returns an error if the app is not installed, an image archive is
    /// missing, an image load fails, or the run command cannot be spawned.
    pub async fn start(&mut self) -> Result<DaemonHandle> {
        self.require("start", &[AppState::Installed, AppState::Running])?;
        let key = self.descriptor.key.clone();
        let source_directory = self.source_directory()?.to_path_buf();

        self.ensure_images().await?;

        let mut cmd = CommandSpec::new(COMPOSE_UP).cwd(&source_directory).daemon();
        if let Some(var) = &self.descriptor.host_env {
            cmd = cmd.env(var.clone(), self.settings.host.clone());
        }
        if let Some(dir) = &self.settings.log_dir {
            cmd = cmd.log_file(dir.join(format!("{key}.log")));
        }
        let handle = self
            .ports
            .executor
            .spawn(&cmd)
            .await
            .context("launching application")?;
        tracing::info!(app = %key, pid = ?handle.pid(), "docker compose up launched");

        self.persist_running(true).await?;
        self.state = AppState::Running;
        self.ports.notifier.app_started(&self.descriptor, &handle);
        Ok(handle)
    }

    /// Restore missing images for this app from `docker_image_directory`.
    ///
    /// # Errors
    ///
    /// As for `image_provisioner::ensure_present`.
    pub async fn ensure_images(&self) -> Result<ProvisionReport> {
        let report = image_provisioner::ensure_present(
            self.ports.executor,
            self.ports.sink,
            &self.descriptor.required_images,
            &self.config.docker_image_directory,
            self.settings.exec_timeout,
        )
        .await;
        if let Err(err) = &report {
            if let Some(missing) = err.downcast_ref::<ProvisionError>() {
                tracing::error!(
                    app = %self.descriptor.key,
                    error = %missing,
                    "image provisioning failed"
                );
            }
        }
        report
    }

    /// Stop the app and wait for the stop command to finish.
    ///
    /// The app is recorded as `Installed` even if the stop command fails;
    /// the failure is still returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the app is not running or the stop command fails.
    pub async fn close(&mut self) -> Result<()> {
        self.require("stop", &[AppState::Running])?;
        let key = self.descriptor.key.clone();
        let source_directory = self.source_directory()?.to_path_buf();

        self.ports.sink.step(&format!("stopping {}...", self.descriptor.name));
        let cmd = CommandSpec::new(COMPOSE_DOWN)
            .cwd(source_directory)
            .timeout(self.settings.exec_timeout);
        let stopped = self.ports.executor.run(&cmd).await;

        self.state = AppState::Installed;
        self.persist_running(false).await?;
        match stopped {
            Ok(_) => {
                tracing::info!(app = %key, "stopped");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(app = %key, error = %format!("{err:#}"), "stop command failed");
                Err(err.context("stopping application"))
            }
        }
    }

    /// Remove the app's images, checkout and persisted record.
    ///
    /// A running app is rejected unless `force` is set, in which case it is
    /// closed first. Image removal is best-effort per image.
    ///
    /// # Errors
    ///
    /// Returns an error if the app is not installed, is running without
    /// `force`, or the record cannot be cleared.
    pub async fn uninstall(&mut self, force: bool) -> Result<()> {
        self.require("uninstall", &[AppState::Installed, AppState::Running])?;
        let key = self.descriptor.key.clone();
        let sink = self.ports.sink;

        if self.state == AppState::Running {
            if !force {
                return Err(LifecycleError::AppRunning(key).into());
            }
            if let Err(err) = self.close().await {
                sink.warn(&format!("stop failed, continuing uninstall: {err:#}"));
            }
        }

        for image in &self.descriptor.required_images {
            let cmd = CommandSpec::new(format!("docker rmi {}", shell_quote(image)))
                .timeout(self.settings.exec_timeout);
            match self.ports.executor.run(&cmd).await {
                Ok(_) => sink.success(&format!("removed image {image}")),
                Err(err) => {
                    tracing::warn!(
                        app = %key,
                        image = %image,
                        error = %format!("{err:#}"),
                        "image removal failed"
                    );
                    sink.warn(&format!("could not remove image {image}: {err}"));
                }
            }
        }

        if let Some(dir) = self.config.source_directory.as_deref().filter(|d| d.exists()) {
            if let Err(err) = std::fs::remove_dir_all(dir) {
                tracing::warn!(app = %key, error = %err, "could not remove source directory");
                sink.warn(&format!("could not remove {}: {err}", dir.display()));
            }
        }

        self.ports
            .store
            .clear(&key)
            .await
            .context("clearing app config")?;
        self.config = AppConfig::empty(self.settings.docker_image_directory.clone());
        self.state = AppState::Uninstalled;
        tracing::info!(app = %key, "uninstalled");
        Ok(())
    }

    async fn persist_running(&self, running: bool) -> Result<()> {
        let record = AppRecord {
            config: self.config.clone(),
            running,
        };
        self.ports
            .store
            .save(&self.descriptor.key, &record)
            .await
            .context("saving app state")
    }
}
