//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::PathBuf;

use anyhow::Result;
use tokio::task::JoinHandle;

use crate::domain::{
    AppConfig, AppHubConfig, AppRecord, CommandSpec, ExecutionRecord, PluginDescriptor,
};

// ── Log Sink Port ─────────────────────────────────────────────────────────────

/// Receives command output and progress events.
///
/// `Send + Sync` because daemon processes stream into the sink from a
/// background task for as long as they run.
pub trait LogSink: Send + Sync {
    /// One line of command output, delivered as it is produced.
    fn line(&self, line: &str);
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Command Executor Port ─────────────────────────────────────────────────────

/// A detached background process started by `CommandExecutor::execute`.
///
/// Nothing supervises the process. The handle keeps the pid and, when the
/// executor streams output itself, the task that does so; `wait` resolves to
/// the exit code once the process ends.
#[derive(Debug)]
pub struct DaemonHandle {
    command: String,
    pid: Option<u32>,
    task: Option<JoinHandle<Option<i32>>>,
}

impl DaemonHandle {
    #[must_use]
    pub fn new(
        command: impl Into<String>,
        pid: Option<u32>,
        task: Option<JoinHandle<Option<i32>>>,
    ) -> Self {
        Self {
            command: command.into(),
            pid,
            task,
        }
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// OS process id, if the process was still alive when spawned.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the process is known to have exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_some_and(JoinHandle::is_finished)
    }

    /// Wait for the process to exit and return its exit code.
    ///
    /// Returns `None` when the handle carries no task or the process was
    /// killed by a signal.
    pub async fn wait(self) -> Option<i32> {
        match self.task {
            Some(task) => task.await.ok().flatten(),
            None => None,
        }
    }
}

/// Result of `CommandExecutor::execute`.
#[derive(Debug)]
pub enum Execution {
    /// A synchronous command ran to completion with exit code 0.
    Completed(ExecutionRecord),
    /// A daemon command was spawned and left running.
    Detached(DaemonHandle),
}

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor {
    /// Run `cmd` in its working directory.
    ///
    /// Synchronous commands block until exit and stream output to the log
    /// sink line by line; daemon commands return as soon as they are
    /// spawned.
    ///
    /// # Errors
    ///
    /// `ExecError::DirectoryNotFound` if the working directory is missing
    /// (nothing is spawned), `ExecError::CommandFailed` on non-zero exit,
    /// `ExecError::TimedOut` if a synchronous command exceeds its timeout.
    async fn execute(&self, cmd: &CommandSpec) -> Result<Execution>;

    /// Run a synchronous command and return its record.
    ///
    /// # Errors
    ///
    /// As for `execute`; also fails if `cmd` is a daemon command.
    async fn run(&self, cmd: &CommandSpec) -> Result<ExecutionRecord> {
        anyhow::ensure!(!cmd.daemon, "`{}` is a daemon command", cmd.line);
        match self.execute(cmd).await? {
            Execution::Completed(record) => Ok(record),
            Execution::Detached(_) => anyhow::bail!("`{}` unexpectedly detached", cmd.line),
        }
    }

    /// Spawn a daemon command and return its handle.
    ///
    /// # Errors
    ///
    /// As for `execute`.
    async fn spawn(&self, cmd: &CommandSpec) -> Result<DaemonHandle> {
        let mut cmd = cmd.clone();
        cmd.daemon = true;
        match self.execute(&cmd).await? {
            Execution::Detached(handle) => Ok(handle),
            Execution::Completed(_) => anyhow::bail!("`{}` did not detach", cmd.line),
        }
    }
}

// ── State Ports ───────────────────────────────────────────────────────────────

/// Abstracts per-app record persistence, namespaced by app key.
#[allow(async_fn_in_trait)]
pub trait AppConfigStore {
    /// Load the record for `key`, returning `None` if the app is not installed.
    async fn load(&self, key: &str) -> Result<Option<AppRecord>>;
    /// Persist the record for `key`.
    async fn save(&self, key: &str, record: &AppRecord) -> Result<()>;
    /// Remove any record for `key`.
    async fn clear(&self, key: &str) -> Result<()>;
}

/// Abstracts global configuration persistence.
pub trait ConfigStore {
    /// Load the configuration, or defaults if none is stored.
    fn load(&self) -> Result<AppHubConfig>;
    /// Persist the configuration.
    fn save(&self, config: &AppHubConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}

/// Supplies plugin descriptors in addition to the built-in ones.
pub trait DescriptorSource {
    /// Load every descriptor this source knows about.
    fn load_descriptors(&self) -> Result<Vec<PluginDescriptor>>;
}

// ── Notification Port ─────────────────────────────────────────────────────────

/// One-way lifecycle signals to the hosting system.
///
/// A missing call is meaningful: the transition did not complete.
pub trait LifecycleNotifier {
    /// The app reached `Installed` and is ready to start.
    fn app_installed(&self, descriptor: &PluginDescriptor, config: &AppConfig);
    /// The app's run command was launched.
    fn app_started(&self, descriptor: &PluginDescriptor, handle: &DaemonHandle);
}
