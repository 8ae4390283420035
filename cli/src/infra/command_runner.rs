//! Infrastructure implementation of the `CommandExecutor` port.
//!
//! `TokioCommandExecutor` runs shell command lines with tokio, streaming each
//! output line to the log sink as it arrives. Synchronous commands are killed
//! when their timeout fires; daemon commands are spawned into their own
//! process group and left running.

use std::fs::OpenOptions;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

use crate::application::ports::{CommandExecutor, DaemonHandle, Execution, LogSink};
use crate::domain::command::{CommandSpec, ExecutionRecord, tail};
use crate::domain::error::ExecError;

/// Shell used to interpret command lines.
const SHELL: &str = "sh";

/// Production `CommandExecutor`.
pub struct TokioCommandExecutor {
    sink: Arc<dyn LogSink>,
}

impl TokioCommandExecutor {
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    fn command(cmd: &CommandSpec) -> Command {
        let mut command = Command::new(SHELL);
        command.arg("-c").arg(&cmd.line).stdin(Stdio::null());
        if let Some(dir) = &cmd.cwd {
            command.current_dir(dir);
        }
        command.envs(cmd.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        command
    }

    async fn run_foreground(&self, cmd: &CommandSpec) -> Result<ExecutionRecord> {
        let mut command = Self::command(cmd);
        #[cfg(unix)]
        command.process_group(0);
        let mut child = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", cmd.line))?;
        let mut group = GroupGuard(child.id());

        let (tx, mut rx) = mpsc::unbounded_channel();
        forward_lines(child.stdout.take(), tx.clone());
        forward_lines(child.stderr.take(), tx);

        let sink = (!cmd.silent).then_some(&self.sink);
        let completed = async {
            let mut output = Vec::new();
            while let Some(line) = rx.recv().await {
                if let Some(sink) = sink {
                    sink.line(&line);
                }
                output.push(line);
            }
            let status = child.wait().await;
            (status, output)
        };

        let outcome = match cmd.timeout {
            Some(limit) => tokio::time::timeout(limit, completed).await.ok(),
            None => Some(completed.await),
        };
        let Some((status, output)) = outcome else {
            group.kill();
            if let Err(e) = child.kill().await {
                tracing::debug!(command = %cmd.line, error = %e, "kill after timeout failed");
            }
            return Err(ExecError::TimedOut {
                command: cmd.line.clone(),
                timeout: cmd.timeout.unwrap_or_default(),
            }
            .into());
        };
        group.disarm();

        let status = status.with_context(|| format!("waiting for `{}`", cmd.line))?;
        match status.code() {
            Some(0) => Ok(ExecutionRecord {
                command: cmd.line.clone(),
                exit_code: 0,
                output,
            }),
            Some(exit_code) => Err(ExecError::CommandFailed {
                command: cmd.line.clone(),
                exit_code,
                tail: tail(&output),
            }
            .into()),
            None => Err(ExecError::Terminated {
                command: cmd.line.clone(),
            }
            .into()),
        }
    }

    fn spawn_detached(&self, cmd: &CommandSpec) -> Result<DaemonHandle> {
        let mut command = Self::command(cmd);
        command.kill_on_drop(false);
        #[cfg(unix)]
        command.process_group(0);

        let piped = match &cmd.log_file {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating log directory {}", parent.display()))?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                let err = file
                    .try_clone()
                    .with_context(|| format!("duplicating log file {}", path.display()))?;
                command.stdout(Stdio::from(file)).stderr(Stdio::from(err));
                false
            }
            None => {
                command.stdout(Stdio::piped()).stderr(Stdio::piped());
                true
            }
        };

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", cmd.line))?;
        let pid = child.id();

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        if piped {
            forward_lines(child.stdout.take(), tx.clone());
            forward_lines(child.stderr.take(), tx);
        } else {
            drop(tx);
        }
        let sink = (!cmd.silent).then(|| Arc::clone(&self.sink));
        let task: JoinHandle<Option<i32>> = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if let Some(sink) = &sink {
                    sink.line(&line);
                }
            }
            child.wait().await.ok().and_then(|s| s.code())
        });

        Ok(DaemonHandle::new(cmd.line.clone(), pid, Some(task)))
    }
}

/// Kills the process group of a synchronous command unless disarmed.
///
/// The group leader is the `sh` child, which is not yet reaped while the
/// guard is armed, so its pid still names the group.
struct GroupGuard(Option<u32>);

impl GroupGuard {
    fn disarm(&mut self) {
        self.0 = None;
    }

    fn kill(&mut self) {
        let Some(pgid) = self.0.take() else {
            return;
        };
        #[cfg(unix)]
        {
            let killed = std::process::Command::new("kill")
                .args(["-KILL", "--", &format!("-{pgid}")])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
            if let Err(e) = killed {
                tracing::debug!(pgid, error = %e, "could not signal process group");
            }
        }
        #[cfg(not(unix))]
        let _ = pgid;
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Forward each line of `reader` into `tx` until EOF.
fn forward_lines<R>(reader: Option<R>, tx: UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(reader) = reader else {
        return;
    };
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
}

impl CommandExecutor for TokioCommandExecutor {
    async fn execute(&self, cmd: &CommandSpec) -> Result<Execution> {
        if let Some(dir) = &cmd.cwd {
            if !dir.is_dir() {
                return Err(ExecError::DirectoryNotFound(dir.clone()).into());
            }
        }
        tracing::debug!(command = %cmd.line, cwd = ?cmd.cwd, daemon = cmd.daemon, "executing");
        if cmd.daemon {
            self.spawn_detached(cmd).map(Execution::Detached)
        } else {
            self.run_foreground(cmd).await.map(Execution::Completed)
        }
    }
}
