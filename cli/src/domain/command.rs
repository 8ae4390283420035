//! Command execution records: what to run, and what came back.

use std::path::PathBuf;
use std::time::Duration;

/// One external command invocation.
///
/// `line` is a shell command line. Extra environment variables are passed to
/// the process rather than spliced into the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub line: String,
    pub cwd: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
    /// Spawn detached and return immediately.
    pub daemon: bool,
    /// Do not stream output lines to the log sink.
    pub silent: bool,
    /// Kill a synchronous command that runs longer than this.
    pub timeout: Option<Duration>,
    /// Append daemon output to this file instead of piping it.
    pub log_file: Option<PathBuf>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            cwd: None,
            envs: Vec::new(),
            daemon: false,
            silent: false,
            timeout: None,
            log_file: None,
        }
    }

    #[must_use]
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn daemon(mut self) -> Self {
        self.daemon = true;
        self
    }

    #[must_use]
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }
}

/// Outcome of a synchronous command that exited with status 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub command: String,
    pub exit_code: i32,
    /// Combined stdout/stderr lines in arrival order.
    pub output: Vec<String>,
}

impl ExecutionRecord {
    /// Output joined back into text.
    #[must_use]
    pub fn stdout_text(&self) -> String {
        self.output.join("\n")
    }
}

/// Quote `arg` for a POSIX shell command line.
#[must_use]
pub fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '@' | '+' | '=')
        });
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Number of trailing output lines kept for error messages.
pub const ERROR_TAIL_LINES: usize = 20;

/// Last `ERROR_TAIL_LINES` lines of `output`.
#[must_use]
pub fn tail(output: &[String]) -> Vec<String> {
    output[output.len().saturating_sub(ERROR_TAIL_LINES)..].to_vec()
}
