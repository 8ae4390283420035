//! Per-key exclusive lock serializing lifecycle calls across processes.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::descriptor::validate_key;
use crate::domain::error::LifecycleError;

/// Held while one process drives a lifecycle transition for `key`.
///
/// The lock file `<dir>/<key>.lock` is created exclusively, records the
/// holder's pid, and is removed on drop. A lock whose recorded holder is no
/// longer alive is taken over.
#[derive(Debug)]
pub struct KeyLock {
    path: PathBuf,
}

impl KeyLock {
    /// Acquire the lock for `key`, failing fast if a live holder exists.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::LockHeld` if the lock file exists and its
    /// holder is alive or unknown, or an I/O error if it cannot be created.
    pub fn acquire(dir: &Path, key: &str) -> Result<Self> {
        validate_key(key)?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
        let path = dir.join(format!("{key}.lock"));
        match Self::create(&path)? {
            Some(lock) => Ok(lock),
            None => match read_pid(&path) {
                Some(pid) if !process_is_alive(pid) => {
                    tracing::warn!(key, pid, path = %path.display(), "taking over stale lock");
                    std::fs::remove_file(&path)
                        .with_context(|| format!("removing stale lock {}", path.display()))?;
                    Self::create(&path)?.ok_or_else(|| held(key, path.clone()))
                }
                _ => Err(held(key, path)),
            },
        }
    }

    /// Create the lock file, or `None` if it already exists.
    fn create(path: &Path) -> Result<Option<Self>> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("creating lock file {}", path.display()));
            }
        };
        let lock = Self {
            path: path.to_path_buf(),
        };
        writeln!(file, "{}", std::process::id())
            .with_context(|| format!("writing lock file {}", path.display()))?;
        Ok(Some(lock))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn held(key: &str, path: PathBuf) -> anyhow::Error {
    LifecycleError::LockHeld {
        key: key.to_string(),
        path,
    }
    .into()
}

fn read_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(unix)]
fn process_is_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    std::process::Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

#[cfg(not(unix))]
fn process_is_alive(_pid: u32) -> bool {
    true
}

impl Drop for KeyLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "could not remove lock file");
        }
    }
}
