//! Exclusive namespace lock backed by a lock file.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::StoreError;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Held while a namespace may be written. Dropping removes the lock file.
#[derive(Debug)]
pub(crate) struct LockFile {
    path: PathBuf,
}

impl LockFile {
    /// Create the lock file exclusively, polling until `timeout` elapses.
    pub(crate) fn acquire(path: PathBuf, timeout: Duration) -> Result<Self, StoreError> {
        let start = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    // Owner pid, for humans inspecting a stale lock.
                    let _ = writeln!(file, "{}", std::process::id());
                    log::debug!("acquired store lock {}", path.display());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if start.elapsed() >= timeout {
                        return Err(StoreError::LockTimeout { path, timeout });
                    }
                    std::thread::sleep(POLL_INTERVAL.min(timeout));
                }
                Err(source) => return Err(StoreError::Io { path, source }),
            }
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if fs::remove_file(&self.path).is_ok() {
            log::debug!("released store lock {}", self.path.display());
        }
    }
}
