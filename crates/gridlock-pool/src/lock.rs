//! Exclusive filesystem lock guarding the shared pool document.
//!
//! The lock is advisory and process-scoped: acquisition blocks until no other
//! holder exists anywhere on the shared filesystem, and the operating system
//! releases it when the holding file handle closes, including on crash. The
//! content of the lock file is irrelevant; only the path identifies the lock.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use gridlock_core::{ErrorInfo, GridlockError};

/// Handle for a named exclusive lock backed by a filesystem path.
///
/// Re-entrant acquisition by the same holder is undefined; callers must not
/// nest critical sections on the same lock path.
#[derive(Debug, Clone)]
pub struct PoolLock {
    path: PathBuf,
}

impl PoolLock {
    /// Creates a lock handle for the given path. No filesystem access occurs
    /// until [`PoolLock::acquire`] is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the lock file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocks until the exclusive lock is held, then returns an RAII guard.
    ///
    /// The guard releases the lock on drop, so every failure path inside a
    /// critical section still releases.
    pub fn acquire(&self) -> Result<PoolLockGuard, GridlockError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&self.path)
            .map_err(|err| {
                GridlockError::Lock(
                    ErrorInfo::new("lock-open", err.to_string())
                        .with_context("path", self.path.display().to_string()),
                )
            })?;
        file.lock_exclusive().map_err(|err| {
            GridlockError::Lock(
                ErrorInfo::new("lock-acquire", err.to_string())
                    .with_context("path", self.path.display().to_string()),
            )
        })?;
        Ok(PoolLockGuard { file })
    }
}

/// RAII guard for an exclusively-held pool lock.
///
/// The underlying file lock is released when the guard is dropped; the OS
/// also releases it when the file descriptor closes for any reason.
pub struct PoolLockGuard {
    file: File,
}

impl std::fmt::Debug for PoolLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolLockGuard").finish_non_exhaustive()
    }
}

impl Drop for PoolLockGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
