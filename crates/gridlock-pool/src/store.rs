//! Whole-document state store for the shared work pool.
//!
//! Every operation here assumes the pool lock is held by the caller for the
//! full duration of the read-modify-write cycle. The store always rewrites
//! the entire document, so a newly arriving reader never observes a partial
//! update between critical sections. The cost is O(pool size) per operation,
//! which is acceptable because a scheduling decision happens once per
//! experiment lifetime, not per training step.

use std::fs;
use std::path::{Path, PathBuf};

use gridlock_core::{ErrorInfo, GridlockError, SearchSpace};
use tracing::debug;

use crate::document::{now_stamp, WorkPool};
use crate::lock::PoolLock;
use crate::strategy::{materialize_grid, Strategy};

/// File name of the shared pool document inside the pool directory.
pub const DOCUMENT_FILE: &str = "gridlock.yaml";

/// File name of the sibling lock file. Its content is irrelevant; only the
/// path identifies the lock.
pub const LOCK_FILE: &str = "gridlock.yaml.lock";

/// Owns the document and lock paths for one pool directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    directory: PathBuf,
    document_path: PathBuf,
    lock: PoolLock,
}

impl StateStore {
    /// Creates a store rooted at the given pool directory. No filesystem
    /// access occurs until an operation is called.
    pub fn open(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        let document_path = directory.join(DOCUMENT_FILE);
        let lock = PoolLock::new(directory.join(LOCK_FILE));
        Self {
            directory,
            document_path,
            lock,
        }
    }

    /// Returns the pool directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the path of the shared document.
    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    /// Returns the pool lock serializing all document access.
    pub fn lock(&self) -> &PoolLock {
        &self.lock
    }

    /// Returns `true` when the shared document exists on disk.
    pub fn document_exists(&self) -> bool {
        self.document_path.is_file()
    }

    /// Creates the pool directory and, if no document exists yet, the
    /// document itself: pre-populated with the full Cartesian product for the
    /// grid strategy, empty for the random strategy.
    ///
    /// A concurrent process having created the directory first is a benign
    /// race, not an error. Must be called with the pool lock held.
    pub fn ensure_initialized(
        &self,
        strategy: Strategy,
        space: &SearchSpace,
    ) -> Result<(), GridlockError> {
        fs::create_dir_all(&self.directory).map_err(|err| {
            GridlockError::Store(
                ErrorInfo::new("pool-mkdir", err.to_string())
                    .with_context("path", self.directory.display().to_string()),
            )
        })?;
        if self.document_exists() {
            return Ok(());
        }
        debug!(path = %self.document_path.display(), "creating pool document");
        let now = now_stamp();
        let mut pool = WorkPool::new(now.clone());
        if strategy == Strategy::Grid {
            pool.experiments = materialize_grid(space, &now);
        }
        self.write(&mut pool)
    }

    /// Parses the on-disk document into its in-memory representation.
    ///
    /// An unparsable document is a consistency fault surfaced to the caller;
    /// retrying cannot self-heal it.
    pub fn read(&self) -> Result<WorkPool, GridlockError> {
        let contents = fs::read_to_string(&self.document_path).map_err(|err| {
            GridlockError::Store(
                ErrorInfo::new("pool-read", err.to_string())
                    .with_context("path", self.document_path.display().to_string()),
            )
        })?;
        serde_yaml::from_str(&contents).map_err(|err| {
            GridlockError::Document(
                ErrorInfo::new("pool-parse", err.to_string())
                    .with_context("path", self.document_path.display().to_string()),
            )
        })
    }

    /// Refreshes the pool-level modification timestamp and overwrites the
    /// entire document.
    pub fn write(&self, pool: &mut WorkPool) -> Result<(), GridlockError> {
        pool.modification_time = now_stamp();
        let yaml = serde_yaml::to_string(pool).map_err(|err| {
            GridlockError::Store(
                ErrorInfo::new("pool-serialize", err.to_string())
                    .with_context("path", self.document_path.display().to_string()),
            )
        })?;
        fs::write(&self.document_path, yaml).map_err(|err| {
            GridlockError::Store(
                ErrorInfo::new("pool-write", err.to_string())
                    .with_context("path", self.document_path.display().to_string()),
            )
        })
    }
}
