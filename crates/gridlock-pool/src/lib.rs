#![deny(missing_docs)]

//! Crash-tolerant experiment coordination over a shared filesystem.
//!
//! Many independent worker processes, possibly on different hosts sharing one
//! filesystem, each claim exactly one hyperparameter configuration from a
//! shared pool, run it, and report metrics. There is no database server and
//! no network protocol: a single YAML document holds the whole pool, and an
//! advisory file lock serializes every read-modify-rewrite cycle. A
//! termination-signal watch converts an in-flight claim back into reusable
//! work before the process dies, so preemption never loses or duplicates an
//! experiment.

/// Per-process coordinator and pool connection options.
pub mod coordinator;
/// Serde schema of the shared pool document.
pub mod document;
/// Blocking exclusive filesystem lock with an RAII guard.
pub mod lock;
/// SIGTERM watch releasing the current claim before exit.
pub mod shutdown;
/// Whole-document state store.
pub mod store;
/// Grid and random work-selection strategies.
pub mod strategy;

pub use coordinator::{Claim, Coordinator, PoolOptions};
pub use document::{Experiment, Report, WorkPool};
pub use lock::{PoolLock, PoolLockGuard};
pub use shutdown::TerminationWatch;
pub use store::{StateStore, DOCUMENT_FILE, LOCK_FILE};
pub use strategy::Strategy;
