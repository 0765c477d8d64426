//! The per-process coordinator owning a pool connection and the current
//! claim.
//!
//! One coordinator is constructed per worker process and passed by reference
//! to the claim/report/preempt call sites. All cross-process synchronization
//! happens through the pool lock: the whole claim operation is one lock-held
//! critical section, so two processes can never be assigned the same
//! experiment.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use gridlock_core::{
    ErrorInfo, ExperimentId, ExperimentStatus, GridlockError, RngHandle, SearchSpace,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::document::{now_stamp, Report};
use crate::store::StateStore;
use crate::strategy::{self, Strategy};

/// Location and seeding options for a pool connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolOptions {
    /// Shared root directory, most commonly an NFS mount. Must exist.
    pub root: PathBuf,
    /// Optional sub-directory created under `root`; the first process to
    /// create it wins and all others treat "already exists" as success.
    #[serde(default)]
    pub subdir: Option<String>,
    /// Optional fixed seed for the randomized strategy. Defaults to
    /// operating-system entropy so independent workers draw independently.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl PoolOptions {
    /// Creates options for the given shared root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            subdir: None,
            seed: None,
        }
    }

    /// Sets the sub-directory name created under the root.
    pub fn with_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.subdir = Some(subdir.into());
        self
    }

    /// Fixes the sampling seed for reproducible randomized draws.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns the effective pool directory.
    pub fn directory(&self) -> PathBuf {
        match &self.subdir {
            Some(subdir) => self.root.join(subdir),
            None => self.root.clone(),
        }
    }
}

/// The configuration handed to a successful claimer.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    /// Id of the claimed experiment, retained for the remainder of the run.
    pub id: ExperimentId,
    /// Parameter name to chosen value mapping for this run.
    pub config: BTreeMap<String, Value>,
}

/// Per-process coordinator for one shared work pool.
///
/// The coordinator is `Send + Sync` so it can be shared with a termination
/// watcher thread behind an `Arc`. A process holds at most one claimed
/// experiment at a time; a second `claim` replaces the held id.
#[derive(Debug)]
pub struct Coordinator {
    store: StateStore,
    current: Mutex<Option<ExperimentId>>,
    rng: Mutex<RngHandle>,
}

impl Coordinator {
    /// Establishes the pool connection.
    ///
    /// When a sub-directory is configured, it is created here; a concurrent
    /// process having created it first is success, not failure. The shared
    /// root itself must already exist.
    pub fn init(options: PoolOptions) -> Result<Self, GridlockError> {
        let directory = options.directory();
        if options.subdir.is_some() {
            match fs::create_dir(&directory) {
                Ok(()) => {
                    debug!(path = %directory.display(), "created pool directory");
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
                Err(err) => {
                    return Err(GridlockError::Store(
                        ErrorInfo::new("pool-mkdir", err.to_string())
                            .with_context("path", directory.display().to_string()),
                    ));
                }
            }
        }
        let rng = match options.seed {
            Some(seed) => RngHandle::from_seed(seed),
            None => RngHandle::from_entropy(),
        };
        Ok(Self {
            store: StateStore::open(directory),
            current: Mutex::new(None),
            rng: Mutex::new(rng),
        })
    }

    /// Returns the underlying state store.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Returns the pool directory.
    pub fn directory(&self) -> &Path {
        self.store.directory()
    }

    /// Returns the id currently claimed by this process, if any.
    pub fn current_claim(&self) -> Option<ExperimentId> {
        *self.current.lock()
    }

    /// Atomically selects the next experiment, marks it assigned, persists
    /// the pool, and returns its configuration.
    ///
    /// Creates the pool document on first-ever use. Fails with the distinct
    /// no-work-available error when a grid pool has every experiment
    /// assigned; the randomized strategy always manufactures new work.
    pub fn claim(&self, space: &SearchSpace, strategy: Strategy) -> Result<Claim, GridlockError> {
        let guard = self.store.lock().acquire()?;
        self.store.ensure_initialized(strategy, space)?;
        let mut pool = self.store.read()?;
        let id = match strategy {
            Strategy::Grid => strategy::select_grid(&pool)?,
            Strategy::Random => {
                let mut rng = self.rng.lock();
                strategy::select_random(&mut pool, space, &mut rng, &now_stamp())?
            }
        };
        let now = now_stamp();
        let (config, prior) = {
            let experiment = pool.experiment_mut(id).ok_or_else(|| {
                GridlockError::Experiment(
                    ErrorInfo::new("experiment-missing", "selected experiment vanished")
                        .with_context("id", id.to_string()),
                )
            })?;
            let prior = experiment.status;
            experiment.status = ExperimentStatus::Assigned;
            experiment.modification_time = now;
            (experiment.config.clone(), prior)
        };
        self.store.write(&mut pool)?;
        drop(guard);
        *self.current.lock() = Some(id);
        match (prior, strategy) {
            (ExperimentStatus::Preempted, _) => {
                info!(id = %id, config = ?config, "resuming preempted experiment");
            }
            (_, Strategy::Grid) => {
                info!(id = %id, config = ?config, "picked grid experiment");
            }
            (_, Strategy::Random) => {
                info!(id = %id, config = ?config, "randomized new experiment");
            }
        }
        Ok(Claim { id, config })
    }

    /// Durably appends a report to the experiment this process currently
    /// holds. Fire-and-forget from the caller's perspective, but persisted
    /// before the call returns.
    pub fn report(
        &self,
        epoch: u64,
        metrics: BTreeMap<String, Value>,
    ) -> Result<(), GridlockError> {
        let id = match *self.current.lock() {
            Some(id) => id,
            None => {
                return Err(GridlockError::Experiment(ErrorInfo::new(
                    "claim-missing",
                    "no experiment is currently claimed by this process",
                )));
            }
        };
        let _guard = self.store.lock().acquire()?;
        let mut pool = self.store.read()?;
        let experiment = pool.experiment_mut(id).ok_or_else(|| {
            GridlockError::Experiment(
                ErrorInfo::new("experiment-unknown", "claimed experiment is not in the pool")
                    .with_context("id", id.to_string()),
            )
        })?;
        experiment.reports.push(Report {
            epoch,
            metrics,
            report_time: now_stamp(),
        });
        self.store.write(&mut pool)?;
        debug!(id = %id, epoch, "recorded report");
        Ok(())
    }

    /// Converts the currently held claim back into reusable work.
    ///
    /// Returns the released id, or `None` when no claim is held. This is the
    /// explicit shutdown path; the termination watch calls it on SIGTERM,
    /// and embeddings without signal delivery are expected to call it before
    /// exit. The held id is cleared even if persisting the transition fails,
    /// since no corrective action is possible during teardown.
    pub fn preempt(&self) -> Result<Option<ExperimentId>, GridlockError> {
        let id = match self.current.lock().take() {
            Some(id) => id,
            None => return Ok(None),
        };
        warn!(id = %id, "marking claimed experiment preempted");
        let _guard = self.store.lock().acquire()?;
        let mut pool = self.store.read()?;
        let experiment = pool.experiment_mut(id).ok_or_else(|| {
            GridlockError::Experiment(
                ErrorInfo::new("experiment-unknown", "claimed experiment is not in the pool")
                    .with_context("id", id.to_string()),
            )
        })?;
        experiment.status = ExperimentStatus::Preempted;
        experiment.modification_time = now_stamp();
        self.store.write(&mut pool)?;
        Ok(Some(id))
    }
}
