//! On-disk schema of the shared work pool document.
//!
//! The document is a single YAML mapping holding pool metadata and the full
//! experiment list. Key names are camelCase so that existing monitoring
//! tooling reading the document keeps working.

use std::collections::BTreeMap;

use chrono::Utc;
use gridlock_core::{ExperimentId, ExperimentStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Returns the current instant as an RFC 3339 UTC string, the timestamp
/// format used everywhere in the document.
pub fn now_stamp() -> String {
    Utc::now().to_rfc3339()
}

/// One reported measurement for an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Caller-supplied epoch identifier; not validated for monotonicity.
    pub epoch: u64,
    /// Metric name to value mapping, persisted verbatim.
    pub metrics: BTreeMap<String, Value>,
    /// Timestamp of the report call.
    pub report_time: String,
}

/// A single claimable unit of work: one point in the search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    /// Unique id, monotonically assigned starting at 1, never reused.
    pub id: ExperimentId,
    /// Current claim state.
    pub status: ExperimentStatus,
    /// Parameter name to chosen value mapping.
    pub config: BTreeMap<String, Value>,
    /// Timestamp of the last status transition.
    pub modification_time: String,
    /// Reports in call order; absent from the document until the first
    /// report.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reports: Vec<Report>,
}

impl Experiment {
    /// Creates an unassigned experiment record.
    pub fn new(id: ExperimentId, config: BTreeMap<String, Value>, now: impl Into<String>) -> Self {
        Self {
            id,
            status: ExperimentStatus::Unassigned,
            config,
            modification_time: now.into(),
            reports: Vec::new(),
        }
    }
}

/// The shared work pool: pool metadata plus the ordered experiment list.
///
/// Experiment order is creation order; identity is carried by the id, not the
/// position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkPool {
    /// Timestamp of pool creation.
    pub creation_time: String,
    /// Timestamp of the last persisted mutation.
    pub modification_time: String,
    /// Experiments in creation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub experiments: Vec<Experiment>,
}

impl WorkPool {
    /// Creates an empty pool stamped with the given creation time.
    pub fn new(now: impl Into<String>) -> Self {
        let now = now.into();
        Self {
            creation_time: now.clone(),
            modification_time: now,
            experiments: Vec::new(),
        }
    }

    /// Looks up an experiment by id.
    pub fn experiment(&self, id: ExperimentId) -> Option<&Experiment> {
        self.experiments.iter().find(|experiment| experiment.id == id)
    }

    /// Looks up an experiment by id for mutation.
    pub fn experiment_mut(&mut self, id: ExperimentId) -> Option<&mut Experiment> {
        self.experiments
            .iter_mut()
            .find(|experiment| experiment.id == id)
    }

    /// Returns the id the next created experiment must receive: 1 for an
    /// empty pool, otherwise one past the largest id ever assigned.
    pub fn next_id(&self) -> ExperimentId {
        let max = self
            .experiments
            .iter()
            .map(|experiment| experiment.id.as_raw())
            .max()
            .unwrap_or(0);
        ExperimentId::from_raw(max + 1)
    }

    /// Counts experiments currently in the given status.
    pub fn count_with_status(&self, status: ExperimentStatus) -> usize {
        self.experiments
            .iter()
            .filter(|experiment| experiment.status == status)
            .count()
    }
}
