#![deny(missing_docs)]
#![doc = "Core types and errors for the gridlock hyperparameter search coordinator."]

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod errors;
pub mod rng;

pub use errors::{ErrorInfo, GridlockError};
pub use rng::RngHandle;

/// Identifier for an experiment within a work pool.
///
/// Ids are assigned monotonically starting at 1 and are never reused; the id,
/// not the position in the pool document, is the authoritative identity of an
/// experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExperimentId(u64);

impl ExperimentId {
    /// Creates a new identifier from its raw integer representation.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Claim state of an experiment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    /// The experiment has never been claimed.
    Unassigned,
    /// A worker process currently holds the experiment.
    Assigned,
    /// The previous holder was terminated mid-run; the experiment is
    /// resumable.
    Preempted,
}

impl std::fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ExperimentStatus::Unassigned => "unassigned",
            ExperimentStatus::Assigned => "assigned",
            ExperimentStatus::Preempted => "preempted",
        };
        write!(f, "{label}")
    }
}

/// One hyperparameter and its finite set of candidate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParameter {
    /// Parameter name as it appears in experiment configurations.
    pub name: String,
    /// Candidate values in caller-declared order.
    pub values: Vec<Value>,
}

impl SearchParameter {
    /// Creates a parameter descriptor from a name and candidate values.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// An ordered hyperparameter search space.
///
/// Parameter declaration order is significant: the grid strategy materializes
/// the Cartesian product in exactly this order, so the order determines which
/// configuration receives which experiment id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchSpace {
    /// Parameter descriptors in declaration order.
    pub parameters: Vec<SearchParameter>,
}

impl SearchSpace {
    /// Creates an empty search space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter to the space, preserving declaration order.
    pub fn with_parameter(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
        self.parameters.push(SearchParameter::new(name, values));
        self
    }

    /// Returns the number of declared parameters.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Returns `true` when no parameters are declared.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Returns the size of the full Cartesian product of candidate values.
    pub fn combination_count(&self) -> usize {
        self.parameters
            .iter()
            .map(|parameter| parameter.values.len())
            .product()
    }
}
