//! Work-selection strategies deciding which experiment a claim receives.

use std::collections::BTreeMap;
use std::str::FromStr;

use gridlock_core::{
    ErrorInfo, ExperimentId, ExperimentStatus, GridlockError, RngHandle, SearchSpace,
};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{Experiment, WorkPool};

/// Supported work-selection strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Pre-materializes the full Cartesian product of parameter choices at
    /// pool creation and hands experiments out in id order.
    Grid,
    /// Samples a fresh configuration on demand, preferring to resume
    /// preempted work. Never runs out of experiments.
    Random,
}

impl FromStr for Strategy {
    type Err = GridlockError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "grid" | "grid-search" => Ok(Strategy::Grid),
            "random" | "random-search" => Ok(Strategy::Random),
            other => Err(GridlockError::Strategy(
                ErrorInfo::new("strategy-unknown", "unrecognized work-selection strategy")
                    .with_context("value", other)
                    .with_hint("expected one of: grid, random"),
            )),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Grid => write!(f, "grid"),
            Strategy::Random => write!(f, "random"),
        }
    }
}

/// Materializes one unassigned experiment per point of the Cartesian product,
/// ids assigned in product-iteration order starting at 1.
///
/// Parameters expand in declaration order: the last declared parameter varies
/// fastest. Happens exactly once, at first-ever pool creation.
pub(crate) fn materialize_grid(space: &SearchSpace, now: &str) -> Vec<Experiment> {
    let mut configs = Vec::new();
    expand(space, 0, BTreeMap::new(), &mut configs);
    configs
        .into_iter()
        .enumerate()
        .map(|(idx, config)| Experiment::new(ExperimentId::from_raw(idx as u64 + 1), config, now))
        .collect()
}

fn expand(
    space: &SearchSpace,
    idx: usize,
    current: BTreeMap<String, Value>,
    outputs: &mut Vec<BTreeMap<String, Value>>,
) {
    if idx == space.parameters.len() {
        outputs.push(current);
        return;
    }
    let parameter = &space.parameters[idx];
    for value in &parameter.values {
        let mut next = current.clone();
        next.insert(parameter.name.clone(), value.clone());
        expand(space, idx + 1, next, outputs);
    }
}

/// Grid selection: the first unassigned experiment in id order, else the
/// first preempted one (resumption only when no fresh work remains), else a
/// no-work-available error.
pub(crate) fn select_grid(pool: &WorkPool) -> Result<ExperimentId, GridlockError> {
    if let Some(experiment) = pool
        .experiments
        .iter()
        .find(|experiment| experiment.status == ExperimentStatus::Unassigned)
    {
        return Ok(experiment.id);
    }
    if let Some(experiment) = pool
        .experiments
        .iter()
        .find(|experiment| experiment.status == ExperimentStatus::Preempted)
    {
        return Ok(experiment.id);
    }
    Err(GridlockError::Exhausted(
        ErrorInfo::new("pool-exhausted", "every experiment is already assigned")
            .with_context("experiments", pool.experiments.len().to_string()),
    ))
}

/// Random selection: resume the lowest-id preempted experiment if any exists;
/// otherwise append a new experiment with one uniformly drawn candidate per
/// parameter. Cannot exhaust.
pub(crate) fn select_random(
    pool: &mut WorkPool,
    space: &SearchSpace,
    rng: &mut RngHandle,
    now: &str,
) -> Result<ExperimentId, GridlockError> {
    if let Some(experiment) = pool
        .experiments
        .iter()
        .find(|experiment| experiment.status == ExperimentStatus::Preempted)
    {
        return Ok(experiment.id);
    }
    let mut config = BTreeMap::new();
    for parameter in &space.parameters {
        let value = parameter.values.choose(rng).ok_or_else(|| {
            GridlockError::Strategy(
                ErrorInfo::new("parameter-empty", "parameter has no candidate values")
                    .with_context("parameter", parameter.name.clone()),
            )
        })?;
        config.insert(parameter.name.clone(), value.clone());
    }
    let id = pool.next_id();
    pool.experiments.push(Experiment::new(id, config, now));
    Ok(id)
}
