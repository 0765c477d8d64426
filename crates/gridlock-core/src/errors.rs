//! Structured error types shared across gridlock crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`GridlockError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (identifiers, paths, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the gridlock coordinator.
///
/// The variants partition the failure taxonomy of the subsystem: `Exhausted`
/// is an expected terminal condition for grid pools, `Document` and
/// `Experiment` are consistency faults that cannot be retried, and `Strategy`
/// is a configuration error that fails fast at first use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum GridlockError {
    /// Exclusive lock acquisition or release failures.
    #[error("lock error: {0}")]
    Lock(ErrorInfo),
    /// Filesystem failures while reading or writing the shared document.
    #[error("store error: {0}")]
    Store(ErrorInfo),
    /// The shared document exists but cannot be parsed.
    #[error("document error: {0}")]
    Document(ErrorInfo),
    /// An experiment id expected to be present is missing.
    #[error("experiment error: {0}")]
    Experiment(ErrorInfo),
    /// Every experiment in the pool is already assigned.
    #[error("no work available: {0}")]
    Exhausted(ErrorInfo),
    /// Unrecognized or unusable work-selection strategy.
    #[error("strategy error: {0}")]
    Strategy(ErrorInfo),
    /// Metric and parameter reporting failures.
    #[error("report error: {0}")]
    Report(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl GridlockError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            GridlockError::Lock(info)
            | GridlockError::Store(info)
            | GridlockError::Document(info)
            | GridlockError::Experiment(info)
            | GridlockError::Exhausted(info)
            | GridlockError::Strategy(info)
            | GridlockError::Report(info) => info,
        }
    }
}
