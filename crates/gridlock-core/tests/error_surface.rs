use gridlock_core::errors::{ErrorInfo, GridlockError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("id", "1")
        .with_context("path", "/pool/gridlock.yaml")
}

#[test]
fn lock_error_surface() {
    let err = GridlockError::Lock(sample_info("lock-acquire", "flock failed"));
    assert_eq!(err.info().code, "lock-acquire");
    assert!(err.info().context.contains_key("path"));
}

#[test]
fn document_error_surface() {
    let err = GridlockError::Document(sample_info("pool-parse", "invalid yaml"));
    assert_eq!(err.info().code, "pool-parse");
    assert!(err.to_string().contains("document error"));
}

#[test]
fn exhausted_error_surface() {
    let err = GridlockError::Exhausted(sample_info("pool-exhausted", "all experiments assigned"));
    assert_eq!(err.info().code, "pool-exhausted");
    assert!(err.to_string().contains("no work available"));
}

#[test]
fn experiment_error_surface() {
    let err = GridlockError::Experiment(sample_info("experiment-unknown", "id not found"));
    assert_eq!(err.info().code, "experiment-unknown");
    assert!(err.info().context.contains_key("id"));
}

#[test]
fn strategy_error_surface() {
    let err = GridlockError::Strategy(sample_info("strategy-unknown", "no such strategy"));
    assert_eq!(err.info().code, "strategy-unknown");
}

#[test]
fn hint_is_rendered() {
    let err = GridlockError::Store(
        ErrorInfo::new("pool-write", "write failed").with_hint("check mount permissions"),
    );
    assert!(err.to_string().contains("check mount permissions"));
}
