use gridlock_core::{ExperimentStatus, GridlockError, SearchSpace};
use gridlock_pool::{Coordinator, PoolOptions, Strategy, WorkPool};
use serde_json::json;
use tempfile::tempdir;

fn lr_batch_space() -> SearchSpace {
    SearchSpace::new()
        .with_parameter("lr", vec![json!(0.1), json!(0.01)])
        .with_parameter("batch", vec![json!(16), json!(32)])
}

fn read_pool(coordinator: &Coordinator) -> WorkPool {
    let _guard = coordinator.store().lock().acquire().unwrap();
    coordinator.store().read().unwrap()
}

#[test]
fn first_claim_materializes_the_cartesian_product() {
    let dir = tempdir().unwrap();
    let coordinator = Coordinator::init(PoolOptions::new(dir.path())).unwrap();
    let claim = coordinator.claim(&lr_batch_space(), Strategy::Grid).unwrap();
    assert_eq!(claim.id.as_raw(), 1);
    assert_eq!(claim.config["lr"], json!(0.1));
    assert_eq!(claim.config["batch"], json!(16));

    let pool = read_pool(&coordinator);
    assert_eq!(pool.experiments.len(), 4);
    let expected = [
        (json!(0.1), json!(16)),
        (json!(0.1), json!(32)),
        (json!(0.01), json!(16)),
        (json!(0.01), json!(32)),
    ];
    for (idx, (lr, batch)) in expected.iter().enumerate() {
        let experiment = &pool.experiments[idx];
        assert_eq!(experiment.id.as_raw(), idx as u64 + 1);
        assert_eq!(&experiment.config["lr"], lr);
        assert_eq!(&experiment.config["batch"], batch);
    }
    assert_eq!(pool.count_with_status(ExperimentStatus::Assigned), 1);
    assert_eq!(pool.count_with_status(ExperimentStatus::Unassigned), 3);
}

#[test]
fn sequential_claims_walk_ids_in_order_until_exhausted() {
    let dir = tempdir().unwrap();
    let space = lr_batch_space();
    for expected_id in 1..=4 {
        let coordinator = Coordinator::init(PoolOptions::new(dir.path())).unwrap();
        let claim = coordinator.claim(&space, Strategy::Grid).unwrap();
        assert_eq!(claim.id.as_raw(), expected_id);
    }
    let latecomer = Coordinator::init(PoolOptions::new(dir.path())).unwrap();
    let err = latecomer.claim(&space, Strategy::Grid).unwrap_err();
    assert!(matches!(err, GridlockError::Exhausted(_)));
    assert_eq!(err.info().code, "pool-exhausted");
}

#[test]
fn unassigned_work_is_preferred_over_preempted() {
    let dir = tempdir().unwrap();
    let space = lr_batch_space();

    let first = Coordinator::init(PoolOptions::new(dir.path())).unwrap();
    let claim = first.claim(&space, Strategy::Grid).unwrap();
    assert_eq!(claim.id.as_raw(), 1);
    first.preempt().unwrap();

    // Fresh work keeps going out while experiment 1 sits preempted.
    for expected_id in 2..=4 {
        let coordinator = Coordinator::init(PoolOptions::new(dir.path())).unwrap();
        let claim = coordinator.claim(&space, Strategy::Grid).unwrap();
        assert_eq!(claim.id.as_raw(), expected_id);
    }

    // Only once no unassigned experiment remains is the preempted one resumed.
    let resumer = Coordinator::init(PoolOptions::new(dir.path())).unwrap();
    let claim = resumer.claim(&space, Strategy::Grid).unwrap();
    assert_eq!(claim.id.as_raw(), 1);

    let err = Coordinator::init(PoolOptions::new(dir.path()))
        .unwrap()
        .claim(&space, Strategy::Grid)
        .unwrap_err();
    assert!(matches!(err, GridlockError::Exhausted(_)));
}

#[test]
fn the_product_is_materialized_exactly_once() {
    let dir = tempdir().unwrap();
    let space = lr_batch_space();
    let first = Coordinator::init(PoolOptions::new(dir.path())).unwrap();
    first.claim(&space, Strategy::Grid).unwrap();

    // A second claimer arriving with the same space must reuse the existing
    // document rather than regenerate experiments.
    let second = Coordinator::init(PoolOptions::new(dir.path())).unwrap();
    second.claim(&space, Strategy::Grid).unwrap();
    let pool = read_pool(&second);
    assert_eq!(pool.experiments.len(), 4);
}

#[test]
fn subdir_initialization_tolerates_existing_directory() {
    let dir = tempdir().unwrap();
    let options = PoolOptions::new(dir.path()).with_subdir("sweep-7");
    let first = Coordinator::init(options.clone()).unwrap();
    let second = Coordinator::init(options).unwrap();
    assert_eq!(first.directory(), second.directory());

    let space = lr_batch_space();
    let a = first.claim(&space, Strategy::Grid).unwrap();
    let b = second.claim(&space, Strategy::Grid).unwrap();
    assert_ne!(a.id, b.id);
}
