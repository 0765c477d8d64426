use gridlock_core::{ExperimentId, ExperimentStatus, SearchSpace};
use serde_json::json;

#[test]
fn status_serializes_lowercase() {
    assert_eq!(
        serde_yaml::to_string(&ExperimentStatus::Unassigned).unwrap().trim(),
        "unassigned"
    );
    assert_eq!(
        serde_yaml::to_string(&ExperimentStatus::Preempted).unwrap().trim(),
        "preempted"
    );
    let status: ExperimentStatus = serde_yaml::from_str("assigned").unwrap();
    assert_eq!(status, ExperimentStatus::Assigned);
}

#[test]
fn experiment_id_serializes_as_integer() {
    let id = ExperimentId::from_raw(7);
    assert_eq!(serde_yaml::to_string(&id).unwrap().trim(), "7");
    let back: ExperimentId = serde_yaml::from_str("7").unwrap();
    assert_eq!(back, id);
}

#[test]
fn search_space_roundtrip_preserves_order() {
    let space = SearchSpace::new()
        .with_parameter("lr", vec![json!(0.1), json!(0.01)])
        .with_parameter("batch", vec![json!(16), json!(32)]);
    let yaml = serde_yaml::to_string(&space).unwrap();
    let back: SearchSpace = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back, space);
    assert_eq!(back.parameters[0].name, "lr");
    assert_eq!(back.parameters[1].name, "batch");
    assert_eq!(back.combination_count(), 4);
}

#[test]
fn empty_space_has_single_combination() {
    // The empty product contains exactly the empty configuration.
    assert_eq!(SearchSpace::new().combination_count(), 1);
}
