//! Configuration tests

use trueno_seq::config::{CriticalScale, MdeConfig, SequentialConfig};
use trueno_seq::Error;

#[test]
fn test_json_defaults() {
    let config = SequentialConfig::from_json(r#"{"target_n": 1000}"#).unwrap();
    assert_eq!(config.target_n(), 1000);
    assert_eq!(config.look_cap(), None);
    assert_eq!(config.critical_scale(), CriticalScale::TwoSided);
    assert!((config.max_information() - 1.0).abs() < f64::EPSILON);
    assert!((config.budget().beta() - 0.2).abs() < f64::EPSILON);
}

#[test]
fn test_json_round_trip() {
    let config = SequentialConfig::builder(642)
        .alpha(0.01)
        .look_cap(7)
        .critical_scale(CriticalScale::OneSided)
        .build()
        .unwrap();
    let json = config.to_json().unwrap();
    assert!(json.contains("one_sided"));
    assert_eq!(SequentialConfig::from_json(&json).unwrap(), config);
}

#[test]
fn test_json_is_validated() {
    let err = SequentialConfig::from_json(r#"{"target_n": 10, "budget": {"alpha": 1.5, "beta": 0.2}}"#)
        .unwrap_err();
    assert!(err.is_domain());
    assert!(SequentialConfig::from_json(r#"{"target_n": 0}"#).is_err());
    assert!(SequentialConfig::from_json(r#"{"target_n": 10, "look_cap": 0}"#).is_err());
}

#[test]
fn test_malformed_json() {
    assert!(matches!(
        SequentialConfig::from_json("{target_n:"),
        Err(Error::Serialization(_))
    ));
}

#[test]
fn test_builder_validation() {
    assert!(SequentialConfig::builder(10).beta(0.0).build().is_err());
    assert!(SequentialConfig::builder(10).max_information(-1.0).build().is_err());
    assert!(SequentialConfig::builder(10).max_information(f64::NAN).build().is_err());
}

#[test]
fn test_mde_uplift_schedule() {
    let config = MdeConfig::default();
    assert!((config.uplift_at(0) - 0.01).abs() < 1e-12);
    assert!((config.uplift_at(4) - 0.05).abs() < 1e-12);
    assert!(config.validate().is_ok());
    assert!(config.with_start_uplift(-0.1).validate().is_err());
}
