//! Tests for error types

use trueno_seq::error::NotComputableReason;
use trueno_seq::Error;

#[test]
fn test_domain_error() {
    let error = Error::Domain("q = 1.2".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Domain error"));
    assert!(error_str.contains("q = 1.2"));
    assert!(error.is_domain());
}

#[test]
fn test_not_computable_error() {
    let error = Error::NotComputable {
        look: 4,
        reason: NotComputableReason::ZeroVariance,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("look 4"));
    assert!(error_str.contains("standard error is zero"));
    assert!(!error.is_domain());
}

#[test]
fn test_bounded_search_error() {
    let error = Error::BoundedSearchExceeded {
        iterations: 100,
        last_uplift: 1.0,
        last_p_value: 0.2,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("100 iterations"));
    assert!(error_str.contains("1.0000"));
}

#[test]
fn test_invalid_input_error() {
    let error = Error::InvalidInput("Column not found: conv".to_string());
    assert_eq!(format!("{error}"), "Invalid input: Column not found: conv");
}

#[test]
fn test_serialization_error_from() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: Error = json_err.into();
    assert!(format!("{error}").contains("Serialization error"));
}

#[test]
fn test_arrow_error_from() {
    let arrow_err = arrow::error::ArrowError::SchemaError("bad schema".to_string());
    let error: Error = arrow_err.into();
    assert!(format!("{error}").contains("Arrow error"));
}

#[test]
fn test_reason_display() {
    assert_eq!(
        NotComputableReason::EmptyCell.to_string(),
        "a cell has zero sample size"
    );
}
