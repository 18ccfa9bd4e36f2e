//! Boundary curve tests
//!
//! Toyota Way: Jidoka (the sequential boundary must collapse to the
//! fixed-sample test at full information)

use trueno_seq::boundary::{
    boundary_curves, obf_boundaries, obf_boundary, spent_probability, BoundaryKind,
    BoundaryStatistic, InformationGrid,
};
use trueno_seq::config::{CriticalScale, ErrorBudget};
use trueno_seq::distribution::normal_ppf;

#[test]
fn test_full_information_is_fixed_sample_critical_value() {
    for alpha in [0.01, 0.05, 0.1] {
        let bound = obf_boundary(1.0, alpha, CriticalScale::TwoSided).unwrap();
        let fixed = normal_ppf(1.0 - alpha / 2.0).unwrap();
        assert!((bound - fixed).abs() < 1e-9, "alpha = {alpha}");
    }
}

#[test]
fn test_boundary_grows_without_limit_as_q_shrinks() {
    let qs = [1.0, 0.5, 0.2, 0.1, 0.05];
    let values = obf_boundaries(&qs, 0.05, CriticalScale::TwoSided).unwrap();
    for pair in values.windows(2) {
        assert!(pair[1] > pair[0]);
    }
    assert!(values[4] > 8.0);
    assert!(obf_boundary(1e-5, 0.05, CriticalScale::TwoSided)
        .unwrap()
        .is_infinite());
}

#[test]
fn test_spent_probability_increases() {
    let early = spent_probability(0.25, 0.05).unwrap();
    let late = spent_probability(0.75, 0.05).unwrap();
    assert!(early < late);
    assert!(late < 0.05);
}

#[test]
fn test_grid_evaluation_matches_pointwise() {
    let grid = InformationGrid::default();
    let batch = obf_boundaries(grid.points(), 0.05, CriticalScale::TwoSided).unwrap();
    for (&q, &value) in grid.points().iter().zip(&batch) {
        let single = obf_boundary(q, 0.05, CriticalScale::TwoSided).unwrap();
        assert!((single - value).abs() < f64::EPSILON);
    }
}

#[test]
fn test_invalid_grid_point_fails_whole_batch() {
    assert!(obf_boundaries(&[0.5, 1.5], 0.05, CriticalScale::TwoSided)
        .unwrap_err()
        .is_domain());
}

#[test]
fn test_curves_on_t_scale() {
    let grid = InformationGrid::linspace(0.3, 1.0, 8).unwrap();
    let budget = ErrorBudget::default();
    let z = boundary_curves(&grid, budget, BoundaryStatistic::Z, CriticalScale::TwoSided).unwrap();
    let t = boundary_curves(
        &grid,
        budget,
        BoundaryStatistic::T { df: 30.0 },
        CriticalScale::TwoSided,
    )
    .unwrap();
    for (tz, tt) in z.efficacy_upper.values().iter().zip(t.efficacy_upper.values()) {
        assert!(tt > *tz);
    }
    assert_eq!(t.efficacy_lower.kind(), BoundaryKind::EfficacyLower);
    assert!((t.futility.budget() - 0.2).abs() < f64::EPSILON);
}

#[test]
fn test_curves_serialize() {
    let grid = InformationGrid::from_points(vec![0.5, 1.0]).unwrap();
    let curves = boundary_curves(
        &grid,
        ErrorBudget::default(),
        BoundaryStatistic::Z,
        CriticalScale::TwoSided,
    )
    .unwrap();
    let json = serde_json::to_string(&curves).unwrap();
    assert!(json.contains("efficacy_upper"));
    assert!(json.contains("\"scale\":\"z\""));
}
