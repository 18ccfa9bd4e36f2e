//! Property-based tests for trueno-seq
//!
//! Following ruchy/trueno/aprender pattern:
//! - Test mathematical invariants of the boundaries and the decision rule
//! - Run with ProptestConfig::with_cases(100)
//! - Must complete in <30 seconds for pre-commit hook

use proptest::prelude::*;
use trueno_seq::boundary::{obf_boundary, obf_boundary_t};
use trueno_seq::cell::ProportionAggregate;
use trueno_seq::config::{CriticalScale, ErrorBudget};
use trueno_seq::evaluator::{BoundaryEvaluator, Decision};
use trueno_seq::statistic::{ProportionStatistic, RunningStatistic};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Error budget in the range used by real experiments
fn arb_rate() -> impl Strategy<Value = f64> {
    0.01f64..0.4
}

/// Two information fractions with a visible gap, `q1 < q2`
fn arb_ordered_fractions() -> impl Strategy<Value = (f64, f64)> {
    (0.05f64..0.95, 0.01f64..0.5).prop_map(|(q1, gap)| (q1, (q1 + gap).min(1.0)))
}

/// Information fraction spread log-uniformly over `[1e-6, 1)`
fn arb_any_fraction() -> impl Strategy<Value = f64> {
    (-6.0f64..0.0).prop_map(|exponent| 10f64.powf(exponent))
}

/// Degrees of freedom from a handful of observations up to large cells
fn arb_df() -> impl Strategy<Value = f64> {
    prop_oneof![Just(3.0), 3.0f64..30.0, 30.0f64..1_000.0, Just(998.0)]
}

/// Cumulative proportion aggregate with a non-degenerate rate
fn arb_cell() -> impl Strategy<Value = (u64, u64)> {
    (50u64..5_000).prop_flat_map(|n| (Just(n), 1..n))
}

// ============================================================================
// Boundary properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: boundary strictly decreases as information accrues
    #[test]
    fn prop_boundary_decreasing((q1, q2) in arb_ordered_fractions(), b in arb_rate()) {
        let early = obf_boundary(q1, b, CriticalScale::TwoSided).unwrap();
        let late = obf_boundary(q2, b, CriticalScale::TwoSided).unwrap();
        prop_assert!(early > late, "bound({q1}) = {early} <= bound({q2}) = {late}");
    }

    /// Property: a smaller budget never gives a lower boundary
    #[test]
    fn prop_boundary_monotone_in_budget(q in 0.05f64..=1.0, b in 0.02f64..0.3) {
        let strict = obf_boundary(q, b / 2.0, CriticalScale::TwoSided).unwrap();
        let loose = obf_boundary(q, b, CriticalScale::TwoSided).unwrap();
        prop_assert!(strict > loose);
    }

    /// Property: the t boundary is never tighter than the z boundary
    #[test]
    fn prop_t_boundary_wider(q in 1e-4f64..=1.0, b in arb_rate(), df in arb_df()) {
        let z = obf_boundary(q, b, CriticalScale::TwoSided).unwrap();
        let t = obf_boundary_t(q, b, df, CriticalScale::TwoSided).unwrap();
        prop_assert!(t >= z, "t = {t} < z = {z} for df = {df}");
    }

    /// Property: the t boundary is positive and finite or +∞ anywhere in (0, 1]
    #[test]
    fn prop_t_boundary_defined(q in arb_any_fraction(), b in arb_rate(), df in arb_df()) {
        let t = obf_boundary_t(q, b, df, CriticalScale::TwoSided).unwrap();
        prop_assert!(!t.is_nan(), "NaN at q = {q}, df = {df}");
        prop_assert!(t > 0.0, "bound({q}) = {t} for df = {df}");
    }

    /// Property: the t boundary never increases as information accrues,
    /// from vanishing information up to q = 1
    #[test]
    fn prop_t_boundary_decreasing(
        q1 in arb_any_fraction(),
        gap in 0.01f64..1.0,
        b in arb_rate(),
        df in arb_df(),
    ) {
        let q2 = (q1 * (1.0 + gap)).min(1.0);
        let early = obf_boundary_t(q1, b, df, CriticalScale::TwoSided).unwrap();
        let late = obf_boundary_t(q2, b, df, CriticalScale::TwoSided).unwrap();
        prop_assert!(early >= late, "bound({q1}) = {early} < bound({q2}) = {late}, df = {df}");
        if early.is_finite() && q2 >= q1 * 1.01 {
            prop_assert!(early > late, "bound({q1}) = bound({q2}) = {late}, df = {df}");
        }
    }

    /// Property: one-sided conversion always gives the lower boundary
    #[test]
    fn prop_one_sided_below_two_sided(q in 0.05f64..=1.0, b in arb_rate()) {
        let two = obf_boundary(q, b, CriticalScale::TwoSided).unwrap();
        let one = obf_boundary(q, b, CriticalScale::OneSided).unwrap();
        prop_assert!(one < two);
    }
}

// ============================================================================
// Decision properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: exactly one decision, matching the boundary comparisons
    #[test]
    fn prop_decision_exhaustive_and_exclusive(
        q in 0.05f64..=1.0,
        statistic in -20.0f64..20.0,
        alpha in arb_rate(),
        beta in arb_rate(),
    ) {
        let budget = ErrorBudget::new(alpha, beta).unwrap();
        let evaluator = BoundaryEvaluator::new(budget, CriticalScale::TwoSided).unwrap();
        let eval = evaluator.evaluate(q, statistic).unwrap();

        let above = statistic > eval.efficacy_boundary.abs();
        let below = statistic < eval.futility_boundary;
        let expected = if above {
            Decision::StopEfficacy
        } else if below {
            Decision::StopFutility
        } else {
            Decision::Continue
        };
        prop_assert_eq!(eval.decision, expected);
    }

    /// Property: the decision depends only on its inputs
    #[test]
    fn prop_decision_deterministic(q in 0.05f64..=1.0, statistic in -20.0f64..20.0) {
        let evaluator =
            BoundaryEvaluator::new(ErrorBudget::default(), CriticalScale::TwoSided).unwrap();
        prop_assert_eq!(
            evaluator.evaluate(q, statistic).unwrap(),
            evaluator.evaluate(q, statistic).unwrap()
        );
    }

    /// Property: the z-score sign follows the rate difference
    #[test]
    fn prop_z_sign_follows_rates((n_c, conv_c) in arb_cell(), (n_t, conv_t) in arb_cell()) {
        let ctrl = [ProportionAggregate::new(0, n_c, conv_c).unwrap()];
        let test = [ProportionAggregate::new(0, n_t, conv_t).unwrap()];
        let series = ProportionStatistic::new(100_000).unwrap().series(&ctrl, &test).unwrap();
        let z = series.rows()[0].statistic.value().unwrap();

        let diff = test[0].ctr().unwrap() - ctrl[0].ctr().unwrap();
        if diff > 0.0 {
            prop_assert!(z > 0.0);
        } else if diff < 0.0 {
            prop_assert!(z < 0.0);
        } else {
            prop_assert!(z.abs() < f64::EPSILON);
        }
    }
}
