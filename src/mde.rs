//! Minimum Detectable Effect search
//!
//! Walks relative uplifts `start, start + step, ...` over a control baseline
//! until a two-sample t-test of control vs the lifted arm (same spread, same
//! size) is significant. The walk is capped; running out of iterations is an
//! error, never an endless loop.
//!
//! ## Usage
//!
//! ```rust
//! use trueno_seq::config::MdeConfig;
//! use trueno_seq::mde::{MdeSearch, SummaryStats};
//!
//! let baseline = SummaryStats::new(20.0, 10.0, 1000)?;
//! let result = MdeSearch::new(MdeConfig::default())?.search(&baseline)?;
//!
//! assert!((result.uplift_fraction - 0.05).abs() < 1e-9);
//! assert!(result.p_value < 0.05);
//! # Ok::<(), trueno_seq::Error>(())
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::MdeConfig;
use crate::distribution::students_t_sf;
use crate::error::NotComputableReason;
use crate::{Error, Result};

/// Mean, standard deviation and size of one arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    mean: f64,
    std: f64,
    n: u64,
}

impl SummaryStats {
    /// Create validated summary statistics.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] for a non-finite mean, a negative or
    /// non-finite standard deviation, or fewer than two observations.
    pub fn new(mean: f64, std: f64, n: u64) -> Result<Self> {
        if !mean.is_finite() {
            return Err(Error::domain(format!("mean must be finite, got {mean}")));
        }
        if !(std.is_finite() && std >= 0.0) {
            return Err(Error::domain(format!(
                "standard deviation must be finite and non-negative, got {std}"
            )));
        }
        if n < 2 {
            return Err(Error::domain(format!("need at least two observations, got {n}")));
        }
        Ok(Self { mean, std, n })
    }

    /// Arm mean.
    #[must_use]
    pub const fn mean(&self) -> f64 {
        self.mean
    }

    /// Arm standard deviation.
    #[must_use]
    pub const fn std(&self) -> f64 {
        self.std
    }

    /// Arm size.
    #[must_use]
    pub const fn n(&self) -> u64 {
        self.n
    }

    /// Same spread and size, mean scaled by `1 + uplift`.
    #[must_use]
    pub fn lifted(&self, uplift: f64) -> Self {
        Self {
            mean: self.mean * (1.0 + uplift),
            ..*self
        }
    }
}

/// Outcome of a two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    /// `(mean_b - mean_a) / se`.
    pub t_statistic: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    /// `n_a + n_b - 2`.
    pub degrees_of_freedom: f64,
}

/// Two-sample Student t-test from summary statistics, pooled variance.
///
/// # Errors
///
/// Returns [`Error::NotComputable`] when both arms have zero spread.
#[allow(clippy::cast_precision_loss)]
pub fn two_sample_t_test(a: &SummaryStats, b: &SummaryStats) -> Result<TTestResult> {
    let (n_a, n_b) = (a.n as f64, b.n as f64);
    let df = n_a + n_b - 2.0;
    let pooled = ((n_a - 1.0) * a.std.powi(2) + (n_b - 1.0) * b.std.powi(2)) / df;
    let se = (pooled * (n_a.recip() + n_b.recip())).sqrt();
    if se.is_nan() || se <= 0.0 {
        return Err(Error::NotComputable {
            look: 0,
            reason: NotComputableReason::ZeroVariance,
        });
    }
    let t_statistic = (b.mean - a.mean) / se;
    let p_value = 2.0 * students_t_sf(t_statistic.abs(), df)?;
    Ok(TTestResult {
        t_statistic,
        p_value: p_value.min(1.0),
        degrees_of_freedom: df,
    })
}

/// Smallest significant uplift found by the search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MdeResult {
    /// Relative uplift of the mean (0.05 = 5%).
    pub uplift_fraction: f64,
    /// t statistic at that uplift.
    pub t_statistic: f64,
    /// Two-sided p-value at that uplift.
    pub p_value: f64,
    /// Degrees of freedom of the test.
    pub degrees_of_freedom: f64,
    /// Uplifts tried, including the successful one.
    pub iterations: usize,
}

/// Bounded uplift search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MdeSearch {
    config: MdeConfig,
}

impl MdeSearch {
    /// Create a search.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] for invalid search parameters.
    pub fn new(config: MdeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Search parameters.
    #[must_use]
    pub const fn config(&self) -> MdeConfig {
        self.config
    }

    /// Deterministic search from fixed summary statistics.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BoundedSearchExceeded`] if no uplift within the cap
    /// is significant, and [`Error::Domain`] for a baseline with zero mean
    /// or zero spread (no uplift could ever be measured).
    pub fn search(&self, baseline: &SummaryStats) -> Result<MdeResult> {
        if baseline.mean == 0.0 {
            return Err(Error::domain("baseline mean is zero; relative uplift is undefined"));
        }
        if baseline.std == 0.0 {
            return Err(Error::domain("baseline standard deviation must be positive"));
        }
        self.run(|uplift| two_sample_t_test(baseline, &baseline.lifted(uplift)))
    }

    /// Stochastic search: each iteration draws fresh normal samples for
    /// both arms from a seeded generator and tests their sample statistics.
    ///
    /// # Errors
    ///
    /// As [`MdeSearch::search`].
    #[cfg(feature = "stochastic")]
    pub fn search_resampled(&self, baseline: &SummaryStats, seed: u64) -> Result<MdeResult> {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        if baseline.mean == 0.0 {
            return Err(Error::domain("baseline mean is zero; relative uplift is undefined"));
        }
        if baseline.std == 0.0 {
            return Err(Error::domain("baseline standard deviation must be positive"));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        self.run(|uplift| {
            let control = sample_arm(&mut rng, baseline)?;
            let treatment = sample_arm(&mut rng, &baseline.lifted(uplift))?;
            two_sample_t_test(&control, &treatment)
        })
    }

    fn run<F>(&self, mut test_at: F) -> Result<MdeResult>
    where
        F: FnMut(f64) -> Result<TTestResult>,
    {
        let mut last = (0.0, 1.0);
        for k in 0..self.config.max_iterations {
            let uplift = self.config.uplift_at(k);
            let test = test_at(uplift)?;
            debug!(
                iteration = k,
                uplift,
                t = test.t_statistic,
                p = test.p_value,
                "mde iteration"
            );
            if test.p_value < self.config.significance {
                info!(uplift, p = test.p_value, iterations = k + 1, "mde found");
                return Ok(MdeResult {
                    uplift_fraction: uplift,
                    t_statistic: test.t_statistic,
                    p_value: test.p_value,
                    degrees_of_freedom: test.degrees_of_freedom,
                    iterations: k + 1,
                });
            }
            last = (uplift, test.p_value);
        }
        warn!(
            iterations = self.config.max_iterations,
            last_uplift = last.0,
            "mde search exhausted"
        );
        Err(Error::BoundedSearchExceeded {
            iterations: self.config.max_iterations,
            last_uplift: last.0,
            last_p_value: last.1,
        })
    }
}

#[cfg(feature = "stochastic")]
fn sample_arm<R: rand::Rng>(rng: &mut R, arm: &SummaryStats) -> Result<SummaryStats> {
    use rand_distr::{Distribution, Normal};

    use crate::cell::ContinuousAccumulator;

    let normal = Normal::new(arm.mean, arm.std)
        .map_err(|e| Error::domain(format!("cannot sample arm: {e}")))?;
    let mut acc = ContinuousAccumulator::new();
    acc.extend((0..arm.n).map(|_| normal.sample(rng)));
    let day = acc.close_day(0)?;
    SummaryStats::new(day.mean(), day.var().sqrt(), day.n())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t_test_known_value() {
        let a = SummaryStats::new(20.0, 10.0, 1000).unwrap();
        let b = SummaryStats::new(20.8, 10.0, 1000).unwrap();
        let test = two_sample_t_test(&a, &b).unwrap();
        // se = 10 * sqrt(2 / 1000)
        assert!((test.t_statistic - 0.8 / (10.0 * (0.002f64).sqrt())).abs() < 1e-9);
        assert!((test.degrees_of_freedom - 1998.0).abs() < f64::EPSILON);
        assert!(test.p_value > 0.07 && test.p_value < 0.08);
    }

    #[test]
    fn test_t_test_zero_spread() {
        let a = SummaryStats::new(1.0, 0.0, 10).unwrap();
        let b = SummaryStats::new(2.0, 0.0, 10).unwrap();
        assert!(matches!(
            two_sample_t_test(&a, &b),
            Err(Error::NotComputable { .. })
        ));
    }

    #[test]
    fn test_search_reference_case() {
        let baseline = SummaryStats::new(20.0, 10.0, 1000).unwrap();
        let search = MdeSearch::new(MdeConfig::default()).unwrap();
        let result = search.search(&baseline).unwrap();
        assert_eq!(result.iterations, 5);
        assert!((result.uplift_fraction - 0.05).abs() < 1e-12);
        assert!(result.p_value < 0.05);
        assert!(result.t_statistic > 0.0);

        let previous = two_sample_t_test(&baseline, &baseline.lifted(0.04)).unwrap();
        assert!(previous.p_value >= 0.05);
    }

    #[test]
    fn test_search_exhausts_cap() {
        let baseline = SummaryStats::new(20.0, 10_000.0, 10).unwrap();
        let search = MdeSearch::new(MdeConfig::default().with_max_iterations(5)).unwrap();
        match search.search(&baseline) {
            Err(Error::BoundedSearchExceeded {
                iterations,
                last_uplift,
                last_p_value,
            }) => {
                assert_eq!(iterations, 5);
                assert!((last_uplift - 0.05).abs() < 1e-12);
                assert!(last_p_value >= 0.05);
            }
            other => panic!("expected BoundedSearchExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_search_rejects_degenerate_baseline() {
        let search = MdeSearch::new(MdeConfig::default()).unwrap();
        let zero_mean = SummaryStats::new(0.0, 1.0, 100).unwrap();
        assert!(search.search(&zero_mean).unwrap_err().is_domain());
        let zero_std = SummaryStats::new(5.0, 0.0, 100).unwrap();
        assert!(search.search(&zero_std).unwrap_err().is_domain());
    }

    #[test]
    fn test_summary_stats_validation() {
        assert!(SummaryStats::new(1.0, -1.0, 10).is_err());
        assert!(SummaryStats::new(f64::INFINITY, 1.0, 10).is_err());
        assert!(SummaryStats::new(1.0, 1.0, 1).is_err());
    }

    #[cfg(feature = "stochastic")]
    #[test]
    fn test_resampled_search_is_seeded() {
        let baseline = SummaryStats::new(20.0, 10.0, 1000).unwrap();
        let search = MdeSearch::new(MdeConfig::default()).unwrap();
        let first = search.search_resampled(&baseline, 1234).unwrap();
        let second = search.search_resampled(&baseline, 1234).unwrap();
        assert_eq!(first, second);
        assert!(first.p_value < 0.05);
    }
}
