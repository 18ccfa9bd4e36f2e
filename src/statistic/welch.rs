//! Welch unequal-variance t-score

use tracing::{debug, warn};

use super::{check_aligned, RunningStatistic};
use crate::boundary::BoundaryStatistic;
use crate::cell::ContinuousAggregate;
use crate::config::SequentialConfig;
use crate::error::NotComputableReason;
use crate::series::{RunningRow, RunningSeries, Statistic};
use crate::{Error, Result};

/// Running Welch t-score of treatment vs control means.
///
/// Per look:
///
/// ```text
///   t  = (mean_t - mean_c) / sqrt(var_t/n_t + var_c/n_c)
///   q  = 1 / (var_t/n_t + var_c/n_c) / max_information
///   df = n_c + n_t - 2
/// ```
///
/// `df` is the pooled approximation, not Welch-Satterthwaite; see
/// [`welch_satterthwaite_df`] for the latter as a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchStatistic {
    look_cap: Option<usize>,
    max_information: f64,
}

impl Default for WelchStatistic {
    fn default() -> Self {
        Self {
            look_cap: None,
            max_information: 1.0,
        }
    }
}

impl WelchStatistic {
    /// Uncapped statistic with `q` equal to the raw inverse combined variance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the first `cap` looks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if `cap` is zero.
    pub fn with_look_cap(mut self, cap: usize) -> Result<Self> {
        if cap == 0 {
            return Err(Error::domain("look_cap must keep at least one look"));
        }
        self.look_cap = Some(cap);
        Ok(self)
    }

    /// Information level that maps to `q = 1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] unless positive and finite.
    pub fn with_max_information(mut self, max_information: f64) -> Result<Self> {
        if !(max_information.is_finite() && max_information > 0.0) {
            return Err(Error::domain(format!(
                "max_information must be positive and finite, got {max_information}"
            )));
        }
        self.max_information = max_information;
        Ok(self)
    }

    /// Create from an analysis configuration.
    ///
    /// # Errors
    ///
    /// Propagates invalid cap or information settings.
    pub fn from_config(config: &SequentialConfig) -> Result<Self> {
        let statistic = Self::new().with_max_information(config.max_information())?;
        match config.look_cap() {
            Some(cap) => statistic.with_look_cap(cap),
            None => Ok(statistic),
        }
    }

    /// Look cap, if any.
    #[must_use]
    pub const fn look_cap(&self) -> Option<usize> {
        self.look_cap
    }

    /// Information level that maps to `q = 1`.
    #[must_use]
    pub const fn max_information(&self) -> f64 {
        self.max_information
    }

    #[allow(clippy::cast_precision_loss)]
    fn row(
        &self,
        control: &ContinuousAggregate,
        treatment: &ContinuousAggregate,
    ) -> (f64, f64, Statistic, Option<f64>) {
        let n_total = control.n() + treatment.n();
        let n = n_total as f64;
        let df = (n_total > 2).then(|| (n_total - 2) as f64);

        let (Some(von_c), Some(von_t)) = (control.var_over_n(), treatment.var_over_n()) else {
            return (
                0.0,
                n,
                Statistic::NotComputable(NotComputableReason::EmptyCell),
                df,
            );
        };
        let combined = von_t + von_c;
        let statistic = Statistic::from_ratio(treatment.mean() - control.mean(), combined.sqrt());
        let q = if combined > 0.0 {
            combined.recip() / self.max_information
        } else {
            0.0
        };
        (q, n, statistic, df)
    }
}

impl RunningStatistic for WelchStatistic {
    type Aggregate = ContinuousAggregate;

    fn series(
        &self,
        control: &[ContinuousAggregate],
        treatment: &[ContinuousAggregate],
    ) -> Result<RunningSeries> {
        check_aligned(control, treatment)?;
        let looks = self.look_cap.map_or(control.len(), |cap| cap.min(control.len()));
        let mut series = RunningSeries::new();
        for (c, t) in control.iter().zip(treatment).take(looks) {
            let (q, n, statistic, df) = self.row(c, t);
            match statistic {
                Statistic::Value(t_score) => {
                    debug!(day = c.day(), q, n, t = t_score, "welch look");
                }
                Statistic::NotComputable(reason) => {
                    warn!(day = c.day(), %reason, "t-score not computable");
                }
            }
            series.push(c.day(), q, n, statistic, df);
        }
        Ok(series)
    }

    fn boundary_statistic(&self, row: &RunningRow) -> Result<BoundaryStatistic> {
        row.degrees_of_freedom
            .map(|df| BoundaryStatistic::T { df })
            .ok_or_else(|| {
                Error::domain(format!(
                    "look {}: fewer than three observations, no degrees of freedom",
                    row.look
                ))
            })
    }
}

/// Welch-Satterthwaite degrees of freedom for one look.
///
/// Not used for boundary lookups; reported alongside the pooled `n - 2`
/// approximation for comparison. `None` when either cell has fewer than two
/// observations or both variances are zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn welch_satterthwaite_df(
    control: &ContinuousAggregate,
    treatment: &ContinuousAggregate,
) -> Option<f64> {
    if control.n() < 2 || treatment.n() < 2 {
        return None;
    }
    let von_c = control.var_over_n()?;
    let von_t = treatment.var_over_n()?;
    let numerator = (von_c + von_t).powi(2);
    let denominator = von_c.powi(2) / (control.n() - 1) as f64
        + von_t.powi(2) / (treatment.n() - 1) as f64;
    (denominator > 0.0).then(|| numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(day: u32, n: u64, mean: f64, var: f64) -> ContinuousAggregate {
        ContinuousAggregate::new(day, n, mean, var).unwrap()
    }

    #[test]
    fn test_known_t_value() {
        let ctrl = [agg(0, 100, 20.0, 100.0)];
        let test = [agg(0, 100, 23.0, 100.0)];
        let series = WelchStatistic::new().series(&ctrl, &test).unwrap();
        let row = series.rows()[0];
        // se = sqrt(1 + 1)
        assert!((row.statistic.value().unwrap() - 3.0 / 2f64.sqrt()).abs() < 1e-12);
        assert!((row.q - 0.5).abs() < 1e-12);
        assert_eq!(row.degrees_of_freedom, Some(198.0));
        assert!((row.n - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_max_information_scales_q() {
        let ctrl = [agg(0, 400, 20.0, 100.0)];
        let test = [agg(0, 400, 21.0, 100.0)];
        let statistic = WelchStatistic::new().with_max_information(4.0).unwrap();
        let series = statistic.series(&ctrl, &test).unwrap();
        // information = 1 / 0.5 = 2
        assert!((series.rows()[0].q - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_look_cap_keeps_earliest() {
        let ctrl: Vec<_> = (0..10).map(|d| agg(d, 50 + u64::from(d), 10.0, 4.0)).collect();
        let test: Vec<_> = (0..10).map(|d| agg(d, 50 + u64::from(d), 11.0, 4.0)).collect();
        let statistic = WelchStatistic::new().with_look_cap(7).unwrap();
        let series = statistic.series(&ctrl, &test).unwrap();
        assert_eq!(series.len(), 7);
        assert_eq!(series.last().unwrap().day, 6);
    }

    #[test]
    fn test_zero_variance_is_marked() {
        let ctrl = [agg(0, 10, 5.0, 0.0)];
        let test = [agg(0, 10, 5.0, 0.0)];
        let series = WelchStatistic::new().series(&ctrl, &test).unwrap();
        assert_eq!(
            series.rows()[0].statistic,
            Statistic::NotComputable(NotComputableReason::ZeroVariance)
        );
    }

    #[test]
    fn test_empty_cell_is_marked() {
        let ctrl = [agg(0, 0, 0.0, 0.0)];
        let test = [agg(0, 10, 5.0, 1.0)];
        let series = WelchStatistic::new().series(&ctrl, &test).unwrap();
        assert_eq!(
            series.rows()[0].statistic,
            Statistic::NotComputable(NotComputableReason::EmptyCell)
        );
    }

    #[test]
    fn test_boundary_statistic_needs_df() {
        let ctrl = [agg(0, 1, 5.0, 1.0)];
        let test = [agg(0, 1, 6.0, 1.0)];
        let statistic = WelchStatistic::new();
        let series = statistic.series(&ctrl, &test).unwrap();
        assert!(statistic.boundary_statistic(&series.rows()[0]).is_err());
    }

    #[test]
    fn test_satterthwaite_equal_cells() {
        // Equal n and variance: df = 2(n - 1).
        let c = agg(0, 50, 1.0, 9.0);
        let t = agg(0, 50, 2.0, 9.0);
        assert!((welch_satterthwaite_df(&c, &t).unwrap() - 98.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(WelchStatistic::new().with_look_cap(0).is_err());
        assert!(WelchStatistic::new().with_max_information(0.0).is_err());
    }
}
