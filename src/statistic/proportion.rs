//! Two-proportion z-score

use tracing::{debug, warn};

use super::{check_aligned, RunningStatistic};
use crate::boundary::BoundaryStatistic;
use crate::cell::ProportionAggregate;
use crate::config::SequentialConfig;
use crate::error::NotComputableReason;
use crate::series::{RunningRow, RunningSeries, Statistic};
use crate::{Error, Result};

/// Running z-score of treatment vs control conversion rates.
///
/// Per look:
///
/// ```text
///   z = (ctr_t - ctr_c) / sqrt(var_t + var_c)
///   n = conv_t + conv_c
///   q = n / target_n
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProportionStatistic {
    target_n: u64,
}

impl ProportionStatistic {
    /// Create for a target conversion volume.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if `target_n` is zero.
    pub fn new(target_n: u64) -> Result<Self> {
        if target_n == 0 {
            return Err(Error::domain("target_n must be positive"));
        }
        Ok(Self { target_n })
    }

    /// Create from an analysis configuration.
    ///
    /// # Errors
    ///
    /// See [`ProportionStatistic::new`].
    pub fn from_config(config: &SequentialConfig) -> Result<Self> {
        Self::new(config.target_n())
    }

    /// Target conversion volume.
    #[must_use]
    pub const fn target_n(&self) -> u64 {
        self.target_n
    }

    #[allow(clippy::cast_precision_loss)]
    fn row(&self, control: &ProportionAggregate, treatment: &ProportionAggregate) -> (f64, f64, Statistic) {
        let n = (control.conv() + treatment.conv()) as f64;
        let q = n / self.target_n as f64;
        let statistic = match (
            control.ctr().zip(control.var()),
            treatment.ctr().zip(treatment.var()),
        ) {
            (Some((ctr_c, var_c)), Some((ctr_t, var_t))) => {
                Statistic::from_ratio(ctr_t - ctr_c, (var_t + var_c).sqrt())
            }
            _ => Statistic::NotComputable(NotComputableReason::EmptyCell),
        };
        (q, n, statistic)
    }
}

impl RunningStatistic for ProportionStatistic {
    type Aggregate = ProportionAggregate;

    fn series(
        &self,
        control: &[ProportionAggregate],
        treatment: &[ProportionAggregate],
    ) -> Result<RunningSeries> {
        check_aligned(control, treatment)?;
        let mut series = RunningSeries::new();
        for (c, t) in control.iter().zip(treatment) {
            let (q, n, statistic) = self.row(c, t);
            match statistic {
                Statistic::Value(z) => debug!(day = c.day(), q, n, z, "proportion look"),
                Statistic::NotComputable(reason) => {
                    warn!(day = c.day(), %reason, "z-score not computable");
                }
            }
            series.push(c.day(), q, n, statistic, None);
        }
        Ok(series)
    }

    fn boundary_statistic(&self, _row: &RunningRow) -> Result<BoundaryStatistic> {
        Ok(BoundaryStatistic::Z)
    }

    fn curve_statistic(&self, _series: &RunningSeries) -> Result<BoundaryStatistic> {
        Ok(BoundaryStatistic::Z)
    }
}
