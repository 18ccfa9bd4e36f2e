//! Running test statistics
//!
//! Two pipelines turn aligned per-cell histories into a [`RunningSeries`]:
//!
//! - [`ProportionStatistic`]: two-proportion z-score, `q = conversions / target_n`.
//! - [`WelchStatistic`]: Welch t-score, `q = 1 / (var_t/n_t + var_c/n_c)`
//!   scaled by the configured maximum information.
//!
//! The two information-fraction definitions measure different things and are
//! never mixed within one series.

mod proportion;
mod welch;

pub use proportion::ProportionStatistic;
pub use welch::{welch_satterthwaite_df, WelchStatistic};

use crate::boundary::BoundaryStatistic;
use crate::cell::{ContinuousAggregate, Day, ProportionAggregate};
use crate::series::{RunningRow, RunningSeries};
use crate::{Error, Result};

/// A per-cell cumulative record addressed by day.
pub trait DailyAggregate: Copy + std::fmt::Debug {
    /// Day index of the record.
    fn day(&self) -> Day;

    /// Check that `self` can follow `previous` in one cumulative history:
    /// a later day and no count below the earlier record's.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] naming the day and the count that went back.
    fn check_follows(&self, previous: &Self) -> Result<()>;
}

fn check_not_after(day: Day, previous: Day) -> Result<()> {
    if day <= previous {
        return Err(Error::domain(format!("day {day} is not after day {previous}")));
    }
    Ok(())
}

fn check_count_kept(day: Day, what: &str, count: u64, previous: u64) -> Result<()> {
    if count < previous {
        return Err(Error::domain(format!(
            "day {day}: cumulative {what} decreased from {previous} to {count}"
        )));
    }
    Ok(())
}

impl DailyAggregate for ProportionAggregate {
    fn day(&self) -> Day {
        Self::day(self)
    }

    fn check_follows(&self, previous: &Self) -> Result<()> {
        let day = self.day();
        check_not_after(day, previous.day())?;
        check_count_kept(day, "trials", self.n(), previous.n())?;
        check_count_kept(day, "conversions", self.conv(), previous.conv())
    }
}

impl DailyAggregate for ContinuousAggregate {
    fn day(&self) -> Day {
        Self::day(self)
    }

    fn check_follows(&self, previous: &Self) -> Result<()> {
        let day = self.day();
        check_not_after(day, previous.day())?;
        check_count_kept(day, "observations", self.n(), previous.n())
    }
}

/// A test statistic computed look by look from two aligned cell histories.
pub trait RunningStatistic {
    /// Per-cell record the statistic consumes.
    type Aggregate: DailyAggregate;

    /// Compute the running series from full control and treatment histories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if the histories are misaligned or hold
    /// invalid values. Undefined statistics are row markers, not errors.
    fn series(
        &self,
        control: &[Self::Aggregate],
        treatment: &[Self::Aggregate],
    ) -> Result<RunningSeries>;

    /// Scale on which boundaries for `row` are evaluated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if the row lacks what the scale needs.
    fn boundary_statistic(&self, row: &RunningRow) -> Result<BoundaryStatistic>;

    /// Scale for drawing boundary curves over a whole grid, taken from the
    /// latest computable look of `series` unless the statistic overrides it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotComputable`] if `series` has no computable look.
    fn curve_statistic(&self, series: &RunningSeries) -> Result<BoundaryStatistic> {
        self.boundary_statistic(series.last_computable()?)
    }
}

/// Check both histories have the same length and day indices, strictly
/// increasing, with cumulative counts that never go back.
pub(crate) fn check_aligned<A: DailyAggregate>(control: &[A], treatment: &[A]) -> Result<()> {
    if control.len() != treatment.len() {
        return Err(Error::domain(format!(
            "cells have different lengths: control {} vs treatment {}",
            control.len(),
            treatment.len()
        )));
    }
    for (look, (c, t)) in control.iter().zip(treatment).enumerate() {
        if c.day() != t.day() {
            return Err(Error::domain(format!(
                "look {look}: control day {} does not match treatment day {}",
                c.day(),
                t.day()
            )));
        }
    }
    for history in [control, treatment] {
        for pair in history.windows(2) {
            pair[1].check_follows(&pair[0])?;
        }
    }
    Ok(())
}
