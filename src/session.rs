//! Analysis session: one experiment's two-cell history
//!
//! ## Problem
//!
//! A running experiment receives one cumulative record per cell per day and
//! must be re-evaluated after every append. Keeping the histories, the
//! statistic and the evaluator in sync by hand invites misaligned days.
//!
//! ## Solution
//!
//! [`AnalysisSession`] owns both histories exclusively, rejects appends that
//! break day alignment, and recomputes the series, decision and report from
//! the full history on demand. Nothing derived is cached.
//!
//! ```rust
//! use trueno_seq::cell::ProportionAggregate;
//! use trueno_seq::config::SequentialConfig;
//! use trueno_seq::evaluator::Decision;
//! use trueno_seq::session::ProportionSession;
//!
//! let config = SequentialConfig::builder(1000).build()?;
//! let mut session = ProportionSession::proportions(config)?;
//! for (day, (n, ctrl, test)) in [(100, 10, 15), (200, 20, 32), (300, 30, 54)]
//!     .into_iter()
//!     .enumerate()
//! {
//!     let day = day as u32;
//!     session.append_day(
//!         ProportionAggregate::new(day, n, ctrl)?,
//!         ProportionAggregate::new(day, n, test)?,
//!     )?;
//! }
//! assert_eq!(session.evaluate()?.decision, Decision::Continue);
//! # Ok::<(), trueno_seq::Error>(())
//! ```

use tracing::debug;

use crate::boundary::{boundary_curves, BoundaryCurves, InformationGrid};
use crate::cell::Cell;
use crate::config::SequentialConfig;
use crate::evaluator::{BoundaryEvaluator, Evaluation};
use crate::report::{SequentialReport, SummarizeCells};
use crate::series::RunningSeries;
use crate::statistic::{DailyAggregate, ProportionStatistic, RunningStatistic, WelchStatistic};
use crate::{Error, Result};

/// Session over conversion-rate histories.
pub type ProportionSession = AnalysisSession<ProportionStatistic>;

/// Session over continuous/count histories.
pub type WelchSession = AnalysisSession<WelchStatistic>;

/// Owns the control and treatment histories of one experiment.
#[derive(Debug, Clone)]
pub struct AnalysisSession<S: RunningStatistic> {
    config: SequentialConfig,
    statistic: S,
    evaluator: BoundaryEvaluator,
    control: Vec<S::Aggregate>,
    treatment: Vec<S::Aggregate>,
}

impl ProportionSession {
    /// Empty proportion session for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if the configuration is invalid.
    pub fn proportions(config: SequentialConfig) -> Result<Self> {
        let statistic = ProportionStatistic::from_config(&config)?;
        Self::with_statistic(config, statistic)
    }
}

impl WelchSession {
    /// Empty Welch session for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if the configuration is invalid.
    pub fn welch(config: SequentialConfig) -> Result<Self> {
        let statistic = WelchStatistic::from_config(&config)?;
        Self::with_statistic(config, statistic)
    }
}

impl<S: RunningStatistic> AnalysisSession<S> {
    /// Empty session with an explicitly constructed statistic.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if the configuration is invalid.
    pub fn with_statistic(config: SequentialConfig, statistic: S) -> Result<Self> {
        config.validate()?;
        let evaluator = BoundaryEvaluator::from_config(&config)?;
        Ok(Self {
            config,
            statistic,
            evaluator,
            control: Vec::new(),
            treatment: Vec::new(),
        })
    }

    /// Append the cumulative records of the next day.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if the two records carry different days, the
    /// day does not follow the last appended one, or a cumulative count
    /// (trials, conversions or observations) is below the previous day's.
    /// The session is left unchanged on error.
    pub fn append_day(&mut self, control: S::Aggregate, treatment: S::Aggregate) -> Result<()> {
        if control.day() != treatment.day() {
            return Err(Error::domain(format!(
                "control day {} does not match treatment day {}",
                control.day(),
                treatment.day()
            )));
        }
        if let Some(last) = self.control.last() {
            control.check_follows(last)?;
        }
        if let Some(last) = self.treatment.last() {
            treatment.check_follows(last)?;
        }
        debug!(day = control.day(), looks = self.control.len() + 1, "appended day");
        self.control.push(control);
        self.treatment.push(treatment);
        Ok(())
    }

    /// Append several days in order, stopping at the first rejected pair.
    ///
    /// # Errors
    ///
    /// See [`AnalysisSession::append_day`]. Days before the rejected pair
    /// stay appended.
    pub fn extend_days<I>(&mut self, days: I) -> Result<()>
    where
        I: IntoIterator<Item = (S::Aggregate, S::Aggregate)>,
    {
        for (control, treatment) in days {
            self.append_day(control, treatment)?;
        }
        Ok(())
    }

    /// Configuration of the session.
    #[must_use]
    pub const fn config(&self) -> &SequentialConfig {
        &self.config
    }

    /// Statistic in use.
    #[must_use]
    pub const fn statistic(&self) -> &S {
        &self.statistic
    }

    /// History of one cell.
    #[must_use]
    pub fn history(&self, cell: Cell) -> &[S::Aggregate] {
        match cell {
            Cell::Control => &self.control,
            Cell::Treatment => &self.treatment,
        }
    }

    /// Number of appended days.
    #[must_use]
    pub fn len(&self) -> usize {
        self.control.len()
    }

    /// True before the first append.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.control.is_empty()
    }

    /// Running series over the full history.
    ///
    /// # Errors
    ///
    /// Propagates errors of [`RunningStatistic::series`].
    pub fn running_series(&self) -> Result<RunningSeries> {
        self.statistic.series(&self.control, &self.treatment)
    }

    /// Decision at the latest computable look.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotComputable`] if no look is computable and
    /// [`Error::Domain`] if the look's information fraction is outside
    /// `(0, 1]`.
    pub fn evaluate(&self) -> Result<Evaluation> {
        let series = self.running_series()?;
        self.evaluator.evaluate_series(&self.statistic, &series)
    }

    /// Boundary curves over `grid` on the scale of the current history.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotComputable`] for a t-scale statistic with no
    /// computable look yet.
    pub fn boundary_curves(&self, grid: &InformationGrid) -> Result<BoundaryCurves> {
        let series = self.running_series()?;
        let statistic = self.statistic.curve_statistic(&series)?;
        boundary_curves(
            grid,
            self.config.budget(),
            statistic,
            self.config.critical_scale(),
        )
    }
}

impl<S> AnalysisSession<S>
where
    S: RunningStatistic,
    S::Aggregate: SummarizeCells,
{
    /// Report on the latest computable look.
    ///
    /// # Errors
    ///
    /// See [`AnalysisSession::evaluate`].
    pub fn report(&self) -> Result<SequentialReport> {
        let evaluation = self.evaluate()?;
        let (control, treatment) = self
            .control
            .get(evaluation.look)
            .zip(self.treatment.get(evaluation.look))
            .ok_or_else(|| Error::Other(format!("look {} has no history", evaluation.look)))?;
        let summary = S::Aggregate::summarize(control, treatment, evaluation.statistic)?;
        Ok(SequentialReport::new(
            evaluation,
            self.config.budget(),
            self.config.critical_scale(),
            summary,
        ))
    }
}
