//! Stop/continue decision at the latest look
//!
//! ```text
//!   stop     =  bound(q, alpha)
//!   futility = -bound(q, beta)
//!
//!   stat > |stop|      → StopEfficacy
//!   stat < futility    → StopFutility
//!   otherwise          → Continue
//! ```
//!
//! The decision is a pure function of `(q, statistic, budget)`; nothing is
//! cached between evaluations.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::boundary::BoundaryStatistic;
use crate::config::{CriticalScale, ErrorBudget, SequentialConfig};
use crate::series::RunningSeries;
use crate::statistic::RunningStatistic;
use crate::{Error, Result};

/// Outcome of a sequential look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Between the boundaries: keep collecting data.
    Continue,
    /// Above the efficacy boundary: reject the null.
    StopEfficacy,
    /// Below the futility boundary: stop without rejecting the null.
    StopFutility,
}

impl Decision {
    /// True for either stopping outcome.
    #[must_use]
    pub const fn is_stop(self) -> bool {
        !matches!(self, Self::Continue)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => write!(f, "CONTINUE"),
            Self::StopEfficacy => write!(f, "STOP_EFFICACY"),
            Self::StopFutility => write!(f, "STOP_FUTILITY"),
        }
    }
}

/// Everything needed to report one evaluated look.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Look index in the series (0 when evaluated directly).
    pub look: usize,
    /// Information fraction at the look.
    pub q: f64,
    /// Test statistic at the look.
    pub statistic: f64,
    /// Efficacy boundary `bound(q, alpha)` (compared as `±`).
    pub efficacy_boundary: f64,
    /// Futility boundary `-bound(q, beta)`.
    pub futility_boundary: f64,
    /// Scale the boundaries were evaluated on.
    pub scale: BoundaryStatistic,
    /// Resulting decision.
    pub decision: Decision,
}

/// Classify `statistic` against already evaluated boundaries.
///
/// Exactly one outcome is returned for any input, NaN included (a NaN
/// statistic compares false everywhere and yields `Continue`).
#[must_use]
pub fn classify(statistic: f64, efficacy_boundary: f64, futility_boundary: f64) -> Decision {
    if statistic > efficacy_boundary.abs() {
        Decision::StopEfficacy
    } else if statistic < futility_boundary {
        Decision::StopFutility
    } else {
        Decision::Continue
    }
}

/// Evaluates the decision rule for a fixed error budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryEvaluator {
    budget: ErrorBudget,
    scale: CriticalScale,
}

impl BoundaryEvaluator {
    /// Create an evaluator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if the budget is invalid.
    pub fn new(budget: ErrorBudget, scale: CriticalScale) -> Result<Self> {
        budget.validate()?;
        Ok(Self { budget, scale })
    }

    /// Create from an analysis configuration.
    ///
    /// # Errors
    ///
    /// See [`BoundaryEvaluator::new`].
    pub fn from_config(config: &SequentialConfig) -> Result<Self> {
        Self::new(config.budget(), config.critical_scale())
    }

    /// Error budget in use.
    #[must_use]
    pub const fn budget(&self) -> ErrorBudget {
        self.budget
    }

    /// Critical-value conversion in use.
    #[must_use]
    pub const fn critical_scale(&self) -> CriticalScale {
        self.scale
    }

    /// Evaluate a z statistic at information fraction `q`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if `q ∉ (0, 1]` or `statistic` is not finite.
    pub fn evaluate(&self, q: f64, statistic: f64) -> Result<Evaluation> {
        self.evaluate_on(BoundaryStatistic::Z, 0, q, statistic)
    }

    /// Evaluate a t statistic with `df` degrees of freedom.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if `q ∉ (0, 1]`, `df <= 0` or `statistic`
    /// is not finite.
    pub fn evaluate_t(&self, q: f64, statistic: f64, df: f64) -> Result<Evaluation> {
        self.evaluate_on(BoundaryStatistic::T { df }, 0, q, statistic)
    }

    /// Evaluate the latest computable look of a series.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotComputable`] if no look is computable, and the
    /// domain errors of [`BoundaryEvaluator::evaluate`].
    pub fn evaluate_series<S: RunningStatistic>(
        &self,
        statistic: &S,
        series: &RunningSeries,
    ) -> Result<Evaluation> {
        let row = series.last_computable()?;
        let value = row.statistic.value().ok_or_else(|| {
            Error::Other(format!("look {} lost its statistic", row.look))
        })?;
        let scale = statistic.boundary_statistic(row)?;
        self.evaluate_on(scale, row.look, row.q, value)
    }

    fn evaluate_on(
        &self,
        scale: BoundaryStatistic,
        look: usize,
        q: f64,
        statistic: f64,
    ) -> Result<Evaluation> {
        if !statistic.is_finite() {
            return Err(Error::domain(format!(
                "look {look}: statistic must be finite, got {statistic}"
            )));
        }
        let efficacy_boundary = scale.boundary(q, self.budget.alpha(), self.scale)?;
        let futility_boundary = -scale.boundary(q, self.budget.beta(), self.scale)?;
        let decision = classify(statistic, efficacy_boundary, futility_boundary);

        debug!(look, q, statistic, efficacy_boundary, futility_boundary, "evaluated look");
        if decision.is_stop() {
            info!(look, q, statistic, %decision, "boundary crossed");
        }

        Ok(Evaluation {
            look,
            q,
            statistic,
            efficacy_boundary,
            futility_boundary,
            scale,
            decision,
        })
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self.scale {
            BoundaryStatistic::Z => "z",
            BoundaryStatistic::T { .. } => "t",
        };
        writeln!(f, "Current {symbol}: {:.2}", self.statistic)?;
        writeln!(f, "Stop bdry: +/- {:.2}", self.efficacy_boundary)?;
        writeln!(f, "Futility bdry: {:.2}", self.futility_boundary)?;
        match self.decision {
            Decision::StopEfficacy => write!(
                f,
                "STOP: {symbol} crossed positive boundary. Close test, reject null"
            ),
            Decision::StopFutility => write!(
                f,
                "STOP: {symbol} crossed futility boundary. Close test, null holds"
            ),
            Decision::Continue => write!(f, "{symbol} between boundaries - continue test"),
        }
    }
}
