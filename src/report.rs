//! Human-readable and JSON reports for the latest look

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, ContinuousAggregate, ProportionAggregate};
use crate::config::{CriticalScale, ErrorBudget};
use crate::distribution::normal_cdf;
use crate::evaluator::Evaluation;
use crate::{Error, Result};

/// Final state of one proportion cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProportionCellLine {
    /// Which cell.
    pub cell: Cell,
    /// Cumulative trials.
    pub n: u64,
    /// Cumulative conversions.
    pub conv: u64,
    /// Conversion rate in percent, if the cell has trials.
    pub ctr_pct: Option<f64>,
}

/// Final state of one continuous cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContinuousCellLine {
    /// Which cell.
    pub cell: Cell,
    /// Cumulative observations.
    pub n: u64,
    /// Cumulative mean.
    pub mean: f64,
    /// Cumulative sample standard deviation.
    pub std: f64,
}

/// Per-cell summary at the latest look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellSummary {
    /// Conversion-rate experiment.
    Proportion {
        /// Control then treatment.
        cells: [ProportionCellLine; 2],
        /// `ctr_test / ctr_ctrl - 1`, undefined for a zero control rate.
        relative_uplift: Option<f64>,
        /// `Φ(z)`.
        confidence: f64,
    },
    /// Continuous/count experiment.
    Continuous {
        /// Control then treatment.
        cells: [ContinuousCellLine; 2],
        /// `mean_test / mean_ctrl - 1`, undefined for a zero control mean.
        relative_uplift: Option<f64>,
    },
}

/// Aggregates that can describe their cells at the latest look.
pub trait SummarizeCells: Sized {
    /// Summarize the final control and treatment records.
    ///
    /// # Errors
    ///
    /// Propagates distribution errors.
    fn summarize(control: &Self, treatment: &Self, statistic: f64) -> Result<CellSummary>;
}

fn relative_change(test: f64, ctrl: f64) -> Option<f64> {
    (ctrl != 0.0).then(|| test / ctrl - 1.0)
}

impl SummarizeCells for ProportionAggregate {
    fn summarize(control: &Self, treatment: &Self, statistic: f64) -> Result<CellSummary> {
        let line = |cell, agg: &Self| ProportionCellLine {
            cell,
            n: agg.n(),
            conv: agg.conv(),
            ctr_pct: agg.ctr().map(|ctr| ctr * 100.0),
        };
        let relative_uplift = match (treatment.ctr(), control.ctr()) {
            (Some(test), Some(ctrl)) => relative_change(test, ctrl),
            _ => None,
        };
        Ok(CellSummary::Proportion {
            cells: [line(Cell::Control, control), line(Cell::Treatment, treatment)],
            relative_uplift,
            confidence: normal_cdf(statistic)?,
        })
    }
}

impl SummarizeCells for ContinuousAggregate {
    fn summarize(control: &Self, treatment: &Self, _statistic: f64) -> Result<CellSummary> {
        let line = |cell, agg: &Self| ContinuousCellLine {
            cell,
            n: agg.n(),
            mean: agg.mean(),
            std: agg.var().sqrt(),
        };
        Ok(CellSummary::Continuous {
            cells: [line(Cell::Control, control), line(Cell::Treatment, treatment)],
            relative_uplift: relative_change(treatment.mean(), control.mean()),
        })
    }
}

/// Report of one evaluation, suitable for printing or archiving as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequentialReport {
    /// Decision and boundary values at the latest computable look.
    pub evaluation: Evaluation,
    /// Budget used for the boundaries.
    pub budget: ErrorBudget,
    /// Critical-value conversion used for the boundaries.
    pub critical_scale: CriticalScale,
    /// Per-cell state at the evaluated look.
    pub summary: CellSummary,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
}

impl SequentialReport {
    /// Assemble a report stamped with the current time.
    #[must_use]
    pub fn new(
        evaluation: Evaluation,
        budget: ErrorBudget,
        critical_scale: CriticalScale,
        summary: CellSummary,
    ) -> Self {
        Self {
            evaluation,
            budget,
            critical_scale,
            summary,
            generated_at: Utc::now(),
        }
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::from)
    }
}

fn fmt_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}%"))
}

impl fmt::Display for CellSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proportion {
                cells,
                relative_uplift,
                confidence,
            } => {
                for line in cells {
                    writeln!(
                        f,
                        "{} = {} / {} = {}",
                        line.cell,
                        line.conv,
                        line.n,
                        fmt_pct(line.ctr_pct)
                    )?;
                }
                writeln!(f, "Phi(z) = {confidence:.2}")?;
                write!(
                    f,
                    "the relative % change is {}",
                    fmt_pct(relative_uplift.map(|u| u * 100.0))
                )
            }
            Self::Continuous {
                cells,
                relative_uplift,
            } => {
                for line in cells {
                    writeln!(
                        f,
                        "{}: n = {}, mean = {:.2}, std = {:.2}",
                        line.cell, line.n, line.mean, line.std
                    )?;
                }
                write!(
                    f,
                    "the relative % change is {}",
                    fmt_pct(relative_uplift.map(|u| u * 100.0))
                )
            }
        }
    }
}

impl fmt::Display for SequentialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Look {} (q = {:.1}%), alpha = {}, beta = {}",
            self.evaluation.look,
            self.evaluation.q * 100.0,
            self.budget.alpha(),
            self.budget.beta()
        )?;
        writeln!(f, "{}", self.evaluation)?;
        write!(f, "{}", self.summary)
    }
}
