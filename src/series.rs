//! Running series of a sequential analysis
//!
//! One row per look. Rows are appended in look order and never mutated; a
//! fresh series is derived whenever the underlying history changes.

use serde::{Deserialize, Serialize};

use crate::cell::Day;
use crate::error::NotComputableReason;
use crate::{Error, Result};

/// Test statistic at one look, or the reason it is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Statistic {
    /// Computed z or t value.
    Value(f64),
    /// Undefined at this look; rendered as a gap, skipped for decisions.
    NotComputable(NotComputableReason),
}

impl Statistic {
    /// The value, if computable.
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::NotComputable(_) => None,
        }
    }

    /// Build from a numerator and a standard error, marking a zero or
    /// non-finite denominator as not computable.
    #[must_use]
    pub fn from_ratio(numerator: f64, denominator: f64) -> Self {
        if denominator > 0.0 && denominator.is_finite() {
            Self::Value(numerator / denominator)
        } else {
            Self::NotComputable(NotComputableReason::ZeroVariance)
        }
    }
}

/// One look of a running series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunningRow {
    /// Zero-based position in the series.
    pub look: usize,
    /// Day index of the aggregates behind this look.
    pub day: Day,
    /// Information fraction (may exceed 1 once the target is overrun).
    pub q: f64,
    /// Cumulative sample size behind the look.
    pub n: f64,
    /// Test statistic.
    pub statistic: Statistic,
    /// Degrees of freedom for t-scale boundaries (Welch pipeline only).
    pub degrees_of_freedom: Option<f64>,
}

/// Append-only sequence of looks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningSeries {
    rows: Vec<RunningRow>,
}

impl RunningSeries {
    /// Create an empty series.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a look. Its `look` index is assigned from the current length.
    pub fn push(
        &mut self,
        day: Day,
        q: f64,
        n: f64,
        statistic: Statistic,
        degrees_of_freedom: Option<f64>,
    ) {
        self.rows.push(RunningRow {
            look: self.rows.len(),
            day,
            q,
            n,
            statistic,
            degrees_of_freedom,
        });
    }

    /// All looks in order.
    #[must_use]
    pub fn rows(&self) -> &[RunningRow] {
        &self.rows
    }

    /// Number of looks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if there are no looks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Latest look, computable or not.
    #[must_use]
    pub fn last(&self) -> Option<&RunningRow> {
        self.rows.last()
    }

    /// Latest look whose statistic is computable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotComputable`] if the series is empty or no look is
    /// computable.
    pub fn last_computable(&self) -> Result<&RunningRow> {
        let Some(last) = self.rows.last() else {
            return Err(Error::NotComputable {
                look: 0,
                reason: NotComputableReason::EmptySeries,
            });
        };
        self.rows
            .iter()
            .rev()
            .find(|row| row.statistic.value().is_some())
            .ok_or_else(|| {
                let reason = match last.statistic {
                    Statistic::NotComputable(reason) => reason,
                    Statistic::Value(_) => NotComputableReason::EmptySeries,
                };
                Error::NotComputable {
                    look: last.look,
                    reason,
                }
            })
    }

    /// Statistic values with gaps, in look order (for rendering).
    #[must_use]
    pub fn statistics(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|row| row.statistic.value()).collect()
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
