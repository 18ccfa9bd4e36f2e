//! Error types for trueno-seq
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Why a single look's statistic could not be computed.
///
/// Carried as a per-row marker in a running series; only surfaced as an
/// [`Error`] when no look in the series is computable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotComputableReason {
    /// One of the cells has no trials (or observations) yet.
    EmptyCell,
    /// The combined standard error is zero (e.g. both cells at 0% or 100%).
    ZeroVariance,
    /// The series holds no looks at all.
    EmptySeries,
}

impl fmt::Display for NotComputableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCell => write!(f, "a cell has zero sample size"),
            Self::ZeroVariance => write!(f, "combined standard error is zero"),
            Self::EmptySeries => write!(f, "series has no looks"),
        }
    }
}

/// trueno-seq error types
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid statistical input (information fraction, error budget, sample size)
    #[error("Domain error: {0}")]
    Domain(String),

    /// No look in the series has a computable statistic
    #[error("Statistic not computable at look {look}: {reason}")]
    NotComputable {
        /// Index of the look that was examined last
        look: usize,
        /// Why the statistic is undefined
        reason: NotComputableReason,
    },

    /// MDE search hit its iteration cap without reaching significance
    #[error("MDE search exceeded {iterations} iterations (last uplift {last_uplift:.4}, p = {last_p_value:.4})\nIncrease max_iterations or the step size")]
    BoundedSearchExceeded {
        /// Iterations performed
        iterations: usize,
        /// Uplift tested on the final iteration
        last_uplift: f64,
        /// p-value observed on the final iteration
        last_p_value: f64,
    },

    /// Malformed input batch or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for [`Error::Domain`].
    pub(crate) fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }

    /// True for errors caused by invalid statistical input.
    #[must_use]
    pub const fn is_domain(&self) -> bool {
        matches!(self, Self::Domain(_))
    }
}
