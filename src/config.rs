//! Analysis configuration
//!
//! Everything a sequential analysis needs is carried explicitly: target sample
//! size, error budget, look cap and the critical-value conversion. Nothing is
//! read from ambient globals.
//!
//! ## Usage
//!
//! ```rust
//! use trueno_seq::config::{CriticalScale, SequentialConfig};
//!
//! let config = SequentialConfig::builder(1000)
//!     .alpha(0.05)
//!     .beta(0.2)
//!     .look_cap(7)
//!     .critical_scale(CriticalScale::TwoSided)
//!     .build()?;
//!
//! assert_eq!(config.target_n(), 1000);
//! # Ok::<(), trueno_seq::Error>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default overall false-positive rate.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Default overall false-negative rate.
pub const DEFAULT_BETA: f64 = 0.2;

/// Error-rate budget spent over the course of the sequential design.
///
/// `alpha` drives the efficacy boundary, `beta` the futility boundary.
/// Both lie strictly inside `(0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorBudget {
    alpha: f64,
    beta: f64,
}

impl Default for ErrorBudget {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
        }
    }
}

impl ErrorBudget {
    /// Create a validated error budget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if either rate is outside `(0, 1)`.
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        let budget = Self { alpha, beta };
        budget.validate()?;
        Ok(budget)
    }

    /// Efficacy (type-I) budget.
    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Futility (type-II) budget.
    #[must_use]
    pub const fn beta(&self) -> f64 {
        self.beta
    }

    /// Check both rates lie in `(0, 1)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] naming the offending rate.
    pub fn validate(&self) -> Result<()> {
        check_rate("alpha", self.alpha)?;
        check_rate("beta", self.beta)
    }
}

/// Check an error-rate budget lies strictly inside `(0, 1)`.
pub(crate) fn check_rate(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(Error::domain(format!(
            "{name} must lie strictly between 0 and 1, got {value}"
        )))
    }
}

/// How the spent error probability is converted into a critical value.
///
/// `TwoSided` splits the spent probability across both tails, so the
/// boundary at full information equals the fixed-sample critical value
/// `Φ⁻¹(1 - b/2)`. `OneSided` places all of it in one tail and converges to
/// `Φ⁻¹(1 - b)` instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalScale {
    /// `-Φ⁻¹(spent / 2)`; t scale `T⁻¹(1 - spent / 2, df)`.
    #[default]
    TwoSided,
    /// `-Φ⁻¹(spent)`; t scale `T⁻¹(1 - spent, df)`.
    ///
    /// Reproduces the verdicts of legacy `SeqAnalysis` reports, which use
    /// this conversion; pick it when porting their results.
    OneSided,
}

impl CriticalScale {
    /// Tail probability to invert for a given spent probability.
    #[must_use]
    pub fn tail_probability(self, spent: f64) -> f64 {
        match self {
            Self::TwoSided => spent / 2.0,
            Self::OneSided => spent,
        }
    }
}

fn default_max_information() -> f64 {
    1.0
}

/// Configuration of one experiment's sequential analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequentialConfig {
    target_n: u64,
    #[serde(default)]
    budget: ErrorBudget,
    #[serde(default)]
    look_cap: Option<usize>,
    #[serde(default = "default_max_information")]
    max_information: f64,
    #[serde(default)]
    critical_scale: CriticalScale,
}

impl SequentialConfig {
    /// Create a builder for the given target sample size.
    #[must_use]
    pub fn builder(target_n: u64) -> SequentialConfigBuilder {
        SequentialConfigBuilder::new(target_n)
    }

    /// Parse and validate a JSON configuration.
    ///
    /// Only `target_n` is required; the rest fall back to the defaults.
    ///
    /// ```rust
    /// use trueno_seq::config::SequentialConfig;
    ///
    /// let config = SequentialConfig::from_json(r#"{"target_n": 642, "look_cap": 7}"#)?;
    /// assert_eq!(config.look_cap(), Some(7));
    /// assert!((config.budget().alpha() - 0.05).abs() < f64::EPSILON);
    /// # Ok::<(), trueno_seq::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] for malformed JSON and the
    /// validation errors of [`SequentialConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Expected total sample size (conversions) at planned study end.
    #[must_use]
    pub const fn target_n(&self) -> u64 {
        self.target_n
    }

    /// Error budget.
    #[must_use]
    pub const fn budget(&self) -> ErrorBudget {
        self.budget
    }

    /// Maximum number of looks kept by the Welch pipeline, if capped.
    #[must_use]
    pub const fn look_cap(&self) -> Option<usize> {
        self.look_cap
    }

    /// Information level that counts as `q = 1` in the Welch pipeline.
    #[must_use]
    pub const fn max_information(&self) -> f64 {
        self.max_information
    }

    /// Critical-value conversion used for every boundary lookup.
    #[must_use]
    pub const fn critical_scale(&self) -> CriticalScale {
        self.critical_scale
    }

    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] for a zero target, an invalid budget, a zero
    /// look cap or a non-positive maximum information.
    pub fn validate(&self) -> Result<()> {
        if self.target_n == 0 {
            return Err(Error::domain("target_n must be positive"));
        }
        self.budget.validate()?;
        if self.look_cap == Some(0) {
            return Err(Error::domain("look_cap must keep at least one look"));
        }
        if !(self.max_information.is_finite() && self.max_information > 0.0) {
            return Err(Error::domain(format!(
                "max_information must be positive and finite, got {}",
                self.max_information
            )));
        }
        Ok(())
    }
}

/// Builder for `SequentialConfig`.
#[derive(Debug)]
pub struct SequentialConfigBuilder {
    target_n: u64,
    alpha: f64,
    beta: f64,
    look_cap: Option<usize>,
    max_information: f64,
    critical_scale: CriticalScale,
}

impl SequentialConfigBuilder {
    /// Create a new builder with the required target sample size.
    #[must_use]
    pub const fn new(target_n: u64) -> Self {
        Self {
            target_n,
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
            look_cap: None,
            max_information: 1.0,
            critical_scale: CriticalScale::TwoSided,
        }
    }

    /// Set the efficacy budget.
    #[must_use]
    pub const fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the futility budget.
    #[must_use]
    pub const fn beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Keep only the first `cap` looks in the Welch pipeline.
    #[must_use]
    pub const fn look_cap(mut self, cap: usize) -> Self {
        self.look_cap = Some(cap);
        self
    }

    /// Information level treated as `q = 1` in the Welch pipeline.
    #[must_use]
    pub const fn max_information(mut self, max_information: f64) -> Self {
        self.max_information = max_information;
        self
    }

    /// Set the critical-value conversion.
    #[must_use]
    pub const fn critical_scale(mut self, scale: CriticalScale) -> Self {
        self.critical_scale = scale;
        self
    }

    /// Build and validate the `SequentialConfig`.
    ///
    /// # Errors
    ///
    /// See [`SequentialConfig::validate`].
    pub fn build(self) -> Result<SequentialConfig> {
        let config = SequentialConfig {
            target_n: self.target_n,
            budget: ErrorBudget {
                alpha: self.alpha,
                beta: self.beta,
            },
            look_cap: self.look_cap,
            max_information: self.max_information,
            critical_scale: self.critical_scale,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Parameters of the Minimum Detectable Effect search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MdeConfig {
    /// First relative uplift tried (0.01 = 1%).
    pub start_uplift: f64,
    /// Increment between tries.
    pub step: f64,
    /// Hard cap on tries.
    pub max_iterations: usize,
    /// Two-sided p-value threshold.
    pub significance: f64,
}

impl Default for MdeConfig {
    fn default() -> Self {
        Self {
            start_uplift: 0.01,
            step: 0.01,
            max_iterations: 100,
            significance: 0.05,
        }
    }
}

impl MdeConfig {
    /// Set the iteration cap.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the uplift increment.
    #[must_use]
    pub const fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Set the first uplift tried.
    #[must_use]
    pub const fn with_start_uplift(mut self, start_uplift: f64) -> Self {
        self.start_uplift = start_uplift;
        self
    }

    /// Set the significance threshold.
    #[must_use]
    pub const fn with_significance(mut self, significance: f64) -> Self {
        self.significance = significance;
        self
    }

    /// Uplift tried on iteration `k` (zero-based).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn uplift_at(&self, k: usize) -> f64 {
        self.step.mul_add(k as f64, self.start_uplift)
    }

    /// Validate the search parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] for a non-positive step, a negative start,
    /// a zero iteration cap or a significance outside `(0, 1)`.
    pub fn validate(&self) -> Result<()> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(Error::domain(format!("step must be positive, got {}", self.step)));
        }
        if !(self.start_uplift.is_finite() && self.start_uplift >= 0.0) {
            return Err(Error::domain(format!(
                "start_uplift must be non-negative, got {}",
                self.start_uplift
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::domain("max_iterations must be positive"));
        }
        check_rate("significance", self.significance)
    }
}
