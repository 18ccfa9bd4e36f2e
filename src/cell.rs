//! Per-cell cumulative aggregates
//!
//! One record per cell per day, always cumulative from the start of the
//! experiment. Rates, means and variances are derived on demand; a derived
//! value that needs a positive sample size is `None` when the cell is empty.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The two arms of an A/B experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    /// Baseline arm.
    Control,
    /// Arm receiving the change under test.
    Treatment,
}

impl Cell {
    /// Parse a cell label. Accepts `control`/`ctrl` and `treatment`/`test`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for any other label.
    pub fn parse(label: &str) -> Result<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "control" | "ctrl" => Ok(Self::Control),
            "treatment" | "test" => Ok(Self::Treatment),
            other => Err(Error::InvalidInput(format!("Unknown cell label: {other}"))),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Control => write!(f, "ctrl"),
            Self::Treatment => write!(f, "test"),
        }
    }
}

/// Day index shared by both cells.
pub type Day = u32;

/// Cumulative trials and conversions of one cell up to a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionAggregate {
    day: Day,
    n: u64,
    conv: u64,
}

impl ProportionAggregate {
    /// Create a validated aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if `conv > n` (the rate would exceed 1).
    pub fn new(day: Day, n: u64, conv: u64) -> Result<Self> {
        if conv > n {
            return Err(Error::domain(format!(
                "day {day}: conversions ({conv}) exceed trials ({n})"
            )));
        }
        Ok(Self { day, n, conv })
    }

    /// Day index.
    #[must_use]
    pub const fn day(&self) -> Day {
        self.day
    }

    /// Cumulative trials.
    #[must_use]
    pub const fn n(&self) -> u64 {
        self.n
    }

    /// Cumulative conversions.
    #[must_use]
    pub const fn conv(&self) -> u64 {
        self.conv
    }

    /// Conversion rate `conv / n`, undefined for an empty cell.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ctr(&self) -> Option<f64> {
        (self.n > 0).then(|| self.conv as f64 / self.n as f64)
    }

    /// Variance of the rate estimate `ctr (1 - ctr) / n`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn var(&self) -> Option<f64> {
        self.ctr().map(|ctr| ctr * (1.0 - ctr) / self.n as f64)
    }
}

/// Cumulative count, mean and sample variance of one cell up to a day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContinuousAggregate {
    day: Day,
    n: u64,
    mean: f64,
    var: f64,
}

impl ContinuousAggregate {
    /// Create a validated aggregate; `var` is the sample variance (ddof = 1).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] for a non-finite mean or a negative or
    /// non-finite variance.
    pub fn new(day: Day, n: u64, mean: f64, var: f64) -> Result<Self> {
        if !mean.is_finite() {
            return Err(Error::domain(format!("day {day}: mean must be finite, got {mean}")));
        }
        if !(var.is_finite() && var >= 0.0) {
            return Err(Error::domain(format!(
                "day {day}: variance must be finite and non-negative, got {var}"
            )));
        }
        Ok(Self { day, n, mean, var })
    }

    /// Day index.
    #[must_use]
    pub const fn day(&self) -> Day {
        self.day
    }

    /// Cumulative observation count.
    #[must_use]
    pub const fn n(&self) -> u64 {
        self.n
    }

    /// Cumulative mean.
    #[must_use]
    pub const fn mean(&self) -> f64 {
        self.mean
    }

    /// Cumulative sample variance.
    #[must_use]
    pub const fn var(&self) -> f64 {
        self.var
    }

    /// Squared standard error of the mean, `var / n`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn var_over_n(&self) -> Option<f64> {
        (self.n > 0).then(|| self.var / self.n as f64)
    }
}

/// Streaming accumulator turning raw observations into cumulative
/// [`ContinuousAggregate`]s, one per closed day.
///
/// Welford's update keeps the running variance stable for long series.
///
/// ```rust
/// use trueno_seq::cell::ContinuousAccumulator;
///
/// let mut acc = ContinuousAccumulator::new();
/// acc.extend([5.0, 25.0, 50.0]);
/// let day0 = acc.close_day(0)?;
/// assert_eq!(day0.n(), 3);
/// assert!((day0.mean() - 80.0 / 3.0).abs() < 1e-12);
/// # Ok::<(), trueno_seq::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContinuousAccumulator {
    count: u64,
    mean: f64,
    m2: f64,
}

impl ContinuousAccumulator {
    /// Empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one observation.
    #[allow(clippy::cast_precision_loss)]
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    /// Observations seen so far.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Sample variance (ddof = 1); zero below two observations.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Snapshot the cumulative state as the aggregate for `day`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if a non-finite observation was pushed.
    pub fn close_day(&self, day: Day) -> Result<ContinuousAggregate> {
        ContinuousAggregate::new(day, self.count, self.mean, self.sample_variance())
    }
}

impl Extend<f64> for ContinuousAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.push(x);
        }
    }
}

/// Build a cumulative history from raw per-day observations.
///
/// `days` yields `(day, values observed that day)` in day order.
///
/// # Errors
///
/// Returns [`Error::Domain`] if days are not strictly increasing or a value
/// is not finite.
pub fn accumulate_observations<I, V>(days: I) -> Result<Vec<ContinuousAggregate>>
where
    I: IntoIterator<Item = (Day, V)>,
    V: IntoIterator<Item = f64>,
{
    let mut acc = ContinuousAccumulator::new();
    let mut history = Vec::new();
    let mut previous: Option<Day> = None;
    for (day, values) in days {
        if previous.is_some_and(|p| day <= p) {
            return Err(Error::domain(format!("day {day} is out of order")));
        }
        previous = Some(day);
        acc.extend(values);
        history.push(acc.close_day(day)?);
    }
    Ok(history)
}

/// New trials, conversions and rate for one day of a proportion history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRate {
    /// Day index.
    pub day: Day,
    /// Trials on this day alone.
    pub n: u64,
    /// Conversions on this day alone.
    pub conv: u64,
    /// Day rate; `None` when the day added no trials.
    pub ctr: Option<f64>,
}

/// De-cumulate a cumulative proportion history into per-day rates.
///
/// # Errors
///
/// Returns [`Error::Domain`] if a cumulative count decreases.
#[allow(clippy::cast_precision_loss)]
pub fn daily_rates(history: &[ProportionAggregate]) -> Result<Vec<DailyRate>> {
    let mut previous = (0_u64, 0_u64);
    history
        .iter()
        .map(|agg| {
            let n = agg.n().checked_sub(previous.0);
            let conv = agg.conv().checked_sub(previous.1);
            let (Some(n), Some(conv)) = (n, conv) else {
                return Err(Error::domain(format!(
                    "day {}: cumulative counts decreased",
                    agg.day()
                )));
            };
            previous = (agg.n(), agg.conv());
            Ok(DailyRate {
                day: agg.day(),
                n,
                conv,
                ctr: (n > 0).then(|| conv as f64 / n as f64),
            })
        })
        .collect()
}
