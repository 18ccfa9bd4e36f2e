//! Lan-DeMets spending-function boundaries (O'Brien-Fleming type)
//!
//! **Problem**: Looking at accumulating data every day inflates the type-I
//! error rate of a fixed-sample test.
//!
//! **Solution**: Spend the error budget `b` as a function of the information
//! fraction `q`:
//!
//! ```text
//!   z_fixed  = Φ⁻¹(1 - b/2)
//!   spent(q) = 2 - 2·Φ(z_fixed / √q)
//!   bound(q) = -Φ⁻¹(spent(q))            (converted per CriticalScale)
//! ```
//!
//! Early looks spend almost nothing, so the boundary is very high and only
//! relaxes towards the fixed-sample critical value as `q → 1`.
//!
//! All functions here are pure; curves over a grid of `q` values are
//! evaluated with rayon when the `parallel` feature is enabled.

use serde::{Deserialize, Serialize};

use crate::config::{check_rate, CriticalScale, ErrorBudget};
use crate::distribution::{normal_ppf, normal_sf, students_t_isf};
use crate::{Error, Result};

/// Default first grid point for rendered curves.
pub const DEFAULT_GRID_START: f64 = 0.06;

/// Default number of grid points for rendered curves.
pub const DEFAULT_GRID_POINTS: usize = 30;

fn check_information_fraction(q: f64) -> Result<()> {
    if q > 0.0 && q <= 1.0 {
        Ok(())
    } else {
        Err(Error::domain(format!(
            "information fraction must lie in (0, 1], got {q}"
        )))
    }
}

/// Cumulative error probability spent by information fraction `q`.
///
/// Computed through the survival function so the far tail at small `q`
/// does not cancel to zero prematurely.
///
/// # Errors
///
/// Returns [`Error::Domain`] if `q ∉ (0, 1]` or `b ∉ (0, 1)`.
pub fn spent_probability(q: f64, b: f64) -> Result<f64> {
    check_information_fraction(q)?;
    check_rate("error budget", b)?;
    let z_fixed = normal_ppf(1.0 - b / 2.0)?;
    let arg = z_fixed / q.sqrt();
    Ok(2.0 * normal_sf(arg)?)
}

/// Boundary on the z scale at information fraction `q` for budget `b`.
///
/// Returns `+∞` once the spent probability underflows to zero.
///
/// # Examples
///
/// ```rust
/// use trueno_seq::boundary::obf_boundary;
/// use trueno_seq::config::CriticalScale;
///
/// let early = obf_boundary(0.25, 0.05, CriticalScale::TwoSided)?;
/// let late = obf_boundary(1.0, 0.05, CriticalScale::TwoSided)?;
/// assert!(early > late);
/// assert!((late - 1.959_964).abs() < 1e-5);
/// # Ok::<(), trueno_seq::Error>(())
/// ```
///
/// # Errors
///
/// Returns [`Error::Domain`] if `q ∉ (0, 1]` or `b ∉ (0, 1)`.
pub fn obf_boundary(q: f64, b: f64, scale: CriticalScale) -> Result<f64> {
    let tail = scale.tail_probability(spent_probability(q, b)?);
    if tail <= 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(-normal_ppf(tail)?)
}

/// Boundary on the t scale with `df` degrees of freedom.
///
/// Solved as an upper-tail quantile, so it keeps decreasing through the far
/// tail of early looks and reaches `+∞` as `q → 0+`, as on the z scale.
///
/// # Errors
///
/// Returns [`Error::Domain`] if `q ∉ (0, 1]`, `b ∉ (0, 1)` or `df <= 0`.
pub fn obf_boundary_t(q: f64, b: f64, df: f64, scale: CriticalScale) -> Result<f64> {
    let tail = scale.tail_probability(spent_probability(q, b)?);
    if df.is_nan() || df <= 0.0 {
        return Err(Error::domain(format!(
            "degrees of freedom must be positive, got {df}"
        )));
    }
    if tail <= 0.0 {
        return Ok(f64::INFINITY);
    }
    students_t_isf(tail, df)
}

/// Boundary values for a sequence of information fractions.
///
/// # Errors
///
/// Fails on the first invalid `q` (or an invalid `b`).
pub fn obf_boundaries(qs: &[f64], b: f64, scale: CriticalScale) -> Result<Vec<f64>> {
    BoundaryStatistic::Z.evaluate_all(qs, b, scale)
}

/// Which test statistic a boundary is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scale", rename_all = "snake_case")]
pub enum BoundaryStatistic {
    /// Standard normal (proportion pipeline).
    Z,
    /// Student-t with the given degrees of freedom (Welch pipeline).
    T {
        /// Degrees of freedom.
        df: f64,
    },
}

impl BoundaryStatistic {
    /// Boundary value at `q` for budget `b`.
    ///
    /// # Errors
    ///
    /// See [`obf_boundary`] and [`obf_boundary_t`].
    pub fn boundary(self, q: f64, b: f64, scale: CriticalScale) -> Result<f64> {
        match self {
            Self::Z => obf_boundary(q, b, scale),
            Self::T { df } => obf_boundary_t(q, b, df, scale),
        }
    }

    #[cfg(feature = "parallel")]
    fn evaluate_all(self, qs: &[f64], b: f64, scale: CriticalScale) -> Result<Vec<f64>> {
        use rayon::prelude::*;

        qs.par_iter().map(|&q| self.boundary(q, b, scale)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn evaluate_all(self, qs: &[f64], b: f64, scale: CriticalScale) -> Result<Vec<f64>> {
        qs.iter().map(|&q| self.boundary(q, b, scale)).collect()
    }
}

/// Ordered grid of information fractions for rendering curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InformationGrid {
    points: Vec<f64>,
}

impl Default for InformationGrid {
    fn default() -> Self {
        Self::linspace(DEFAULT_GRID_START, 1.0, DEFAULT_GRID_POINTS)
            .unwrap_or_else(|_| Self { points: vec![1.0] })
    }
}

impl InformationGrid {
    /// `count` evenly spaced points from `start` to `end` inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] unless `0 < start <= end <= 1` and
    /// `count >= 1` (`count == 1` requires `start == end`).
    #[allow(clippy::cast_precision_loss)]
    pub fn linspace(start: f64, end: f64, count: usize) -> Result<Self> {
        check_information_fraction(start)?;
        check_information_fraction(end)?;
        if start > end {
            return Err(Error::domain(format!(
                "grid start {start} exceeds grid end {end}"
            )));
        }
        let points = match count {
            0 => return Err(Error::domain("grid needs at least one point")),
            1 if (start - end).abs() > f64::EPSILON => {
                return Err(Error::domain("a single-point grid needs start == end"))
            }
            1 => vec![end],
            _ => {
                let width = (end - start) / (count - 1) as f64;
                let mut points: Vec<f64> =
                    (0..count).map(|i| width.mul_add(i as f64, start)).collect();
                // Pin the last point so q = 1 is hit exactly.
                points[count - 1] = end;
                points
            }
        };
        Ok(Self { points })
    }

    /// Grid from explicit points; they must be strictly increasing in `(0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] for out-of-range or unordered points.
    pub fn from_points(points: Vec<f64>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::domain("grid needs at least one point"));
        }
        for &q in &points {
            check_information_fraction(q)?;
        }
        if points.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::domain("grid points must be strictly increasing"));
        }
        Ok(Self { points })
    }

    /// Grid points.
    #[must_use]
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Number of grid points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed grid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Which boundary a curve traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    /// Reject the null above this line.
    EfficacyUpper,
    /// Mirror of the efficacy line (harm region).
    EfficacyLower,
    /// Stop for futility below this line.
    Futility,
}

/// One point of a boundary curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Information fraction.
    pub q: f64,
    /// Boundary value on the statistic's scale.
    pub value: f64,
}

/// Boundary values over an information grid for one budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCurve {
    kind: BoundaryKind,
    budget: f64,
    points: Vec<CurvePoint>,
}

impl BoundaryCurve {
    /// Which boundary this is.
    #[must_use]
    pub const fn kind(&self) -> BoundaryKind {
        self.kind
    }

    /// Error budget the curve spends (alpha or beta).
    #[must_use]
    pub const fn budget(&self) -> f64 {
        self.budget
    }

    /// Points in increasing `q`.
    #[must_use]
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Boundary values only, in grid order.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// The efficacy (±) and futility curves of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCurves {
    /// Scale the curves are expressed in.
    pub statistic: BoundaryStatistic,
    /// `+bound(q, alpha)`.
    pub efficacy_upper: BoundaryCurve,
    /// `-bound(q, alpha)`.
    pub efficacy_lower: BoundaryCurve,
    /// `-bound(q, beta)`.
    pub futility: BoundaryCurve,
}

/// Evaluate all three boundary curves over a grid.
///
/// # Errors
///
/// Returns [`Error::Domain`] for an invalid budget or degrees of freedom.
pub fn boundary_curves(
    grid: &InformationGrid,
    budget: ErrorBudget,
    statistic: BoundaryStatistic,
    scale: CriticalScale,
) -> Result<BoundaryCurves> {
    budget.validate()?;
    let qs = grid.points();
    let upper = statistic.evaluate_all(qs, budget.alpha(), scale)?;
    let futility = statistic.evaluate_all(qs, budget.beta(), scale)?;

    let curve = |kind, b, values: &[f64], sign: f64| BoundaryCurve {
        kind,
        budget: b,
        points: qs
            .iter()
            .zip(values)
            .map(|(&q, &v)| CurvePoint { q, value: sign * v })
            .collect(),
    };

    Ok(BoundaryCurves {
        statistic,
        efficacy_upper: curve(BoundaryKind::EfficacyUpper, budget.alpha(), &upper, 1.0),
        efficacy_lower: curve(BoundaryKind::EfficacyLower, budget.alpha(), &upper, -1.0),
        futility: curve(BoundaryKind::Futility, budget.beta(), &futility, -1.0),
    })
}
