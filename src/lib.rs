//! # Trueno-Seq: Group Sequential Testing for A/B Experiments
//!
//! **Version**: 0.1.0
//!
//! Trueno-Seq decides, day by day, whether a running A/B experiment can stop
//! early. Cumulative per-cell aggregates are turned into a running z-score
//! (conversion rates) or Welch t-score (continuous metrics), and the latest
//! look is compared against Lan-DeMets O'Brien-Fleming boundaries for the
//! configured false-positive (`alpha`) and false-negative (`beta`) budgets.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: Invalid inputs are `Domain` errors, undefined
//!   statistics are explicit row markers; NaN never propagates silently
//! - **Jidoka**: Every decision is a pure function of `(q, statistic, budget)`
//! - **Genchi Genbutsu**: Boundaries reproduce the fixed-sample critical value
//!   at full information
//! - **Muda elimination**: No cached state; sessions recompute from history
//!
//! ## Example Usage
//!
//! ```rust
//! use trueno_seq::cell::ProportionAggregate;
//! use trueno_seq::config::SequentialConfig;
//! use trueno_seq::evaluator::Decision;
//! use trueno_seq::session::ProportionSession;
//!
//! let config = SequentialConfig::builder(9000).build()?;
//! let mut session = ProportionSession::proportions(config)?;
//! session.append_day(
//!     ProportionAggregate::new(0, 30_000, 3_000)?,
//!     ProportionAggregate::new(0, 30_000, 5_400)?,
//! )?;
//!
//! let report = session.report()?;
//! assert_eq!(report.evaluation.decision, Decision::StopEfficacy);
//! println!("{report}");
//! # Ok::<(), trueno_seq::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod boundary;
pub mod cell;
pub mod config;
pub mod distribution;
pub mod error;
pub mod evaluator;
pub mod ingest;
pub mod logging;
pub mod mde;
pub mod report;
pub mod series;
pub mod session;
pub mod statistic;

pub use boundary::{boundary_curves, obf_boundary, BoundaryCurves, BoundaryStatistic, InformationGrid};
pub use cell::{Cell, ContinuousAggregate, ProportionAggregate};
pub use config::{CriticalScale, ErrorBudget, MdeConfig, SequentialConfig};
pub use error::{Error, Result};
pub use evaluator::{BoundaryEvaluator, Decision, Evaluation};
pub use mde::{MdeResult, MdeSearch, SummaryStats};
pub use report::SequentialReport;
pub use series::{RunningSeries, Statistic};
pub use session::{AnalysisSession, ProportionSession, WelchSession};
pub use statistic::{ProportionStatistic, RunningStatistic, WelchStatistic};
