//! Sequential Report: daily looks at a conversion-rate experiment
//!
//! Feeds three days of cumulative control/treatment counts through a
//! proportion session, prints the running z-scores, the decision at the
//! latest look, and then the same history scaled up a hundredfold, which
//! crosses the efficacy boundary.
//!
//! Run with: RUST_LOG=trueno_seq=debug cargo run --example sequential_report

use trueno_seq::boundary::InformationGrid;
use trueno_seq::cell::ProportionAggregate;
use trueno_seq::config::SequentialConfig;
use trueno_seq::logging::init_logging;
use trueno_seq::session::ProportionSession;

fn session_for(scale: u64, target_n: u64) -> anyhow::Result<ProportionSession> {
    let config = SequentialConfig::builder(target_n).look_cap(7).build()?;
    let mut session = ProportionSession::proportions(config)?;
    let days = [(100, 10, 15), (200, 20, 32), (300, 30, 54)];
    for (day, (n, ctrl, test)) in (0_u32..).zip(days) {
        session.append_day(
            ProportionAggregate::new(day, n * scale, ctrl * scale)?,
            ProportionAggregate::new(day, n * scale, test * scale)?,
        )?;
    }
    Ok(session)
}

fn main() -> anyhow::Result<()> {
    init_logging("trueno_seq=info");

    println!("=== Trueno-Seq Sequential Report ===\n");

    let session = session_for(1, 1_000)?;
    println!("Running z-scores:");
    for row in session.running_series()?.rows() {
        match row.statistic.value() {
            Some(z) => println!("  day {}: q = {:.3}, z = {z:.3}", row.day, row.q),
            None => println!("  day {}: q = {:.3}, z = n/a", row.day, row.q),
        }
    }

    let curves = session.boundary_curves(&InformationGrid::default())?;
    println!("\nEfficacy boundary at selected information fractions:");
    for point in curves.efficacy_upper.points().iter().step_by(6) {
        println!("  q = {:.2}: {:.2}", point.q, point.value);
    }

    println!("\n=== Day 2 ===");
    println!("{}", session.report()?);

    println!("\n=== Same rates, 100x the traffic ===");
    let large = session_for(100, 9_000)?;
    let report = large.report()?;
    println!("{report}");
    println!("\nJSON:\n{}", report.to_json()?);

    Ok(())
}
