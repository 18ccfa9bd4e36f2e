//! MDE Search: smallest uplift a fixed-size test can detect
//!
//! Run with: cargo run --example mde_search
//! Stochastic variant: cargo run --example mde_search --features stochastic

use trueno_seq::config::MdeConfig;
use trueno_seq::logging::init_logging;
use trueno_seq::mde::{MdeSearch, SummaryStats};

fn main() -> anyhow::Result<()> {
    init_logging("trueno_seq=info");

    println!("=== Trueno-Seq Minimum Detectable Effect ===\n");

    for n in [250, 1_000, 4_000] {
        let baseline = SummaryStats::new(20.0, 10.0, n)?;
        let result = MdeSearch::new(MdeConfig::default())?.search(&baseline)?;
        println!(
            "n = {n:>5}: MDE = {:.0}% (t = {:.2}, p = {:.4}, {} iterations)",
            result.uplift_fraction * 100.0,
            result.t_statistic,
            result.p_value,
            result.iterations
        );
    }

    let fine = MdeConfig::default().with_start_uplift(0.001).with_step(0.001);
    let baseline = SummaryStats::new(20.0, 10.0, 1_000)?;
    let result = MdeSearch::new(fine)?.search(&baseline)?;
    println!("\nFine step (0.1%): MDE = {:.1}%", result.uplift_fraction * 100.0);

    #[cfg(feature = "stochastic")]
    {
        let resampled = MdeSearch::new(MdeConfig::default())?.search_resampled(&baseline, 42)?;
        println!(
            "Resampled (seed 42): MDE = {:.0}% (p = {:.4})",
            resampled.uplift_fraction * 100.0,
            resampled.p_value
        );
    }

    let tiny = SummaryStats::new(20.0, 10.0, 10)?;
    match MdeSearch::new(MdeConfig::default().with_max_iterations(10))?.search(&tiny) {
        Ok(result) => println!("\nn = 10: MDE = {:.0}%", result.uplift_fraction * 100.0),
        Err(e) => println!("\nn = 10: {e}"),
    }

    Ok(())
}
