//! Gaussian Mean Benchmark
//!
//! Runs the experiment selected in `riplbench.toml` (or the defaults) on a
//! normal-mean model against the in-memory engine and writes reports.
//!
//! Run with:
//!   cargo run --example gaussian -p riplbench --release
//!   RUST_LOG=riplbench=debug cargo run --example gaussian -p riplbench

use riplbench::prelude::*;
use riplbench::{SEED_PARAMETER, init_logging, run_and_report};

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// `mu ~ N(0, 1)`, `y_i ~ N(mu, 0.5)` with a category riding along
struct GaussianMean {
    data: Vec<f64>,
}

impl ModelDefinition for GaussianMean {
    fn build_assumes(&self) -> Vec<Assume> {
        vec![
            Assume::new("mu", "(normal 0 1)"),
            Assume::new("group", "(uniform_discrete 0 3)"),
            Assume::new("id", "(lambda (y) y)"),
        ]
    }

    fn build_observes(&self) -> Vec<Observe> {
        self.data
            .iter()
            .map(|&y| Observe::new("(normal mu 0.5)", y))
            .collect()
    }
}

fn main() -> anyhow::Result<()> {
    let config = BenchConfig::discover().unwrap_or_default();
    init_logging(config.experiment.verbose)?;

    let model = GaussianMean {
        data: vec![0.4, 0.9, 0.7, 1.2, 0.5, 0.8],
    };
    let mut parameters = Parameters::new();
    parameters.insert(SEED_PARAMETER.to_string(), 2024.into());
    parameters.insert("observations".to_string(), model.data.len().into());

    let mut bench = Benchmarker::new(SimulatedRipl::new(0), &model, parameters)?;
    let outcome = run_and_report(&mut bench, &config)?;

    for history in &outcome.histories {
        println!("{}: {} series", history.label, history.series_count());
    }
    for path in &outcome.written {
        println!("  wrote {}", path.display());
    }
    Ok(())
}
