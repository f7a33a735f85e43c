#![warn(missing_docs)]
//! # riplbench
//!
//! Benchmarking harness for probabilistic-programming inference engines that
//! expose a read-eval-print-style interface (RIPL).
//!
//! - **Model definitions**: implement [`ModelDefinition`] to list assumes and observes
//! - **Experiment drivers**: i.i.d. sampling from the joint, inference chains on the
//!   joint or on conditioned data, synthetic data drawn from the prior
//! - **Convergence**: binned KL divergence of chains against prior samples
//! - **Reports**: JSON, CSV and terminal summaries of every recorded series
//! - **Configuration**: `riplbench.toml`, discovered by walking up from the working directory
//!
//! ## Quick Start
//!
//! ```
//! use riplbench::prelude::*;
//!
//! struct Coin;
//!
//! impl ModelDefinition for Coin {
//!     fn build_assumes(&self) -> Vec<Assume> {
//!         vec![Assume::new("x", "(flip 0.5)")]
//!     }
//! }
//!
//! let mut bench = Benchmarker::new(SimulatedRipl::new(7), &Coin, Parameters::new()).unwrap();
//! let history = bench.sample_from_joint(20, Some(5), false).unwrap();
//! assert_eq!(history.series("x").unwrap()[0].len(), 20);
//! ```

mod config;
mod experiment;
mod logging;

pub use config::{BenchConfig, ExperimentConfig, ExperimentKind, OutputConfig, StatsConfig};
pub use experiment::{ExperimentOutcome, run_and_report, run_experiment};
pub use logging::init_logging;

pub use riplbench_core::{
    Assume, BenchError, Benchmarker, DirectiveId, DirectiveMaps, EntropyInfo, History,
    IID_LABEL, KL_DIVERGENCE, LOGSCORE, ModelDefinition, Observe, PRIOR_LABEL, Parameters,
    RUN_CONDITIONED_FROM_PRIOR, RUN_FROM_CONDITIONAL, RUN_FROM_JOINT, Ripl, RiplError,
    SAMPLE_FROM_JOINT, SEED_PARAMETER, SWEEP_ITERS, SWEEP_TIME, Scalar, Series, SimulatedRipl,
    Tracked, Value, ValueError, ValueKind, run_label, select_tracked,
};
pub use riplbench_report::{
    HistoryReport, OutputFormat, build_report, format_human_output, generate_csv_report,
    generate_json_report, write_reports,
};
pub use riplbench_stats::{
    KlConfig, KlError, SeriesSummary, compute_kl, compute_kl_default, compute_summary,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Assume, BenchConfig, Benchmarker, History, ModelDefinition, Observe, Parameters, Ripl,
        SimulatedRipl, Value,
    };
}
