#![warn(missing_docs)]
//! riplbench Core - Benchmark Orchestration
//!
//! Drives a probabilistic-programming engine through its RIPL
//! (read-eval-print-style interface) and records what it reports:
//! - [`Value`] decoding of engine results into recordable scalars
//! - [`Series`] / [`History`] recorders grouped by metric name
//! - [`Benchmarker`] experiment drivers: i.i.d. sampling from the joint,
//!   inference chains on the joint or on conditioned data, and KL convergence curves
//! - [`SimulatedRipl`], a small in-memory engine for tests and dry runs
//!
//! The engine is consumed through the [`Ripl`] trait and is owned exclusively by
//! one [`Benchmarker`]; every call is a blocking round-trip.

mod benchmarker;
mod error;
mod history;
mod model;
mod ripl;
pub mod sim;
mod tracking;
mod value;

pub use benchmarker::{
    Benchmarker, DirectiveMaps, IID_LABEL, KL_DIVERGENCE, LOGSCORE, PRIOR_LABEL,
    RUN_CONDITIONED_FROM_PRIOR, RUN_FROM_CONDITIONAL, RUN_FROM_JOINT, SAMPLE_FROM_JOINT,
    SWEEP_ITERS, SWEEP_TIME, run_label,
};
pub use error::BenchError;
pub use history::{History, Series};
pub use model::{Assume, ModelDefinition, Observe, Parameters, SEED_PARAMETER};
pub use ripl::{DirectiveId, EntropyInfo, Ripl, RiplError};
pub use sim::SimulatedRipl;
pub use tracking::{TRACK_SEED, Tracked, select_tracked};
pub use value::{Scalar, Value, ValueError, ValueKind};

pub use riplbench_stats::KlConfig;
