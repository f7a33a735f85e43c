//! Experiment Runner
//!
//! Runs the driver selected in a [`BenchConfig`] and writes its histories
//! with the configured report formats.

use crate::config::{BenchConfig, ExperimentKind};
use riplbench_core::{Benchmarker, History, Ripl};
use riplbench_report::write_reports;
use std::path::PathBuf;
use std::time::Instant;

/// Histories produced by an experiment and the report files written for them
#[derive(Debug, Clone)]
pub struct ExperimentOutcome {
    /// Histories in production order
    pub histories: Vec<History>,
    /// Report files written
    pub written: Vec<PathBuf>,
}

/// Run the configured driver.
///
/// [`ExperimentKind::JointKl`] yields the sampled, inferred and KL histories in
/// that order; every other kind yields one history.
pub fn run_experiment<R: Ripl>(
    bench: &mut Benchmarker<R>,
    config: &BenchConfig,
) -> anyhow::Result<Vec<History>> {
    let exp = &config.experiment;
    let track = exp.track_limit();
    let start = Instant::now();

    tracing::info!(
        "Running {:?}: {} sweeps, {} runs, {} samples",
        exp.kind,
        exp.sweeps,
        exp.runs,
        exp.samples
    );

    let histories = match exp.kind {
        ExperimentKind::SampleFromJoint => {
            vec![bench.sample_from_joint(exp.samples, track, exp.verbose)?]
        }
        ExperimentKind::RunFromJoint => {
            vec![bench.run_from_joint(exp.sweeps, track, exp.runs, exp.verbose)?]
        }
        ExperimentKind::JointKl => {
            let (sampled, inferred, kl) = bench.compute_joint_kl(
                exp.sweeps,
                exp.samples,
                track,
                exp.runs,
                exp.verbose,
                &config.stats.kl_config(),
            )?;
            vec![sampled, inferred, kl]
        }
        ExperimentKind::RunFromConditional => {
            vec![bench.run_from_conditional(exp.sweeps, None, exp.runs, exp.verbose)?]
        }
        ExperimentKind::ConditionedFromPrior => {
            vec![bench.run_conditioned_from_prior(exp.sweeps, exp.runs, exp.verbose)?]
        }
    };

    tracing::info!(
        "Finished {:?} in {:.2}s",
        exp.kind,
        start.elapsed().as_secs_f64()
    );
    Ok(histories)
}

/// Run the configured driver and write every resulting history.
pub fn run_and_report<R: Ripl>(
    bench: &mut Benchmarker<R>,
    config: &BenchConfig,
) -> anyhow::Result<ExperimentOutcome> {
    let formats = config.output.output_formats()?;
    let histories = run_experiment(bench, config)?;

    let mut written = Vec::new();
    for history in &histories {
        let directory = config.output.directory_for(history);
        written.extend(write_reports(history, &directory, &formats)?);
    }

    Ok(ExperimentOutcome { histories, written })
}
