//! Benchmarker - Experiment Drivers
//!
//! Every driver follows the same shape: load the model into the engine,
//! loop over runs or samples, advance the engine (fresh reload or
//! [`Benchmarker::sweep`]), read back tracked directives and package the
//! collected values into a [`History`].
//!
//! ## Drivers
//!
//! | Driver | Model | Produces |
//! |--------|-------|----------|
//! | [`sample_from_joint`](Benchmarker::sample_from_joint) | observes as predicts, reloaded per draw | i.i.d. series |
//! | [`run_from_joint`](Benchmarker::run_from_joint) | observes as predicts, one load per run | per-sweep series |
//! | [`compute_joint_kl`](Benchmarker::compute_joint_kl) | both of the above | KL convergence curves |
//! | [`run_from_conditional`](Benchmarker::run_from_conditional) | observes as constraints | per-sweep series |
//! | [`run_conditioned_from_prior`](Benchmarker::run_conditioned_from_prior) | constraints drawn from the prior | per-sweep series plus prior overlay |

use crate::error::BenchError;
use crate::history::History;
use crate::model::{Assume, ModelDefinition, Observe, Parameters, SEED_PARAMETER};
use crate::ripl::{DirectiveId, Ripl};
use crate::tracking::{Tracked, select_tracked};
use crate::value::{Scalar, Value};
use fxhash::FxHashMap;
use rayon::prelude::*;
use riplbench_stats::{KlConfig, KlError, compute_kl};
use std::hash::Hash;
use std::time::Instant;

/// History label of [`Benchmarker::sample_from_joint`]
pub const SAMPLE_FROM_JOINT: &str = "sample_from_joint";
/// History label of [`Benchmarker::run_from_joint`]
pub const RUN_FROM_JOINT: &str = "run_from_joint";
/// History label of the KL history from [`Benchmarker::compute_joint_kl`]
pub const KL_DIVERGENCE: &str = "kl_divergence";
/// History label of [`Benchmarker::run_from_conditional`]
pub const RUN_FROM_CONDITIONAL: &str = "run_from_conditional";
/// History label of [`Benchmarker::run_conditioned_from_prior`]
pub const RUN_CONDITIONED_FROM_PRIOR: &str = "run_conditioned_from_prior";

/// Metric name for per-sweep wall-clock seconds
pub const SWEEP_TIME: &str = "sweep_time";
/// Metric name for per-sweep inference step counts
pub const SWEEP_ITERS: &str = "sweep_iters";
/// Metric name for engine logscores
pub const LOGSCORE: &str = "logscore";

/// Series label for independent draws
pub const IID_LABEL: &str = "i.i.d.";
/// Series label for the prior reference overlay
pub const PRIOR_LABEL: &str = "prior";

/// Series label for chain `run`
pub fn run_label(run: usize) -> String {
    format!("run {run}")
}

macro_rules! progress {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

/// Directives registered by a model load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveMaps {
    /// Assume symbol to directive
    pub assumes: FxHashMap<String, DirectiveId>,
    /// Observe index to the predict directive standing in for it
    pub predicts: FxHashMap<usize, DirectiveId>,
}

/// Drives one engine through benchmarking experiments.
///
/// Owns the engine for its whole lifetime; no other caller may touch it.
pub struct Benchmarker<R: Ripl> {
    ripl: R,
    parameters: Parameters,
    assumes: Vec<Assume>,
    observes: Vec<Observe>,
}

impl<R: Ripl> Benchmarker<R> {
    /// Build a benchmarker for `model`.
    ///
    /// If `parameters` carries [`SEED_PARAMETER`] the engine is reseeded with it;
    /// otherwise the engine's current seed is recorded there.
    pub fn new<M>(mut ripl: R, model: &M, mut parameters: Parameters) -> Result<Self, BenchError>
    where
        M: ModelDefinition + ?Sized,
    {
        match parameters.get(SEED_PARAMETER) {
            Some(seed) => {
                let seed = seed
                    .as_u64()
                    .ok_or_else(|| BenchError::InvalidSeed(seed.clone()))?;
                ripl.set_seed(seed)?;
            }
            None => {
                let seed = ripl.seed()?;
                parameters.insert(SEED_PARAMETER.to_string(), seed.into());
            }
        }

        let mut bench = Self {
            ripl,
            parameters,
            assumes: Vec::new(),
            observes: Vec::new(),
        };
        for Assume { symbol, expression } in model.build_assumes() {
            bench.assume(symbol, expression);
        }
        for Observe {
            expression,
            literal,
        } in model.build_observes()
        {
            bench.observe(expression, literal);
        }
        Ok(bench)
    }

    /// Register an assume. Nothing is sent to the engine until a model load.
    pub fn assume(&mut self, symbol: impl Into<String>, expression: impl Into<String>) {
        self.assumes.push(Assume::new(symbol, expression));
    }

    /// Register an observe. Nothing is sent to the engine until a model load.
    pub fn observe(&mut self, expression: impl Into<String>, literal: impl Into<Value>) {
        self.observes.push(Observe::new(expression, literal));
    }

    /// Registered assumes
    pub fn assumes(&self) -> &[Assume] {
        &self.assumes
    }

    /// Registered observes
    pub fn observes(&self) -> &[Observe] {
        &self.observes
    }

    /// Parameters attached to every history
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// The engine
    pub fn ripl(&self) -> &R {
        &self.ripl
    }

    /// The engine, mutably
    pub fn ripl_mut(&mut self) -> &mut R {
        &mut self.ripl
    }

    /// Give the engine back
    pub fn into_ripl(self) -> R {
        self.ripl
    }

    /// Series name for observe `index`, e.g. `observe[0] (normal x 1)`.
    /// `None` if the model has no such observe.
    pub fn name_observe(&self, index: usize) -> Option<String> {
        self.observes
            .get(index)
            .map(|observe| format!("observe[{index}] {}", observe.expression))
    }

    /// Clear the engine and load every assume, with every observe turned into a predict.
    ///
    /// With `prune`, only directives whose initial value is recordable are returned.
    /// With `track = Some(n)`, at most `n` predicts are kept, chosen by
    /// [`select_tracked`]. The engine's seed is left alone.
    pub fn load_model_with_predicts(
        &mut self,
        track: Option<usize>,
        prune: bool,
    ) -> Result<DirectiveMaps, BenchError> {
        self.ripl.clear()?;

        let mut maps = DirectiveMaps::default();
        for assume in &self.assumes {
            let expr = self.ripl.parse(&assume.expression)?;
            let (directive, value) = self.ripl.assume(&assume.symbol, expr)?;
            if !prune || value.is_recordable() {
                maps.assumes.insert(assume.symbol.clone(), directive);
            }
        }

        for (index, observe) in self.observes.iter().enumerate() {
            let expr = self.ripl.parse(&observe.expression)?;
            let (directive, value) = self.ripl.predict(expr)?;
            if !prune || value.is_recordable() {
                maps.predicts.insert(index, directive);
            }
        }

        if let Some(track) = track {
            maps.predicts = select_tracked(maps.predicts, track);
        }

        Ok(maps)
    }

    /// Read the current value of every tracked key from the engine.
    ///
    /// Keys with no directive are dropped; the rest follow [`Tracked::record`].
    pub fn update_values<K>(
        &mut self,
        tracked: &mut Tracked<K>,
        directives: &FxHashMap<K, DirectiveId>,
    ) -> Result<(), BenchError>
    where
        K: Eq + Hash + Clone + Ord,
    {
        let mut untracked = Vec::new();
        let mut reported = Vec::with_capacity(tracked.len());
        for key in tracked.keys() {
            match directives.get(&key) {
                Some(&directive) => {
                    let value = self.ripl.report_value(directive)?;
                    reported.push((key, value));
                }
                None => untracked.push(key),
            }
        }

        for key in &untracked {
            tracked.drop_key(key);
        }
        for (key, value) in reported {
            tracked.record(&key, value);
        }
        Ok(())
    }

    /// Infer until roughly every unconstrained random choice has been resampled.
    ///
    /// The choice count is re-read after every burst since inference can change
    /// the model's structure. Returns the number of inference steps taken.
    pub fn sweep(&mut self) -> Result<u64, BenchError> {
        let mut iterations = 0u64;
        loop {
            let step = self.ripl.entropy_info()?.unconstrained_random_choices;
            if iterations >= step {
                break;
            }
            self.ripl.infer(step)?;
            iterations += step;
        }
        Ok(iterations)
    }

    fn timed_sweep(&mut self) -> Result<(f64, u64), BenchError> {
        let start = Instant::now();
        let iterations = self.sweep()?;
        Ok((start.elapsed().as_secs_f64(), iterations))
    }

    /// Independent draws from the joint distribution (observes as predicts).
    ///
    /// The model is reloaded for every draw and no inference is run.
    pub fn sample_from_joint(
        &mut self,
        samples: usize,
        track: Option<usize>,
        verbose: bool,
    ) -> Result<History, BenchError> {
        let mut assumed = Tracked::new(self.assumes.iter().map(|a| a.symbol.clone()));
        let mut predicted = Tracked::new(0..self.observes.len());
        let mut logscores = Vec::with_capacity(samples);

        for sample in 0..samples {
            progress!(verbose, "Generating sample {sample}");

            let maps = self.load_model_with_predicts(track, true)?;
            logscores.push(self.ripl.logscore()?);
            self.update_values(&mut assumed, &maps.assumes)?;
            self.update_values(&mut predicted, &maps.predicts)?;
        }

        let mut history = History::new(SAMPLE_FROM_JOINT, self.parameters.clone());
        history.add_series(LOGSCORE, IID_LABEL, logscores, true);
        self.add_tracked(&mut history, IID_LABEL, assumed, Some(predicted));
        Ok(history)
    }

    /// Inference chains on the joint distribution (observes as predicts).
    ///
    /// Each run loads the model once and records per-sweep time, step count,
    /// logscore and tracked values.
    pub fn run_from_joint(
        &mut self,
        sweeps: usize,
        track: Option<usize>,
        runs: usize,
        verbose: bool,
    ) -> Result<History, BenchError> {
        let mut history = History::new(RUN_FROM_JOINT, self.parameters.clone());

        for run in 0..runs {
            progress!(verbose, "Starting run {run}");

            let maps = self.load_model_with_predicts(track, true)?;
            let mut assumed = Tracked::new(maps.assumes.keys().cloned());
            let mut predicted = Tracked::new(maps.predicts.keys().copied());
            let mut chain = ChainRecord::with_capacity(sweeps);

            for sweep in 0..sweeps {
                progress!(verbose, "Running sweep {sweep}");

                chain.push(self.timed_sweep()?, self.ripl.logscore()?);
                self.update_values(&mut assumed, &maps.assumes)?;
                self.update_values(&mut predicted, &maps.predicts)?;
            }

            let label = run_label(run);
            chain.add_to(&mut history, &label);
            self.add_tracked(&mut history, &label, assumed, Some(predicted));
        }

        Ok(history)
    }

    /// KL convergence of joint-distribution inference towards i.i.d. prior samples.
    ///
    /// For every metric present in both histories and every chain, point `t` of
    /// the curve is the divergence between the first `t + 1` prior samples and
    /// the whole chain. Leading points whose prefix is degenerate (a constant
    /// chain against equal prior values) are left out, so such a curve starts
    /// at the first well-defined prefix. Curves with no well-defined point, or
    /// with non-finite inputs, are skipped. Both cases are logged at `warn`.
    ///
    /// Returns `(sampled, inferred, kl)`. Invalid `config` fails before any
    /// sampling with [`BenchError::KlConfig`].
    pub fn compute_joint_kl(
        &mut self,
        sweeps: usize,
        samples: usize,
        track: Option<usize>,
        runs: usize,
        verbose: bool,
        config: &KlConfig,
    ) -> Result<(History, History, History), BenchError> {
        config.validate()?;
        let sampled = self.sample_from_joint(samples, track, verbose)?;
        let inferred = self.run_from_joint(sweeps, track, runs, verbose)?;

        let mut kl_history = History::new(KL_DIVERGENCE, self.parameters.clone());
        for (name, series_list) in &inferred.name_to_series {
            let Some(reference) = sampled.series(name).and_then(|s| s.first()) else {
                continue;
            };
            let reference = reference.as_f64s();

            for inferred_series in series_list {
                match kl_curve(&reference, &inferred_series.as_f64s(), sweeps, config) {
                    Ok(curve) => {
                        if curve.skipped > 0 {
                            tracing::warn!(
                                "KL curve for {name} ({}) starts at prefix {}: earlier prefixes are degenerate",
                                inferred_series.label,
                                curve.skipped + 1
                            );
                        }
                        kl_history.add_series(
                            format!("KL_{name}"),
                            inferred_series.label.clone(),
                            curve.points,
                            false,
                        );
                    }
                    Err(err) => tracing::warn!(
                        "Skipping KL curve for {name} ({}): {err}",
                        inferred_series.label
                    ),
                }
            }
        }

        Ok((sampled, inferred, kl_history))
    }

    /// Inference chains on the model conditioned on data.
    ///
    /// `data` replaces the observes' default literals, aligned by observe index.
    /// Only assumes are tracked.
    pub fn run_from_conditional(
        &mut self,
        sweeps: usize,
        data: Option<&[Value]>,
        runs: usize,
        verbose: bool,
    ) -> Result<History, BenchError> {
        if let Some(got) = data.map(<[Value]>::len).filter(|&n| n != self.observes.len()) {
            return Err(BenchError::DataLength {
                expected: self.observes.len(),
                got,
            });
        }

        let mut history = History::new(RUN_FROM_CONDITIONAL, self.parameters.clone());

        for run in 0..runs {
            progress!(verbose, "Starting run {run}");

            let directives = self.load_conditioned(data)?;
            let mut assumed = Tracked::new(directives.keys().cloned());
            let mut chain = ChainRecord::with_capacity(sweeps);

            for sweep in 0..sweeps {
                progress!(verbose, "Running sweep {sweep}");

                chain.push(self.timed_sweep()?, self.ripl.logscore()?);
                self.update_values(&mut assumed, &directives)?;
            }

            let label = run_label(run);
            chain.add_to(&mut history, &label);
            self.add_tracked(&mut history, &label, assumed, None);
        }

        Ok(history)
    }

    /// Inference conditioned on synthetic data drawn from the prior.
    ///
    /// One unpruned joint sample supplies the data for every observe and a
    /// reference value for every recordable assume. The reference logscore and
    /// assume values are overlaid as constant `prior` series.
    pub fn run_conditioned_from_prior(
        &mut self,
        sweeps: usize,
        runs: usize,
        verbose: bool,
    ) -> Result<History, BenchError> {
        progress!(verbose, "Generating data from prior");

        let maps = self.load_model_with_predicts(None, false)?;

        let mut data = Vec::with_capacity(self.observes.len());
        for index in 0..self.observes.len() {
            let directive = maps
                .predicts
                .get(&index)
                .copied()
                .ok_or(BenchError::MissingPredict(index))?;
            data.push(self.ripl.report_value(directive)?);
        }

        let mut assume_directives: Vec<(&String, &DirectiveId)> = maps.assumes.iter().collect();
        assume_directives.sort();
        let mut reference: Vec<(String, Scalar)> = Vec::new();
        for (symbol, &directive) in assume_directives {
            if let Some(scalar) = self.ripl.report_value(directive)?.scalar() {
                reference.push((symbol.clone(), scalar));
            }
        }

        let logscore = self.ripl.logscore()?;

        let mut history = self.run_from_conditional(sweeps, Some(&data), runs, verbose)?;
        history.add_series(LOGSCORE, PRIOR_LABEL, vec![logscore; sweeps], false);
        for (symbol, scalar) in reference {
            history.add_series(symbol, PRIOR_LABEL, vec![scalar; sweeps], true);
        }
        history.label = RUN_CONDITIONED_FROM_PRIOR.to_string();

        Ok(history)
    }

    /// Clear the engine, load the assumes and constrain every observe.
    /// Returns directives of the assumes whose initial value is recordable.
    fn load_conditioned(
        &mut self,
        data: Option<&[Value]>,
    ) -> Result<FxHashMap<String, DirectiveId>, BenchError> {
        self.ripl.clear()?;

        let mut directives = FxHashMap::default();
        for assume in &self.assumes {
            let expr = self.ripl.parse(&assume.expression)?;
            let (directive, value) = self.ripl.assume(&assume.symbol, expr)?;
            if value.is_recordable() {
                directives.insert(assume.symbol.clone(), directive);
            }
        }

        for (index, observe) in self.observes.iter().enumerate() {
            let datum = data.map_or(&observe.literal, |d| &d[index]);
            let expr = self.ripl.parse(&observe.expression)?;
            self.ripl.observe(expr, datum)?;
        }

        Ok(directives)
    }

    fn add_tracked(
        &self,
        history: &mut History,
        label: &str,
        assumed: Tracked<String>,
        predicted: Option<Tracked<usize>>,
    ) {
        for (symbol, values) in assumed.into_series() {
            history.add_series(symbol, label, values, true);
        }
        for (index, values) in predicted.into_iter().flat_map(Tracked::into_series) {
            if let Some(name) = self.name_observe(index) {
                history.add_series(name, label, values, true);
            }
        }
    }
}

/// Per-sweep diagnostics of one chain
struct ChainRecord {
    times: Vec<f64>,
    iterations: Vec<u64>,
    logscores: Vec<f64>,
}

impl ChainRecord {
    fn with_capacity(sweeps: usize) -> Self {
        Self {
            times: Vec::with_capacity(sweeps),
            iterations: Vec::with_capacity(sweeps),
            logscores: Vec::with_capacity(sweeps),
        }
    }

    fn push(&mut self, (time, iterations): (f64, u64), logscore: f64) {
        self.times.push(time);
        self.iterations.push(iterations);
        self.logscores.push(logscore);
    }

    fn add_to(self, history: &mut History, label: &str) {
        history.add_series(SWEEP_TIME, label, self.times, true);
        history.add_series(SWEEP_ITERS, label, self.iterations, true);
        history.add_series(LOGSCORE, label, self.logscores, true);
    }
}

/// KL points of one chain; point `i` compares the first `skipped + i + 1` prior samples
struct KlCurve {
    skipped: usize,
    points: Vec<f64>,
}

/// KL of growing prior prefixes against a whole chain, one point per sweep.
///
/// Degenerate leading prefixes are skipped; once a point is well defined every
/// later one must be too.
fn kl_curve(
    reference: &[f64],
    approx: &[f64],
    sweeps: usize,
    config: &KlConfig,
) -> Result<KlCurve, KlError> {
    let results: Vec<Result<f64, KlError>> = (0..sweeps)
        .into_par_iter()
        .map(|t| {
            let prefix = &reference[..(t + 1).min(reference.len())];
            compute_kl(prefix, approx, config)
        })
        .collect();

    let mut first_err = None;
    let mut points = Vec::with_capacity(sweeps);
    for result in results {
        match result {
            Err(err) if points.is_empty() => {
                first_err.get_or_insert(err);
            }
            result => points.push(result?),
        }
    }

    match first_err {
        Some(err) if points.is_empty() => Err(err),
        _ => Ok(KlCurve {
            skipped: sweeps - points.len(),
            points,
        }),
    }
}
