//! Integration tests for riplbench
//!
//! These drive the experiment drivers end to end against the in-memory engine.

use fxhash::FxHashMap;
use riplbench::prelude::*;
use riplbench::{
    ExperimentConfig, ExperimentKind, IID_LABEL, KL_DIVERGENCE, KlConfig, LOGSCORE, OutputConfig,
    PRIOR_LABEL, RUN_CONDITIONED_FROM_PRIOR, RUN_FROM_CONDITIONAL, RUN_FROM_JOINT,
    SAMPLE_FROM_JOINT, SEED_PARAMETER, SWEEP_ITERS, SWEEP_TIME, Scalar, Tracked,
    compute_kl_default, run_and_report, run_experiment, select_tracked,
};

/// `x ~ Bernoulli(0.5)` with no observations
struct Coin;

impl ModelDefinition for Coin {
    fn build_assumes(&self) -> Vec<Assume> {
        vec![Assume::new("x", "(flip 0.5)")]
    }
}

/// Normal mean with noisy observations, plus a procedure and a category
struct Gaussian {
    observations: usize,
}

impl ModelDefinition for Gaussian {
    fn build_assumes(&self) -> Vec<Assume> {
        vec![
            Assume::new("mu", "(normal 0 1)"),
            Assume::new("f", "(lambda (y) y)"),
            Assume::new("k", "(uniform_discrete 0 5)"),
        ]
    }

    fn build_observes(&self) -> Vec<Observe> {
        (0..self.observations)
            .map(|i| Observe::new("(normal mu 0.5)", i as f64 * 0.1))
            .collect()
    }
}

/// One observation whose reported type changes between reports
struct Flaky;

impl ModelDefinition for Flaky {
    fn build_assumes(&self) -> Vec<Assume> {
        vec![Assume::new("mu", "(normal 0 1)")]
    }

    fn build_observes(&self) -> Vec<Observe> {
        vec![Observe::new("(flaky)", 0i64)]
    }
}

fn seeded(seed: u64) -> Parameters {
    let mut parameters = Parameters::new();
    parameters.insert(SEED_PARAMETER.to_string(), seed.into());
    parameters
}

#[test]
fn test_value_coercion() {
    assert_eq!(Value::from_repr("a[5]").unwrap().scalar(), Some(Scalar::Int(5)));
    assert!(!Value::from_repr("lambda[(x) x]").unwrap().is_recordable());
    assert!(!Value::from_repr("<procedure foo>").unwrap().is_recordable());
}

#[test]
fn test_sample_from_joint_bernoulli() {
    let mut bench = Benchmarker::new(SimulatedRipl::new(42), &Coin, seeded(42)).unwrap();
    let history = bench.sample_from_joint(100, Some(5), false).unwrap();

    assert_eq!(history.label, SAMPLE_FROM_JOINT);
    let xs = history.series("x").unwrap();
    assert_eq!(xs.len(), 1);
    assert_eq!(xs[0].label, IID_LABEL);
    assert!(xs[0].histogrammed);
    assert_eq!(xs[0].len(), 100);
    assert!(
        xs[0]
            .values
            .iter()
            .all(|v| matches!(v, Scalar::Bool(_)) && (v.as_f64() == 0.0 || v.as_f64() == 1.0))
    );
    // Both outcomes show up in 100 fair flips
    assert!(xs[0].values.contains(&Scalar::Bool(true)));
    assert!(xs[0].values.contains(&Scalar::Bool(false)));

    assert_eq!(history.series(LOGSCORE).unwrap()[0].len(), 100);
}

#[test]
fn test_sample_from_joint_tracks_subset_of_predicts() {
    let model = Gaussian { observations: 12 };
    let mut bench = Benchmarker::new(SimulatedRipl::new(1), &model, seeded(1)).unwrap();
    let history = bench.sample_from_joint(20, Some(4), false).unwrap();

    let observe_names: Vec<&str> = history
        .names()
        .filter(|n| n.starts_with("observe["))
        .collect();
    assert_eq!(observe_names.len(), 4);
    assert!(history.series("mu").is_some());
    assert!(history.series("k").is_some());
    // Procedures are never recorded
    assert!(history.series("f").is_none());
}

#[test]
fn test_run_from_joint_shapes() {
    let mut bench = Benchmarker::new(SimulatedRipl::new(9), &Coin, seeded(9)).unwrap();
    let history = bench.run_from_joint(10, Some(5), 2, false).unwrap();

    assert_eq!(history.label, RUN_FROM_JOINT);
    for name in [SWEEP_TIME, SWEEP_ITERS, LOGSCORE, "x"] {
        let series = history.series(name).unwrap();
        assert_eq!(series.len(), 2, "{name}");
        assert_eq!(series[0].label, "run 0");
        assert_eq!(series[1].label, "run 1");
        assert!(series.iter().all(|s| s.len() == 10), "{name}");
    }

    let iters = &history.series(SWEEP_ITERS).unwrap()[0];
    assert!(iters.values.iter().all(|v| v.as_f64() >= 1.0));
    let times = &history.series(SWEEP_TIME).unwrap()[0];
    assert!(times.values.iter().all(|v| v.as_f64() >= 0.0));
}

#[test]
fn test_type_change_drops_series_for_good() {
    let mut bench = Benchmarker::new(SimulatedRipl::new(2), &Flaky, seeded(2)).unwrap();
    let maps = bench.load_model_with_predicts(None, true).unwrap();
    assert!(maps.predicts.contains_key(&0));

    let mut predicted = Tracked::new(maps.predicts.keys().copied());
    bench.update_values(&mut predicted, &maps.predicts).unwrap();
    assert!(predicted.contains(&0));
    bench.update_values(&mut predicted, &maps.predicts).unwrap();
    assert!(!predicted.contains(&0));
    // Third report is an integer again; the key stays dropped
    bench.update_values(&mut predicted, &maps.predicts).unwrap();
    assert!(!predicted.contains(&0));
    assert!(predicted.into_series().is_empty());
}

#[test]
fn test_run_from_joint_omits_inconsistent_series() {
    let mut bench = Benchmarker::new(SimulatedRipl::new(2), &Flaky, seeded(2)).unwrap();
    let history = bench.run_from_joint(3, None, 1, false).unwrap();

    assert!(history.series("observe[0] (flaky)").is_none());
    assert_eq!(history.series("mu").unwrap()[0].len(), 3);
}

#[test]
fn test_track_subset_determinism() {
    let model = Gaussian { observations: 30 };
    let mut bench = Benchmarker::new(SimulatedRipl::new(4), &model, seeded(4)).unwrap();

    let first = bench.load_model_with_predicts(Some(6), true).unwrap();
    let second = bench.load_model_with_predicts(Some(6), true).unwrap();
    let mut a: Vec<usize> = first.predicts.into_keys().collect();
    let mut b: Vec<usize> = second.predicts.into_keys().collect();
    a.sort();
    b.sort();
    assert_eq!(a.len(), 6);
    assert_eq!(a, b);

    let universe: FxHashMap<usize, ()> = (0..30).map(|i| (i, ())).collect();
    let mut c: Vec<usize> = select_tracked(universe, 6).into_keys().collect();
    c.sort();
    assert_eq!(a, c);
}

#[test]
fn test_sweep_never_undershoots() {
    let model = Gaussian { observations: 4 };
    let ripl = SimulatedRipl::new(6).with_latent_growth(1, 3);
    let mut bench = Benchmarker::new(ripl, &model, seeded(6)).unwrap();
    bench.load_model_with_predicts(None, true).unwrap();

    let before = bench
        .ripl_mut()
        .entropy_info()
        .unwrap()
        .unconstrained_random_choices;
    let iterations = bench.sweep().unwrap();
    assert!(iterations >= before);
    // The structure grew during the first burst, so a second burst was needed
    assert!(iterations > before);
}

#[test]
fn test_kl_self_and_asymmetry() {
    let x: Vec<f64> = (0..50).map(|i| (i as f64 * 0.37).sin()).collect();
    let y: Vec<f64> = (0..50).map(|i| (i as f64 / 50.0).powi(3)).collect();

    assert!(compute_kl_default(&x, &x).unwrap().abs() < 1e-9);
    let xy = compute_kl_default(&x, &y).unwrap();
    let yx = compute_kl_default(&y, &x).unwrap();
    assert!((xy - yx).abs() > 1e-6);
}

#[test]
fn test_compute_joint_kl() {
    let model = Gaussian { observations: 6 };
    let mut bench = Benchmarker::new(SimulatedRipl::new(21), &model, seeded(21)).unwrap();
    let (sampled, inferred, kl) = bench
        .compute_joint_kl(8, 40, Some(2), 3, false, &KlConfig::default())
        .unwrap();

    assert_eq!(sampled.label, SAMPLE_FROM_JOINT);
    assert_eq!(inferred.label, RUN_FROM_JOINT);
    assert_eq!(kl.label, KL_DIVERGENCE);

    let curves = kl.series("KL_mu").unwrap();
    assert_eq!(curves.len(), 3);
    for curve in curves {
        assert_eq!(curve.len(), 8);
        assert!(!curve.histogrammed);
        assert!(curve.as_f64s().iter().all(|v| v.is_finite()));
    }
    assert!(kl.series("KL_logscore").is_some());
    // Sweep diagnostics have no prior counterpart
    assert!(kl.series("KL_sweep_time").is_none());
    assert!(kl.names().all(|n| n.starts_with("KL_")));
}

#[test]
fn test_run_from_conditional_tracks_only_assumes() {
    let model = Gaussian { observations: 5 };
    let mut bench = Benchmarker::new(SimulatedRipl::new(8), &model, seeded(8)).unwrap();
    let history = bench.run_from_conditional(6, None, 2, false).unwrap();

    assert_eq!(history.label, RUN_FROM_CONDITIONAL);
    assert_eq!(history.series("mu").unwrap().len(), 2);
    assert_eq!(history.series("k").unwrap()[1].len(), 6);
    assert!(history.names().all(|n| !n.starts_with("observe[")));

    // Observes are constrained, so a sweep only touches mu and k
    let iters = &history.series(SWEEP_ITERS).unwrap()[0];
    assert!(iters.values.iter().all(|v| *v == Scalar::Int(2)));
}

#[test]
fn test_run_from_conditional_uses_supplied_data() {
    // Defaults sit near the prior of mu; the supplied data is far out in the tail
    let model = Gaussian { observations: 5 };
    let data = vec![Value::Float(100.0); 5];

    let mut bench = Benchmarker::new(SimulatedRipl::new(8), &model, seeded(8)).unwrap();
    let defaults = bench.run_from_conditional(4, None, 1, false).unwrap();
    let conditioned = bench.run_from_conditional(4, Some(&data), 1, false).unwrap();

    let default_scores = defaults.series(LOGSCORE).unwrap()[0].as_f64s();
    let data_scores = conditioned.series(LOGSCORE).unwrap()[0].as_f64s();
    assert!(default_scores.iter().all(|&s| s > -1000.0), "{default_scores:?}");
    assert!(data_scores.iter().all(|&s| s < -10_000.0), "{data_scores:?}");
}

#[test]
fn test_run_conditioned_from_prior_overlays_reference() {
    let model = Gaussian { observations: 5 };
    let mut bench = Benchmarker::new(SimulatedRipl::new(13), &model, seeded(13)).unwrap();
    let history = bench.run_conditioned_from_prior(7, 2, false).unwrap();

    assert_eq!(history.label, RUN_CONDITIONED_FROM_PRIOR);

    let logscores = history.series(LOGSCORE).unwrap();
    assert_eq!(logscores.len(), 3);
    let prior = logscores.iter().find(|s| s.label == PRIOR_LABEL).unwrap();
    assert!(!prior.histogrammed);
    assert_eq!(prior.len(), 7);
    assert!(prior.values.windows(2).all(|w| w[0] == w[1]));

    let mu = history.series("mu").unwrap();
    let mu_prior = mu.iter().find(|s| s.label == PRIOR_LABEL).unwrap();
    assert!(mu_prior.histogrammed);
    assert_eq!(mu_prior.len(), 7);
    assert!(history.series("f").is_none());
}

#[test]
fn test_seed_reproducibility() {
    let run = || {
        let model = Gaussian { observations: 3 };
        let mut bench = Benchmarker::new(SimulatedRipl::new(0), &model, seeded(77)).unwrap();
        bench.run_from_joint(5, None, 1, false).unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(a.series("mu"), b.series("mu"));
    assert_eq!(a.series(LOGSCORE), b.series(LOGSCORE));
}

#[test]
fn test_run_experiment_joint_kl() {
    let mut config = BenchConfig::default();
    config.experiment.kind = ExperimentKind::JointKl;
    config.experiment.sweeps = 4;
    config.experiment.samples = 10;
    config.experiment.runs = 1;

    let model = Gaussian { observations: 2 };
    let mut bench = Benchmarker::new(SimulatedRipl::new(3), &model, seeded(3)).unwrap();
    let histories = run_experiment(&mut bench, &config).unwrap();
    let labels: Vec<&str> = histories.iter().map(|h| h.label.as_str()).collect();
    assert_eq!(labels, vec![SAMPLE_FROM_JOINT, RUN_FROM_JOINT, KL_DIVERGENCE]);
}

#[test]
fn test_run_and_report_writes_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = BenchConfig {
        experiment: ExperimentConfig {
            kind: ExperimentKind::ConditionedFromPrior,
            sweeps: 3,
            runs: 1,
            ..Default::default()
        },
        output: OutputConfig {
            root: dir.path().display().to_string(),
            directory: None,
            formats: vec!["json".into(), "csv".into(), "human".into()],
        },
        ..Default::default()
    };

    let model = Gaussian { observations: 2 };
    let mut bench = Benchmarker::new(SimulatedRipl::new(5), &model, seeded(5)).unwrap();
    let outcome = run_and_report(&mut bench, &config).unwrap();

    assert_eq!(outcome.histories.len(), 1);
    assert_eq!(outcome.written.len(), 3);
    let expected_dir = dir
        .path()
        .join("run_conditioned_from_prior_random_seed=5/");
    assert!(expected_dir.join("run_conditioned_from_prior.json").exists());
    assert!(outcome.written.iter().all(|p| p.exists()));
}
