//! Repeats independent runs and aggregates their outcomes.

use crate::errors::{KnapsackError, Result};
use crate::genetic_algorithm::Optimizer;
use crate::instance::ProblemInstance;
use crate::knapsack_optimizer::{GeneticOptimizer, KnapsackConfig, RunResult};
use crate::reporting::{Record, Reporter};
use itertools::{Itertools, MinMaxResult};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentSummary {
    pub best_values: Vec<u64>,
    pub mean: f64,
    /// Population standard deviation of `best_values`.
    pub std_dev: f64,
    pub max: u64,
    pub min: u64,
    /// Element-wise mean of the runs' per-generation best values.
    pub mean_best_history: Vec<f64>,
}

impl ExperimentSummary {
    pub fn from_results(results: &[RunResult]) -> Result<Self> {
        let best_values: Vec<u64> = results.iter().map(|r| r.best_value).collect();
        let histories: Vec<&[u64]> = results.iter().map(|r| r.best_history.as_slice()).collect();
        summarize(best_values, &histories)
    }

    pub fn record(&self) -> Record {
        Record::Summary {
            runs: self.best_values.len(),
            mean: self.mean,
            std_dev: self.std_dev,
            max: self.max,
            min: self.min,
        }
    }
}

pub fn mean_std(values: &[u64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;

    let variance = values
        .iter()
        .map(|&v| {
            let diff = v as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;

    (mean, variance.sqrt())
}

pub fn summarize(best_values: Vec<u64>, histories: &[&[u64]]) -> Result<ExperimentSummary> {
    let (min, max) = match best_values.iter().copied().minmax() {
        MinMaxResult::NoElements => {
            return Err(KnapsackError::InvalidConfiguration(
                "cannot summarize an experiment without runs".to_string(),
            ))
        }
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(min, max) => (min, max),
    };

    let generations = histories.first().map_or(0, |h| h.len());
    if histories.iter().any(|h| h.len() != generations) {
        return Err(KnapsackError::InvalidConfiguration(
            "runs must share the same generation count".to_string(),
        ));
    }

    let mean_best_history = (0..generations)
        .map(|g| histories.iter().map(|h| h[g] as f64).sum::<f64>() / histories.len() as f64)
        .collect();

    let (mean, std_dev) = mean_std(&best_values);

    Ok(ExperimentSummary {
        best_values,
        mean,
        std_dev,
        max,
        min,
        mean_best_history,
    })
}

/// Per-run results together with their aggregate.
#[derive(Clone, Debug)]
pub struct Experiment {
    pub results: Vec<RunResult>,
    pub summary: ExperimentSummary,
}

#[derive(Debug)]
pub struct ExperimentRunner {
    optimizer: GeneticOptimizer,
    runs: usize,
    parallel: bool,
}

impl ExperimentRunner {
    pub fn new(instance: ProblemInstance, config: KnapsackConfig) -> Result<Self> {
        let runs = config.runs;
        let parallel = config.parallel;

        Ok(Self {
            optimizer: GeneticOptimizer::new(instance, config)?,
            runs,
            parallel,
        })
    }

    /// Executes every run, then reports and returns the summary.
    ///
    /// Run `i` (zero-based) draws from `rng_factory(i)` whether runs are
    /// dispatched sequentially or on the rayon pool, and results are kept in
    /// run order, so parallel dispatch does not change the outcome.
    pub fn run<R, F>(&self, rng_factory: F, reporter: &dyn Reporter) -> Result<Experiment>
    where
        R: RngCore,
        F: Fn(usize) -> R + Sync,
    {
        log::info!(
            "starting {} runs ({})",
            self.runs,
            if self.parallel { "parallel" } else { "sequential" }
        );

        let single = |index: usize| -> Result<RunResult> {
            let run = index + 1;
            reporter.report(&Record::RunStarted {
                run,
                runs: self.runs,
            });

            let mut rng = rng_factory(index);
            let result = self.optimizer.optimize(run, &mut rng, reporter)?;

            reporter.report(&Record::RunFinished {
                run,
                best_value: result.best_value,
                best_weight: result.best_weight,
            });
            Ok(result)
        };

        let results = if self.parallel {
            (0..self.runs)
                .into_par_iter()
                .map(single)
                .collect::<Result<Vec<_>>>()?
        } else {
            (0..self.runs).map(single).collect::<Result<Vec<_>>>()?
        };

        let summary = ExperimentSummary::from_results(&results)?;
        reporter.report(&summary.record());
        log::info!(
            "experiment finished: mean {:.2}, best {}, worst {}",
            summary.mean,
            summary.max,
            summary.min
        );

        Ok(Experiment { results, summary })
    }
}

pub fn run_experiment<R, F>(
    instance: ProblemInstance,
    config: KnapsackConfig,
    rng_factory: F,
    reporter: &dyn Reporter,
) -> Result<ExperimentSummary>
where
    R: RngCore,
    F: Fn(usize) -> R + Sync,
{
    let experiment = ExperimentRunner::new(instance, config)?.run(rng_factory, reporter)?;
    Ok(experiment.summary)
}

/// Run `i` gets `seed + i` when seeded, fresh entropy otherwise.
pub fn seeded_rngs(seed: Option<u64>) -> impl Fn(usize) -> StdRng + Send + Sync {
    move |run| match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(run as u64)),
        None => StdRng::from_entropy(),
    }
}
