//! Generational genetic algorithm for the 0/1 knapsack problem.
//!
//! The search core (instance, operators, generational loop, multi-run
//! aggregation) performs no I/O. Progress goes through a [`reporting::Reporter`]
//! and randomness through an injected [`rand::RngCore`], so runs are
//! reproducible from a seed.

pub mod demo_data;
pub mod errors;
pub mod experiment;
pub mod export;
pub mod genetic_algorithm;
pub mod instance;
pub mod knapsack_optimizer;
pub mod reporting;
pub mod visualization;

pub use errors::{KnapsackError, Result};
pub use experiment::{run_experiment, seeded_rngs, Experiment, ExperimentRunner, ExperimentSummary};
pub use instance::ProblemInstance;
pub use knapsack_optimizer::{GeneticOptimizer, KnapsackConfig, KnapsackSolution, RunResult};
