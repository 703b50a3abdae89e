use crate::errors::Result;
use crate::reporting::Reporter;
use rand::RngCore;
use std::fmt::Debug;

// This trait represents a chromosome - a single candidate
// solution to the problem we're solving
pub trait Chromosome: Send + Sync + Debug + Clone {
    fn fitness(&self) -> f64;
}

// This trait represents a configuration of the algorithm
pub trait Meta: Send + Sync + Debug + Clone {
    fn population_size(&self) -> usize;
    fn generations(&self) -> usize;
    fn max_attempts(&self) -> u64;
    fn verbose(&self) -> bool;
}

// This trait encapsulates the optimizer logic: one full run
// from a fresh population to the last generation
pub trait Optimizer: Send + Sync + Debug {
    type Output;

    fn optimize(
        &self,
        run: usize,
        rng: &mut dyn RngCore,
        reporter: &dyn Reporter,
    ) -> Result<Self::Output>;
}

// This trait encapsulates the underlying genetic algorithm operators
// used by the optimizer. Every stochastic operator draws from the
// random source handed to it, never from a global one.
pub trait Algorithm<M: Meta, C: Chromosome>: Send + Sync + Debug {
    fn meta(&self) -> &M;
    fn generate(&self, rng: &mut dyn RngCore) -> Result<Vec<C>>;
    fn evaluate(&self, population: Vec<C>) -> Vec<C>;
    fn select<'p>(&self, population: &'p [C], rng: &mut dyn RngCore) -> (&'p C, &'p C);
    fn crossover(&self, parents: (&C, &C), rng: &mut dyn RngCore) -> C;
    fn mutate(&self, child: C, rng: &mut dyn RngCore) -> C;
    fn accept(&self, child: &C) -> bool;
    fn elitism(&self, population: &[C]) -> Vec<C>;
}
