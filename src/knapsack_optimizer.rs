use crate::errors::{KnapsackError, Result, SamplingPhase};
use crate::genetic_algorithm::{Algorithm, Chromosome, Meta, Optimizer};
use crate::instance::{evaluate, is_feasible, ProblemInstance};
use crate::reporting::{Record, Reporter};
use rand::prelude::*;
use rand::seq::index;

#[derive(Clone, Debug)]
pub struct KnapsackConfig {
    pub population_size: usize,
    pub mutation_rate: f64,
    pub generations: usize,
    pub runs: usize,
    /// Ceiling on consecutive infeasible candidates before a search gives up.
    pub max_attempts: u64,
    pub verbose: bool,
    pub parallel: bool,
    pub seed: Option<u64>,
}

impl Default for KnapsackConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            mutation_rate: 0.05,
            generations: 100,
            runs: 2,
            max_attempts: 1_000_000,
            verbose: true,
            parallel: false,
            seed: None,
        }
    }
}

impl KnapsackConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(KnapsackError::InvalidConfiguration(format!(
                "mutation rate {} is outside [0, 1]",
                self.mutation_rate
            )));
        }
        if self.population_size < 2 {
            return Err(KnapsackError::InvalidConfiguration(format!(
                "population size {} is below 2",
                self.population_size
            )));
        }
        if self.generations < 1 {
            return Err(KnapsackError::InvalidConfiguration(
                "at least one generation is required".to_string(),
            ));
        }
        if self.runs < 1 {
            return Err(KnapsackError::InvalidConfiguration(
                "at least one run is required".to_string(),
            ));
        }
        if self.max_attempts < 1 {
            return Err(KnapsackError::InvalidConfiguration(
                "max attempts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Meta for KnapsackConfig {
    fn population_size(&self) -> usize {
        self.population_size
    }

    fn generations(&self) -> usize {
        self.generations
    }

    fn max_attempts(&self) -> u64 {
        self.max_attempts
    }

    fn verbose(&self) -> bool {
        self.verbose
    }
}

/// A decision vector together with its evaluated totals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnapsackSolution {
    pub genes: Vec<bool>,
    pub value: u64,
    pub weight: u64,
}

impl KnapsackSolution {
    pub fn new(instance: &ProblemInstance, genes: Vec<bool>) -> Self {
        let (value, weight) = evaluate(instance, &genes);
        Self {
            genes,
            value,
            weight,
        }
    }
}

impl Chromosome for KnapsackSolution {
    fn fitness(&self) -> f64 {
        self.value as f64
    }
}

/// Draws uniform random bit vectors until one fits the knapsack.
pub fn sample_feasible<R: Rng + ?Sized>(
    instance: &ProblemInstance,
    max_attempts: u64,
    rng: &mut R,
) -> Result<KnapsackSolution> {
    for attempt in 1..=max_attempts {
        let genes: Vec<bool> = (0..instance.size()).map(|_| rng.gen()).collect();
        let candidate = KnapsackSolution::new(instance, genes);

        if is_feasible(candidate.weight, instance.capacity()) {
            log::trace!("feasible sample found after {} attempts", attempt);
            return Ok(candidate);
        }
    }

    Err(KnapsackError::InitializationFailed {
        attempts: max_attempts,
        phase: SamplingPhase::Initialization,
    })
}

pub fn build_population<R: Rng + ?Sized>(
    instance: &ProblemInstance,
    size: usize,
    max_attempts: u64,
    rng: &mut R,
) -> Result<Vec<KnapsackSolution>> {
    let mut population = (0..size)
        .map(|_| sample_feasible(instance, max_attempts, rng))
        .collect::<Result<Vec<_>>>()?;

    sort_descending(&mut population);
    Ok(population)
}

/// Stable sort by descending value; equal values keep their prior order.
pub fn sort_descending(population: &mut [KnapsackSolution]) {
    population.sort_by(|a, b| b.value.cmp(&a.value));
}

/// Binary tournament: two distinct individuals, winner first.
/// On a tie the first drawn individual wins.
///
/// # Panics
///
/// Panics if `population` has fewer than two members. `KnapsackConfig::validate`
/// rejects population sizes below two.
pub fn tournament_select<'p, R: Rng + ?Sized>(
    population: &'p [KnapsackSolution],
    rng: &mut R,
) -> (&'p KnapsackSolution, &'p KnapsackSolution) {
    debug_assert!(population.len() >= 2);

    let picks = index::sample(rng, population.len(), 2);
    let first = &population[picks.index(0)];
    let second = &population[picks.index(1)];

    if second.value > first.value {
        (second, first)
    } else {
        (first, second)
    }
}

/// Uniform crossover: each position takes its bit from a coin-flipped parent.
pub fn crossover<R: Rng + ?Sized>(parent_a: &[bool], parent_b: &[bool], rng: &mut R) -> Vec<bool> {
    debug_assert_eq!(parent_a.len(), parent_b.len());

    parent_a
        .iter()
        .zip(parent_b.iter())
        .map(|(&a, &b)| if rng.gen() { a } else { b })
        .collect()
}

/// With probability `mutation_rate`, flips exactly one random position.
pub fn maybe_mutate<R: Rng + ?Sized>(
    mut genes: Vec<bool>,
    mutation_rate: f64,
    rng: &mut R,
) -> Vec<bool> {
    if !genes.is_empty() && rng.gen_bool(mutation_rate) {
        let index = rng.gen_range(0..genes.len());
        genes[index] = !genes[index];
    }

    genes
}

#[derive(Debug)]
pub struct KnapsackAlgorithm {
    pub instance: ProblemInstance,
    pub config: KnapsackConfig,
}

impl Algorithm<KnapsackConfig, KnapsackSolution> for KnapsackAlgorithm {
    fn meta(&self) -> &KnapsackConfig {
        &self.config
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Result<Vec<KnapsackSolution>> {
        build_population(
            &self.instance,
            self.config.population_size,
            self.config.max_attempts,
            rng,
        )
    }

    fn evaluate(&self, mut population: Vec<KnapsackSolution>) -> Vec<KnapsackSolution> {
        sort_descending(&mut population);
        population
    }

    fn select<'p>(
        &self,
        population: &'p [KnapsackSolution],
        rng: &mut dyn RngCore,
    ) -> (&'p KnapsackSolution, &'p KnapsackSolution) {
        tournament_select(population, rng)
    }

    fn crossover(
        &self,
        parents: (&KnapsackSolution, &KnapsackSolution),
        rng: &mut dyn RngCore,
    ) -> KnapsackSolution {
        let genes = crossover(&parents.0.genes, &parents.1.genes, rng);
        KnapsackSolution::new(&self.instance, genes)
    }

    fn mutate(&self, child: KnapsackSolution, rng: &mut dyn RngCore) -> KnapsackSolution {
        let genes = maybe_mutate(child.genes, self.config.mutation_rate, rng);
        KnapsackSolution::new(&self.instance, genes)
    }

    fn accept(&self, child: &KnapsackSolution) -> bool {
        is_feasible(child.weight, self.instance.capacity())
    }

    fn elitism(&self, population: &[KnapsackSolution]) -> Vec<KnapsackSolution> {
        population[..std::cmp::min(1, population.len())].to_vec()
    }
}

/// Outcome of a single run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunResult {
    pub best_value: u64,
    pub best_weight: u64,
    pub best_genes: Vec<bool>,
    pub best_history: Vec<u64>,
    pub average_history: Vec<f64>,
}

impl RunResult {
    pub fn selected_items(&self) -> Vec<usize> {
        self.best_genes
            .iter()
            .enumerate()
            .filter(|&(_, &included)| included)
            .map(|(i, _)| i)
            .collect()
    }
}

#[derive(Debug)]
pub struct GeneticOptimizer {
    pub algorithm: Box<dyn Algorithm<KnapsackConfig, KnapsackSolution>>,
}

impl GeneticOptimizer {
    pub fn new(instance: ProblemInstance, config: KnapsackConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            algorithm: Box::new(KnapsackAlgorithm { instance, config }),
        })
    }

    fn next_generation(
        &self,
        population: &[KnapsackSolution],
        generation: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<KnapsackSolution>> {
        let meta = self.algorithm.meta();
        let mut next = self.algorithm.elitism(population);
        let mut rejected: u64 = 0;

        while next.len() < meta.population_size() {
            let parents = self.algorithm.select(population, rng);
            let child = self.algorithm.crossover(parents, rng);
            let child = self.algorithm.mutate(child, rng);

            if self.algorithm.accept(&child) {
                next.push(child);
                rejected = 0;
            } else {
                rejected += 1;
                log::trace!(
                    "generation {}: rejected infeasible child (weight {})",
                    generation,
                    child.weight
                );
                if rejected >= meta.max_attempts() {
                    return Err(KnapsackError::InitializationFailed {
                        attempts: rejected,
                        phase: SamplingPhase::Generation(generation),
                    });
                }
            }
        }

        Ok(self.algorithm.evaluate(next))
    }
}

impl Optimizer for GeneticOptimizer {
    type Output = RunResult;

    fn optimize(
        &self,
        run: usize,
        rng: &mut dyn RngCore,
        reporter: &dyn Reporter,
    ) -> Result<RunResult> {
        let meta = self.algorithm.meta().clone();
        let mut population = self.algorithm.evaluate(self.algorithm.generate(rng)?);

        let mut best_history = Vec::with_capacity(meta.generations());
        let mut average_history = Vec::with_capacity(meta.generations());

        for generation in 1..=meta.generations() {
            population = self.next_generation(&population, generation, rng)?;

            let best = population[0].value;
            let average =
                population.iter().map(|s| s.fitness()).sum::<f64>() / population.len() as f64;

            best_history.push(best);
            average_history.push(average);

            if meta.verbose() {
                reporter.report(&Record::Generation {
                    run,
                    generation,
                    best,
                    average,
                });
            }
        }

        let best = &population[0];
        log::debug!(
            "run {} finished: best value {} (weight {})",
            run,
            best.value,
            best.weight
        );

        Ok(RunResult {
            best_value: best.value,
            best_weight: best.weight,
            best_genes: best.genes.clone(),
            best_history,
            average_history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::{RecordingReporter, SilentReporter};
    use proptest::prelude::*;
    use rand::rngs::StdRng;

    fn small_instance(capacity: i64) -> ProblemInstance {
        ProblemInstance::new(vec![10, 20, 30, 40], vec![1, 2, 3, 4], capacity).unwrap()
    }

    fn config(generations: usize) -> KnapsackConfig {
        KnapsackConfig {
            population_size: 20,
            generations,
            runs: 1,
            verbose: false,
            ..Default::default()
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(KnapsackConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_invalid_configuration() {
        let cases = [
            KnapsackConfig {
                mutation_rate: 1.5,
                ..Default::default()
            },
            KnapsackConfig {
                mutation_rate: -0.1,
                ..Default::default()
            },
            KnapsackConfig {
                mutation_rate: f64::NAN,
                ..Default::default()
            },
            KnapsackConfig {
                population_size: 1,
                ..Default::default()
            },
            KnapsackConfig {
                generations: 0,
                ..Default::default()
            },
            KnapsackConfig {
                runs: 0,
                ..Default::default()
            },
            KnapsackConfig {
                max_attempts: 0,
                ..Default::default()
            },
        ];

        for case in cases {
            assert!(
                matches!(case.validate(), Err(KnapsackError::InvalidConfiguration(_))),
                "{:?} should be rejected",
                case
            );
        }
    }

    #[test]
    fn initial_population_is_feasible_and_sorted() {
        let instance = small_instance(5);
        let mut rng = StdRng::seed_from_u64(7);
        let population = build_population(&instance, 20, 1_000, &mut rng).unwrap();

        assert_eq!(population.len(), 20);
        assert!(population.iter().all(|s| s.weight <= 5));
        assert!(population.windows(2).all(|w| w[0].value >= w[1].value));
    }

    #[test]
    fn zero_capacity_converges_to_empty_knapsack() {
        let instance = small_instance(0);
        let mut rng = StdRng::seed_from_u64(3);
        let population = build_population(&instance, 10, 10_000, &mut rng).unwrap();

        for solution in &population {
            assert_eq!(solution.genes, vec![false; 4]);
            assert_eq!(solution.value, 0);
        }
    }

    #[test]
    fn sampling_gives_up_after_max_attempts() {
        let instance = ProblemInstance::new(vec![1; 100], vec![1; 100], 0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let err = sample_feasible(&instance, 50, &mut rng).unwrap_err();

        assert!(matches!(
            err,
            KnapsackError::InitializationFailed {
                attempts: 50,
                phase: SamplingPhase::Initialization
            }
        ));
    }

    #[test]
    fn tournament_returns_two_distinct_members_winner_first() {
        let instance = small_instance(10);
        let population: Vec<KnapsackSolution> = [
            vec![true, false, false, false],
            vec![false, true, false, false],
            vec![false, false, true, false],
        ]
        .into_iter()
        .map(|genes| KnapsackSolution::new(&instance, genes))
        .collect();
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..100 {
            let (winner, loser) = tournament_select(&population, &mut rng);
            assert!(!std::ptr::eq(winner, loser));
            assert!(winner.value >= loser.value);
        }
    }

    #[test]
    #[should_panic]
    fn tournament_needs_two_members() {
        let instance = small_instance(10);
        let population = vec![KnapsackSolution::new(&instance, vec![true, false, false, false])];
        let mut rng = StdRng::seed_from_u64(11);
        tournament_select(&population, &mut rng);
    }

    #[test]
    fn mutation_with_zero_rate_is_identity() {
        let mut rng = StdRng::seed_from_u64(5);
        let genes = vec![true, false, true, true];
        assert_eq!(maybe_mutate(genes.clone(), 0.0, &mut rng), genes);
    }

    #[test]
    fn mutation_with_full_rate_flips_exactly_one_bit() {
        let mut rng = StdRng::seed_from_u64(5);
        let genes = vec![false; 32];
        let mutated = maybe_mutate(genes.clone(), 1.0, &mut rng);
        let flipped = genes.iter().zip(&mutated).filter(|(a, b)| a != b).count();
        assert_eq!(flipped, 1);
    }

    #[test]
    fn converges_on_small_instance() {
        let optimizer = GeneticOptimizer::new(small_instance(5), config(50)).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let result = optimizer.optimize(1, &mut rng, &SilentReporter).unwrap();

        // {1, 2} and {0, 3} tie at the optimum of 50.
        assert_eq!(result.best_value, 50);
        assert!(result.best_weight <= 5);
    }

    #[test]
    fn same_seed_gives_identical_runs() {
        let instance = ProblemInstance::new(
            (1..=30).collect(),
            (1..=30).map(|w| (w * 7) % 13 + 1).collect(),
            60,
        )
        .unwrap();
        let optimizer = GeneticOptimizer::new(instance, config(30)).unwrap();

        let a = optimizer
            .optimize(1, &mut StdRng::seed_from_u64(9), &SilentReporter)
            .unwrap();
        let b = optimizer
            .optimize(1, &mut StdRng::seed_from_u64(9), &SilentReporter)
            .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn histories_cover_every_generation_and_best_never_drops() {
        let instance = ProblemInstance::new(
            (1..=40).map(|v| v * 3 % 17 + 1).collect(),
            (1..=40).map(|w| w % 11 + 1).collect(),
            80,
        )
        .unwrap();
        let optimizer = GeneticOptimizer::new(instance, config(25)).unwrap();
        let result = optimizer
            .optimize(1, &mut StdRng::seed_from_u64(21), &SilentReporter)
            .unwrap();

        assert_eq!(result.best_history.len(), 25);
        assert_eq!(result.average_history.len(), 25);
        assert!(result.best_history.windows(2).all(|w| w[0] <= w[1]));
        assert!(result
            .best_history
            .iter()
            .zip(&result.average_history)
            .all(|(&best, &avg)| avg <= best as f64));
        assert!(result.best_weight <= 80);
    }

    #[test]
    fn reports_generations_only_when_verbose() {
        let instance = small_instance(5);
        let quiet = GeneticOptimizer::new(instance.clone(), config(5)).unwrap();
        let reporter = RecordingReporter::default();
        quiet
            .optimize(1, &mut StdRng::seed_from_u64(2), &reporter)
            .unwrap();
        assert!(reporter.records().is_empty());

        let verbose = GeneticOptimizer::new(
            instance,
            KnapsackConfig {
                verbose: true,
                ..config(5)
            },
        )
        .unwrap();
        verbose
            .optimize(1, &mut StdRng::seed_from_u64(2), &reporter)
            .unwrap();
        let generations: Vec<usize> = reporter
            .records()
            .into_iter()
            .filter_map(|r| match r {
                Record::Generation { generation, .. } => Some(generation),
                _ => None,
            })
            .collect();
        assert_eq!(generations, vec![1, 2, 3, 4, 5]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn crossover_takes_each_bit_from_a_parent(
            pair in (1..64usize).prop_flat_map(|n| {
                (prop::collection::vec(any::<bool>(), n), prop::collection::vec(any::<bool>(), n))
            }),
            seed in any::<u64>(),
        ) {
            let (a, b) = pair;
            let mut rng = StdRng::seed_from_u64(seed);
            let child = crossover(&a, &b, &mut rng);

            prop_assert_eq!(child.len(), a.len());
            for i in 0..child.len() {
                prop_assert!(child[i] == a[i] || child[i] == b[i]);
            }
        }

        #[test]
        fn mutation_changes_at_most_one_bit(
            genes in prop::collection::vec(any::<bool>(), 0..64),
            rate in 0.0..=1.0f64,
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mutated = maybe_mutate(genes.clone(), rate, &mut rng);

            prop_assert_eq!(mutated.len(), genes.len());
            prop_assert!(genes.iter().zip(&mutated).filter(|(a, b)| a != b).count() <= 1);
        }

        #[test]
        fn every_generation_is_full_and_feasible(
            weights in prop::collection::vec(0..20i64, 8..24),
            seed in any::<u64>(),
        ) {
            let n = weights.len();
            let capacity = weights.iter().sum::<i64>() / 2;
            let instance = ProblemInstance::new((1..=n as i64).collect(), weights, capacity).unwrap();
            let optimizer = GeneticOptimizer::new(instance, KnapsackConfig {
                population_size: 8,
                generations: 1,
                verbose: false,
                ..Default::default()
            }).unwrap();

            let mut rng = StdRng::seed_from_u64(seed);
            let mut population = optimizer.algorithm.evaluate(optimizer.algorithm.generate(&mut rng).unwrap());
            for generation in 1..=10 {
                let previous_best = population[0].value;
                population = optimizer.next_generation(&population, generation, &mut rng).unwrap();

                prop_assert_eq!(population.len(), 8);
                prop_assert!(population.iter().all(|s| s.weight <= capacity as u64));
                prop_assert!(population[0].value >= previous_best);
            }
        }
    }
}
