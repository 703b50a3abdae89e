use chrono::Local;
use clap::{arg, ArgMatches, Command};
use genetic_knapsack::demo_data::{load_instance, random_instance};
use genetic_knapsack::experiment::{seeded_rngs, ExperimentRunner};
use genetic_knapsack::export::{write_run_results, write_trajectory};
use genetic_knapsack::reporting::{ConsoleReporter, LogFileReporter, TeeReporter};
use genetic_knapsack::visualization::{plot_best_values, plot_mean_best_history};
use genetic_knapsack::{KnapsackConfig, ProblemInstance};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::fs::{self, File};
use std::path::PathBuf;
use std::process;

const CAPACITY: i64 = 1550;
const ITEMS: usize = 100;
// Keeps the generated instance off the stream handed to run 0.
const INSTANCE_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

fn instance_seed(seed: u64) -> u64 {
    seed ^ INSTANCE_SEED_SALT
}

fn cli() -> Command {
    Command::new("genetic_knapsack")
        .about("Searches a 0/1 knapsack with a generational genetic algorithm")
        .arg(
            arg!(--instance [PATH] "Item file: two header lines, then one `value weight` pair per line")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(--capacity [CAPACITY] "Knapsack capacity")
                .default_value("1550")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            arg!(--items [ITEMS] "Number of items (decision vector length)")
                .default_value("100")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(--population [SIZE] "Population size")
                .default_value("20")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(--"mutation-rate" [RATE] "Probability of a single bit flip per child")
                .default_value("0.05")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            arg!(--generations [GENERATIONS] "Generations per run")
                .default_value("100")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(--runs [RUNS] "Number of independent runs")
                .default_value("2")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(--"max-attempts" [ATTEMPTS] "Infeasible candidates tolerated in a row before giving up")
                .default_value("1000000")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            arg!(--seed [SEED] "Seed for reproducible runs; run i uses seed + i")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(arg!(--parallel "Dispatch runs on the rayon thread pool"))
        .arg(arg!(--quiet "Do not report per-generation progress"))
        .arg(
            arg!(--log [PATH] "File receiving a copy of the console output")
                .default_value("runs_output.txt")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(--figs [DIR] "Directory for the generated charts")
                .default_value("figs")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(--csv [PATH] "Per-run results file, timestamped by default")
                .value_parser(clap::value_parser!(PathBuf)),
        )
}

fn build_config(matches: &ArgMatches) -> KnapsackConfig {
    let defaults = KnapsackConfig::default();

    KnapsackConfig {
        population_size: matches
            .get_one::<usize>("population")
            .copied()
            .unwrap_or(defaults.population_size),
        mutation_rate: matches
            .get_one::<f64>("mutation-rate")
            .copied()
            .unwrap_or(defaults.mutation_rate),
        generations: matches
            .get_one::<usize>("generations")
            .copied()
            .unwrap_or(defaults.generations),
        runs: matches
            .get_one::<usize>("runs")
            .copied()
            .unwrap_or(defaults.runs),
        max_attempts: matches
            .get_one::<u64>("max-attempts")
            .copied()
            .unwrap_or(defaults.max_attempts),
        verbose: !matches.get_flag("quiet"),
        parallel: matches.get_flag("parallel"),
        seed: matches.get_one::<u64>("seed").copied(),
    }
}

fn prepare_instance(
    matches: &ArgMatches,
    config: &KnapsackConfig,
) -> Result<ProblemInstance, Box<dyn Error>> {
    let capacity = matches
        .get_one::<i64>("capacity")
        .copied()
        .unwrap_or(CAPACITY);
    let items = matches.get_one::<usize>("items").copied().unwrap_or(ITEMS);

    let instance = match matches.get_one::<PathBuf>("instance") {
        Some(path) => load_instance(path, capacity, items)?,
        None => {
            log::info!("No instance file given, generating {} random items", items);
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(instance_seed(seed)),
                None => StdRng::from_entropy(),
            };
            random_instance(items, capacity, &mut rng)?
        }
    };

    log::info!(
        "Instance ready: {} items, capacity {}",
        instance.size(),
        instance.capacity()
    );
    Ok(instance)
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let config = build_config(matches);
    config.validate()?;
    let instance = prepare_instance(matches, &config)?;

    let mut reporter = TeeReporter::default().with(ConsoleReporter);
    if let Some(path) = matches.get_one::<PathBuf>("log") {
        reporter = reporter.with(LogFileReporter::create(path)?);
    }

    let experiment =
        ExperimentRunner::new(instance, config.clone())?.run(seeded_rngs(config.seed), &reporter)?;

    let figs = matches
        .get_one::<PathBuf>("figs")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("figs"));
    fs::create_dir_all(&figs)?;
    plot_best_values(
        &experiment.summary.best_values,
        &figs.join("boxplot_values.png"),
    )?;
    plot_mean_best_history(
        &experiment.summary.mean_best_history,
        config.runs,
        &figs.join("best_fitness_evolution.png"),
    )?;

    let csv_path = match matches.get_one::<PathBuf>("csv") {
        Some(path) => path.clone(),
        None => {
            let date_str = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
            PathBuf::from(format!("results_{}.csv", date_str))
        }
    };
    write_run_results(File::create(&csv_path)?, &experiment.results)?;
    let trajectory_path = csv_path.with_extension("trajectory.csv");
    write_trajectory(File::create(&trajectory_path)?, &experiment.summary)?;
    log::info!(
        "Results written to {} and {}",
        csv_path.display(),
        trajectory_path.display()
    );

    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run(&cli().get_matches()) {
        log::error!("{}", e);
        process::exit(1);
    }
}
