use crate::errors::{KnapsackError, Result};
use crate::instance::ProblemInstance;
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const HEADER_LINES: usize = 2;

/// Loads a catalog file: two header lines, then one `value weight` pair per line.
pub fn load_instance<P: AsRef<Path>>(
    path: P,
    capacity: i64,
    expected_items: usize,
) -> Result<ProblemInstance> {
    let file = File::open(path.as_ref())?;
    log::info!("Loading items from '{}'...", path.as_ref().display());
    parse_instance(BufReader::new(file), capacity, expected_items)
}

pub fn parse_instance<R: BufRead>(
    reader: R,
    capacity: i64,
    expected_items: usize,
) -> Result<ProblemInstance> {
    let mut values = Vec::with_capacity(expected_items);
    let mut weights = Vec::with_capacity(expected_items);

    for (index, line) in reader.lines().enumerate().skip(HEADER_LINES) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let (value, weight) = parse_row(&line).ok_or_else(|| KnapsackError::Parse {
            line: index + 1,
            content: line.clone(),
        })?;
        values.push(value);
        weights.push(weight);
    }

    if values.len() != expected_items {
        return Err(KnapsackError::RowCount {
            expected: expected_items,
            found: values.len(),
        });
    }

    ProblemInstance::new(values, weights, capacity)
}

fn parse_row(line: &str) -> Option<(i64, i64)> {
    let mut fields = line.split_whitespace();
    let value = fields.next()?.parse().ok()?;
    let weight = fields.next()?.parse().ok()?;

    match fields.next() {
        Some(_) => None,
        None => Some((value, weight)),
    }
}

/// Generates a synthetic catalog with uniform values and normally distributed weights.
pub fn random_instance<R: Rng + ?Sized>(
    items: usize,
    capacity: i64,
    rng: &mut R,
) -> Result<ProblemInstance> {
    let value_range = Uniform::new_inclusive(10i64, 100);
    let weight_distribution = Normal::new(30.0_f64, 10.0)
        .map_err(|e| KnapsackError::InvalidInstance(format!("weight distribution: {}", e)))?;

    let values = (0..items).map(|_| value_range.sample(rng)).collect();
    let weights = (0..items)
        .map(|_| weight_distribution.sample(rng).round().max(1.0) as i64)
        .collect();

    ProblemInstance::new(values, weights, capacity)
}
