use crate::errors::{KnapsackError, Result};

/// Immutable item catalog: parallel value/weight columns and a capacity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProblemInstance {
    values: Vec<u64>,
    weights: Vec<u64>,
    capacity: u64,
}

impl ProblemInstance {
    pub fn new(values: Vec<i64>, weights: Vec<i64>, capacity: i64) -> Result<Self> {
        if values.len() != weights.len() {
            return Err(KnapsackError::InvalidInstance(format!(
                "{} values but {} weights",
                values.len(),
                weights.len()
            )));
        }

        if capacity < 0 {
            return Err(KnapsackError::InvalidInstance(format!(
                "negative capacity {}",
                capacity
            )));
        }

        let values = non_negative(values, "value")?;
        let weights = non_negative(weights, "weight")?;
        checked_total(&values, "value")?;
        checked_total(&weights, "weight")?;

        Ok(Self {
            values,
            weights,
            capacity: capacity as u64,
        })
    }

    pub fn value_of(&self, index: usize) -> u64 {
        self.values[index]
    }

    pub fn weight_of(&self, index: usize) -> u64 {
        self.weights[index]
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

fn non_negative(column: Vec<i64>, what: &str) -> Result<Vec<u64>> {
    column
        .into_iter()
        .enumerate()
        .map(|(index, x)| {
            u64::try_from(x).map_err(|_| {
                KnapsackError::InvalidInstance(format!("negative {} {} at item {}", what, x, index))
            })
        })
        .collect()
}

// Every selection sums to at most the column total, so `evaluate` cannot overflow.
fn checked_total(column: &[u64], what: &str) -> Result<u64> {
    column
        .iter()
        .try_fold(0u64, |total, &x| total.checked_add(x))
        .ok_or_else(|| KnapsackError::InvalidInstance(format!("total {} overflows u64", what)))
}

/// Sums values and weights of the selected items, returning `(total_value, total_weight)`.
pub fn evaluate(instance: &ProblemInstance, genes: &[bool]) -> (u64, u64) {
    debug_assert_eq!(genes.len(), instance.size());

    genes
        .iter()
        .enumerate()
        .filter(|&(_, &included)| included)
        .fold((0, 0), |(value, weight), (i, _)| {
            (value + instance.value_of(i), weight + instance.weight_of(i))
        })
}

pub fn is_feasible(total_weight: u64, capacity: u64) -> bool {
    total_weight <= capacity
}
