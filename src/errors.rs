use std::fmt;

/// Where a feasibility search ran out of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingPhase {
    Initialization,
    Generation(usize),
}

impl fmt::Display for SamplingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingPhase::Initialization => write!(f, "initial population"),
            SamplingPhase::Generation(generation) => write!(f, "generation {}", generation),
        }
    }
}

/// Errors that can occur while loading an instance or running the optimizer.
#[derive(Debug, thiserror::Error)]
pub enum KnapsackError {
    #[error("InvalidInstance: {0}")]
    InvalidInstance(String),
    #[error("InitializationFailed: no feasible solution after {attempts} attempts ({phase})")]
    InitializationFailed { attempts: u64, phase: SamplingPhase },
    #[error("InvalidConfiguration: {0}")]
    InvalidConfiguration(String),
    #[error("Io: {0}")]
    Io(#[from] std::io::Error),
    #[error("Csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("Parse: line {line}: {content:?}")]
    Parse { line: usize, content: String },
    #[error("RowCount: expected {expected} items, found {found}")]
    RowCount { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, KnapsackError>;
