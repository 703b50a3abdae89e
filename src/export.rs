use crate::errors::Result;
use crate::experiment::ExperimentSummary;
use crate::knapsack_optimizer::RunResult;
use csv::Writer;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct RunRecord {
    pub run: usize,
    pub best_value: u64,
    pub best_weight: u64,
    pub selected_items: String,
}

#[derive(Debug, Serialize)]
pub struct TrajectoryRecord {
    pub generation: usize,
    pub mean_best: f64,
}

/// One row per run; selected items are space-separated indices.
pub fn write_run_results<W: Write>(writer: W, results: &[RunResult]) -> Result<()> {
    let mut writer = Writer::from_writer(writer);

    for (i, result) in results.iter().enumerate() {
        let selected_items = result
            .selected_items()
            .iter()
            .map(|item| item.to_string())
            .collect::<Vec<_>>()
            .join(" ");

        writer.serialize(RunRecord {
            run: i + 1,
            best_value: result.best_value,
            best_weight: result.best_weight,
            selected_items,
        })?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_trajectory<W: Write>(writer: W, summary: &ExperimentSummary) -> Result<()> {
    let mut writer = Writer::from_writer(writer);

    for (i, &mean_best) in summary.mean_best_history.iter().enumerate() {
        writer.serialize(TrajectoryRecord {
            generation: i + 1,
            mean_best,
        })?;
    }

    writer.flush()?;
    Ok(())
}
