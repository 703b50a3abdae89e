use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

fn padded_range(min: f64, max: f64) -> (f64, f64) {
    let padding = ((max - min) * 0.05).max(1.0);
    (min - padding, max + padding)
}

/// Horizontal box plot of the best value reached by each run.
pub fn plot_best_values(best_values: &[u64], output_path: &Path) -> Result<(), Box<dyn Error>> {
    if best_values.is_empty() {
        return Err("no runs to plot".into());
    }

    let values: Vec<f64> = best_values.iter().map(|&v| v as f64).collect();
    let quartiles = Quartiles::new(values.as_slice());
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = padded_range(min, max);

    let root = BitMapBackend::new(output_path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Distribution of best values ({} runs)", best_values.len()),
            ("sans-serif", 24),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(20)
        .build_cartesian_2d(lo as f32..hi as f32, (0..1).into_segmented())?;

    chart
        .configure_mesh()
        .x_desc("Objective value")
        .y_labels(1)
        .y_label_formatter(&|_| String::new())
        .draw()?;

    chart.draw_series(vec![Boxplot::new_horizontal(
        SegmentValue::CenterOf(0),
        &quartiles,
    )
    .width(40)
    .style(BLUE)])?;

    root.present()?;
    log::info!("Chart saved to {}", output_path.display());
    Ok(())
}

/// Line plot of the run-averaged best fitness, generation 1 first.
pub fn plot_mean_best_history(
    history: &[f64],
    runs: usize,
    output_path: &Path,
) -> Result<(), Box<dyn Error>> {
    if history.is_empty() {
        return Err("no generations to plot".into());
    }

    let min = history.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = history.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = padded_range(min, max);

    let root = BitMapBackend::new(output_path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Mean best fitness per generation ({} runs)", runs),
            ("sans-serif", 24),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(1..history.len().max(2), lo..hi)?;

    chart
        .configure_mesh()
        .x_desc("Generation")
        .y_desc("Mean best value")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            history.iter().enumerate().map(|(i, &y)| (i + 1, y)),
            BLUE.stroke_width(2),
        ))?
        .label("Mean best")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE)
        .draw()?;

    root.present()?;
    log::info!("Chart saved to {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_never_collapses_the_axis() {
        let (lo, hi) = padded_range(60.0, 60.0);
        assert!(lo < 60.0 && hi > 60.0);

        let (lo, hi) = padded_range(0.0, 1000.0);
        assert_eq!((lo, hi), (-50.0, 1050.0));
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let path = std::env::temp_dir().join("genetic_knapsack_never_written.png");
        assert!(plot_best_values(&[], &path).is_err());
        assert!(plot_mean_best_history(&[], 0, &path).is_err());
    }
}
