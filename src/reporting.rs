//! Progress and result sinks.
//!
//! The optimizer and the experiment runner never print directly; they hand
//! [`Record`]s to a [`Reporter`]. The console and log file sinks render the
//! same text, and [`TeeReporter`] duplicates records to several sinks.

use colored::Colorize;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// A structured progress or result record.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    RunStarted {
        run: usize,
        runs: usize,
    },
    Generation {
        run: usize,
        generation: usize,
        best: u64,
        average: f64,
    },
    RunFinished {
        run: usize,
        best_value: u64,
        best_weight: u64,
    },
    Summary {
        runs: usize,
        mean: f64,
        std_dev: f64,
        max: u64,
        min: u64,
    },
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::RunStarted { run, runs } => {
                write!(f, "\n========== Run {}/{} ==========", run, runs)
            }
            Record::Generation {
                generation,
                best,
                average,
                ..
            } => write!(
                f,
                "Generation {}: best = {} average = {:.2}",
                generation, best, average
            ),
            Record::RunFinished {
                best_value,
                best_weight,
                ..
            } => write!(f, ">>> Best value: {} (weight = {})", best_value, best_weight),
            Record::Summary {
                runs,
                mean,
                std_dev,
                max,
                min,
            } => {
                writeln!(f, "\n========== Summary of {} runs ==========", runs)?;
                writeln!(f, "Mean of best values : {:.2}", mean)?;
                writeln!(f, "Standard deviation  : {:.2}", std_dev)?;
                writeln!(f, "Best value obtained : {}", max)?;
                writeln!(f, "Worst value obtained: {}", min)?;
                write!(f, "==========================================")
            }
        }
    }
}

pub trait Reporter: Send + Sync {
    fn report(&self, record: &Record);
}

/// Prints records to stdout, highlighting generation and run labels.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, record: &Record) {
        match record {
            Record::Generation {
                generation,
                best,
                average,
                ..
            } => println!(
                "{}: best = {} average = {:.2}",
                format!("Generation {}", generation).bold().red(),
                best,
                average
            ),
            Record::RunStarted { .. } => println!("{}", record.to_string().bold()),
            Record::Summary { .. } => println!("{}", record.to_string().green()),
            Record::RunFinished { .. } => println!("{}", record),
        }
    }
}

/// Appends uncoloured records to a file, flushing after each one.
#[derive(Debug)]
pub struct LogFileReporter {
    writer: Mutex<BufWriter<File>>,
}

impl LogFileReporter {
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl Reporter for LogFileReporter {
    fn report(&self, record: &Record) {
        let Ok(mut writer) = self.writer.lock() else {
            log::warn!("log file writer is poisoned, dropping record");
            return;
        };

        if let Err(e) = writeln!(writer, "{}", record).and_then(|_| writer.flush()) {
            log::warn!("failed to write to log file: {}", e);
        }
    }
}

/// Fans every record out to all of its sinks, in order.
#[derive(Default)]
pub struct TeeReporter {
    sinks: Vec<Box<dyn Reporter>>,
}

impl TeeReporter {
    pub fn new(sinks: Vec<Box<dyn Reporter>>) -> Self {
        Self { sinks }
    }

    pub fn with(mut self, sink: impl Reporter + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl Reporter for TeeReporter {
    fn report(&self, record: &Record) {
        for sink in self.sinks.iter() {
            sink.report(record);
        }
    }
}

#[derive(Debug, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn report(&self, _record: &Record) {}
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    records: Mutex<Vec<Record>>,
}

impl RecordingReporter {
    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

impl<R: Reporter + ?Sized> Reporter for std::sync::Arc<R> {
    fn report(&self, record: &Record) {
        (**self).report(record);
    }
}
