// ============================================================
// Layer 6 — Metrics Stream
// ============================================================
// Appends scalar time series to a CSV file in the run directory
// so a dashboard can tail it while training runs.
//
// Three series are written:
//   Loss/train      step = epoch * batches_per_epoch + batch_idx
//   Accuracy/train  same step as Loss/train
//   Accuracy/test   step = epoch * validation_set_size
//
// Output file: <save_dir>/scalars.csv
//
// Example CSV output:
//   tag,step,value,wall_time
//   Loss/train,11,0.693147,1760862000.125
//   Accuracy/train,11,0.500000,1760862000.125
//   Accuracy/test,10,0.600000,1760862004.870
//
// Each record is flushed before add_scalar returns.
//
// Reference: csv crate documentation
//            Rust Book §12 (I/O and File Handling)

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const LOSS_TRAIN: &str     = "Loss/train";
pub const ACCURACY_TRAIN: &str = "Accuracy/train";
pub const ACCURACY_TEST: &str  = "Accuracy/test";

/// One point of one scalar series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarEvent {
    pub tag:       String,
    pub step:      usize,
    pub value:     f64,
    /// Seconds since the Unix epoch
    pub wall_time: f64,
}

pub struct MetricsWriter {
    csv_path: PathBuf,
}

impl MetricsWriter {
    /// Open (or create) the scalar stream in `dir`.
    /// Writes the CSV header only if the file is new, so repeated
    /// runs into the same directory extend one stream.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("scalars.csv");
        if !csv_path.exists() {
            let mut w = csv::Writer::from_path(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            w.write_record(["tag", "step", "value", "wall_time"])?;
            w.flush()?;
            tracing::debug!("Created metrics stream '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn add_scalar(&self, tag: &str, value: f64, step: usize) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;

        let mut w = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        w.serialize(ScalarEvent {
            tag: tag.to_string(),
            step,
            value,
            wall_time: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
        })?;
        w.flush()?;
        Ok(())
    }

    #[cfg(test)]
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Read every event back, used by tests across the crate.
    pub(crate) fn read_events(path: &Path) -> Vec<ScalarEvent> {
        csv::Reader::from_path(path)
            .unwrap()
            .deserialize()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn test_events_append_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let writer = MetricsWriter::new(dir.path()).unwrap();

        writer.add_scalar(LOSS_TRAIN, 0.7, 0).unwrap();
        writer.add_scalar(ACCURACY_TEST, 0.5, 10).unwrap();

        let events = read_events(writer.csv_path());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].tag, LOSS_TRAIN);
        assert_eq!(events[1].step, 10);
        assert_eq!(events[1].value, 0.5);
    }

    #[test]
    fn test_reopening_keeps_single_header() {
        let dir = tempfile::tempdir().unwrap();
        MetricsWriter::new(dir.path()).unwrap().add_scalar(LOSS_TRAIN, 1.0, 0).unwrap();
        MetricsWriter::new(dir.path()).unwrap().add_scalar(LOSS_TRAIN, 0.9, 1).unwrap();

        let events = read_events(&dir.path().join("scalars.csv"));
        assert_eq!(events.len(), 2);
    }
}
