// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records one CSV row per training epoch:
//
//   epoch,train_loss,val_loss,val_mae,val_pearson,val_polarity_acc,val_intensity_acc
//   1,1.912300,1.850100,1.213000,0.120000,0.560000,0.310000
//   2,1.741200,1.702900,1.101000,0.241000,0.610000,0.330000
//   ...
//
// Output file: <checkpoint_dir>/metrics.csv
// An existing file is appended to, so repeated runs accumulate.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use crate::ml::evaluator::Evaluation;

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:             usize,
    pub train_loss:        f64,
    pub val_loss:          f64,
    pub val_mae:           f64,
    pub val_pearson:       f64,
    pub val_polarity_acc:  f64,
    pub val_intensity_acc: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val: &Evaluation) -> Self {
        Self {
            epoch,
            train_loss,
            val_loss:          val.loss,
            val_mae:           val.mae,
            val_pearson:       val.pearson,
            val_polarity_acc:  val.polarity_accuracy,
            val_intensity_acc: val.intensity_accuracy,
        }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut w = csv::Writer::from_path(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            w.write_record([
                "epoch",
                "train_loss",
                "val_loss",
                "val_mae",
                "val_pearson",
                "val_polarity_acc",
                "val_intensity_acc",
            ])?;
            w.flush()?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        w.write_record([
            m.epoch.to_string(),
            format!("{:.6}", m.train_loss),
            format!("{:.6}", m.val_loss),
            format!("{:.6}", m.val_mae),
            format!("{:.6}", m.val_pearson),
            format!("{:.6}", m.val_polarity_acc),
            format!("{:.6}", m.val_intensity_acc),
        ])?;
        w.flush()?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn eval(loss: f64) -> Evaluation {
        Evaluation {
            samples:            10,
            loss,
            valence_loss:       1.0,
            polarity_loss:      0.6,
            intensity_loss:     1.2,
            pearson:            0.25,
            mae:                1.1,
            polarity_accuracy:  0.6,
            intensity_accuracy: 0.3,
        }
    }

    #[test]
    fn test_row_copies_validation_metrics() {
        let m = EpochMetrics::new(2, 2.5, &eval(2.3));
        assert_eq!(m.val_loss, 2.3);
        assert_eq!(m.val_pearson, 0.25);
        assert_eq!(m.val_intensity_acc, 0.3);
    }

    #[test]
    fn test_appends_rows_after_header() {
        let tmp    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 2.0, &eval(1.9))).unwrap();
        logger.log(&EpochMetrics::new(2, 1.8, &eval(1.7))).unwrap();

        let text  = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("epoch,train_loss,val_loss"));
        assert_eq!(lines[2], "2,1.800000,1.700000,1.100000,0.250000,0.600000,0.300000");
    }

    #[test]
    fn test_reopening_keeps_existing_rows() {
        let tmp = tempfile::tempdir().unwrap();
        MetricsLogger::new(tmp.path()).unwrap().log(&EpochMetrics::new(1, 1.0, &eval(1.0))).unwrap();
        let again = MetricsLogger::new(tmp.path()).unwrap();
        let text  = fs::read_to_string(again.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
