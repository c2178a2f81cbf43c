// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per epoch so learning curves can be
// plotted after (or during) a run. Columns:
//
//   epoch,train_loss,val_loss,accuracy,lr
//
// `accuracy` is task-defined: fraction of correctly predicted
// positions for the sequence tasks, fraction of correctly
// labelled sequences for the classifier.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

/// One row of metrics for a single training epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub val_loss: f64,
    pub accuracy: f64,
    /// Learning rate in effect at the end of the epoch.
    pub lr: f64,
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so a
    /// resumed run appends to the same log.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut file = fs::File::create(&csv_path)?;
            writeln!(file, "epoch,train_loss,val_loss,accuracy,lr")?;
            tracing::debug!("Created metrics CSV '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, metrics: &EpochMetrics) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            file,
            "{},{:.6},{:.6},{:.6},{:.8}",
            metrics.epoch, metrics.train_loss, metrics.val_loss, metrics.accuracy, metrics.lr,
        )?;

        tracing::debug!(
            "Logged epoch {}: train_loss={:.4}, val_loss={:.4}, accuracy={:.3}",
            metrics.epoch,
            metrics.train_loss,
            metrics.val_loss,
            metrics.accuracy,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_append_under_one_header() {
        let dir = std::env::temp_dir().join(format!(
            "metaformer-metrics-test-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);

        let logger = MetricsLogger::new(&dir).unwrap();
        logger
            .log(&EpochMetrics { epoch: 1, train_loss: 1.5, val_loss: 1.6, accuracy: 0.3, lr: 1e-3 })
            .unwrap();
        logger
            .log(&EpochMetrics { epoch: 2, train_loss: 1.1, val_loss: 1.2, accuracy: 0.5, lr: 9e-4 })
            .unwrap();

        let contents = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,train_loss,val_loss,accuracy,lr");
        assert!(lines[1].starts_with("1,1.5"));
        assert!(lines[2].starts_with("2,1.1"));
    }
}
