// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records MLP training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:         the epoch number (1, 2, 3, ...)
//   - train_loss:    mean cross-entropy over the train partition
//   - test_loss:     cross-entropy on the held-out partition
//   - test_accuracy: fraction of held-out rows classified correctly
//
// Output file: <model_dir>/<model stem>_metrics.csv
//
// Example CSV output:
//   epoch,train_loss,test_loss,test_accuracy
//   1,1.102331,1.087412,0.366667
//   2,1.071904,1.058250,0.566667
//   ...
//
// Each training run starts a fresh file, so the CSV always
// describes the artifact sitting next to it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean cross-entropy loss over all training batches
    pub train_loss: f64,

    /// Cross-entropy loss on the held-out partition
    pub test_loss: f64,

    /// Range: [0.0, 1.0]
    pub test_accuracy: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, test_loss: f64, test_accuracy: f64) -> Self {
        Self { epoch, train_loss, test_loss, test_accuracy }
    }

    /// Returns true if this epoch improved over the previous best test_loss
    pub fn is_improvement(&self, best_test_loss: f64) -> bool {
        self.test_loss < best_test_loss
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create (or truncate) the CSV and write its header row.
    pub fn create(csv_path: impl AsRef<Path>) -> Result<Self> {
        let csv_path = csv_path.as_ref().to_path_buf();

        if let Some(dir) = csv_path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }

        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create metrics CSV '{}'", csv_path.display()))?;
        writeln!(f, "epoch,train_loss,test_loss,test_accuracy")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Metrics file that belongs next to a given artifact.
    pub fn path_for_artifact(artifact: &Path) -> PathBuf {
        let stem = artifact
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        artifact.with_file_name(format!("{stem}_metrics.csv"))
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.test_loss,
            m.test_accuracy,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
