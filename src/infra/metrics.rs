// ============================================================
// Layer 6 — Training History & Metrics Logger
// ============================================================
// The trainer returns one EpochMetrics per epoch. Callers can
// keep the history in memory or append it to a CSV file:
//
//   epoch,train_loss,train_accuracy,val_loss,val_accuracy
//   1,0.693100,0.512000,0.690200,0.530000
//   2,0.612400,0.688000,0.601100,0.702000
//   ...
//
// Validation columns are left empty when the run had no
// validation partition.
//
// Reading the numbers:
//   - Loss should decrease each epoch
//   - val_loss rising while train_loss falls → overfitting

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

/// Metrics for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean binary cross-entropy over the training samples
    pub train_loss: f64,

    /// Fraction of training samples classified correctly
    pub train_accuracy: f64,

    /// Mean binary cross-entropy on the validation partition
    pub val_loss: Option<f64>,

    /// Fraction of validation samples classified correctly
    pub val_accuracy: Option<f64>,
}

impl EpochMetrics {
    pub fn new(
        epoch:          usize,
        train_loss:     f64,
        train_accuracy: f64,
        val_loss:       Option<f64>,
        val_accuracy:   Option<f64>,
    ) -> Self {
        Self { epoch, train_loss, train_accuracy, val_loss, val_accuracy }
    }

    /// One-line console form, e.g.
    /// `loss=0.4213 | accuracy=0.8125 | val_loss=0.3990 | val_accuracy=0.8400`
    pub fn summary(&self) -> String {
        let mut line = format!("loss={:.4} | accuracy={:.4}", self.train_loss, self.train_accuracy);
        if let (Some(loss), Some(acc)) = (self.val_loss, self.val_accuracy) {
            line.push_str(&format!(" | val_loss={loss:.4} | val_accuracy={acc:.4}"));
        }
        line
    }

    fn csv_row(&self) -> String {
        let opt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
        format!(
            "{},{:.6},{:.6},{},{}",
            self.epoch,
            self.train_loss,
            self.train_accuracy,
            opt(self.val_loss),
            opt(self.val_accuracy),
        )
    }
}

/// Per-epoch record of a full training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    epochs: Vec<EpochMetrics>,
}

impl TrainingHistory {
    pub fn push(&mut self, m: EpochMetrics) {
        self.epochs.push(m);
    }

    pub fn epochs(&self) -> &[EpochMetrics] {
        &self.epochs
    }

    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, writing the header if the file is new.
    /// An existing file is appended to, so several runs can share one log.
    pub fn new(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();

        if let Some(dir) = csv_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "epoch,train_loss,train_accuracy,val_loss,val_accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{}", m.csv_row())?;
        Ok(())
    }

    pub fn log_history(&self, history: &TrainingHistory) -> Result<()> {
        for m in history.epochs() {
            self.log(m)?;
        }
        tracing::info!(
            "Wrote {} epochs of metrics to '{}'",
            history.len(),
            self.csv_path.display()
        );
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_omits_missing_validation() {
        let m = EpochMetrics::new(1, 0.5, 0.75, None, None);
        assert_eq!(m.summary(), "loss=0.5000 | accuracy=0.7500");

        let m = EpochMetrics::new(1, 0.5, 0.75, Some(0.25), Some(1.0));
        assert!(m.summary().ends_with("val_loss=0.2500 | val_accuracy=1.0000"));
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_epoch() {
        let path = std::env::temp_dir()
            .join(format!("ad-detect-metrics-{}", std::process::id()))
            .join("history.csv");
        let _ = fs::remove_file(&path);

        let mut history = TrainingHistory::default();
        history.push(EpochMetrics::new(1, 0.7, 0.5, Some(0.6), Some(0.55)));
        history.push(EpochMetrics::new(2, 0.4, 0.9, None, None));

        let logger = MetricsLogger::new(&path).unwrap();
        logger.log_history(&history).unwrap();

        let text  = fs::read_to_string(&logger.csv_path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,train_loss,train_accuracy,val_loss,val_accuracy");
        assert_eq!(lines[1], "1,0.700000,0.500000,0.600000,0.550000");
        assert_eq!(lines[2], "2,0.400000,0.900000,,");
    }
}
