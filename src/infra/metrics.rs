// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: average MSE loss on the training windows
//   - val_loss:   average MSE loss on the validation windows
//   - val_r2:     validation R² score (1 - SS_res/SS_tot)
//   - lr:         the learning rate used during the epoch
//
// Output file: {checkpoint_dir}/metrics.csv
//
// The CSV is the recorded per-epoch series an external plotting
// step renders into the training-curve figure; nothing in this
// crate draws anything.
//
// How to read the metrics:
//   - val_loss diverging from train_loss → overfitting
//   - val_r2 climbing toward the target ends training early
//   - lr halving mid-run marks a validation-loss plateau

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

use crate::domain::errors::PipelineError;

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average MSE over all training batches
    pub train_loss: f64,

    /// Average MSE on the validation set
    /// Should track train_loss — divergence indicates overfitting
    pub val_loss: f64,

    /// Validation R² — 1.0 is a perfect fit, 0.0 no better than
    /// predicting the mean RUL
    pub val_r2: f64,

    /// Learning rate in effect during this epoch
    pub lr: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, val_r2: f64, lr: f64) -> Self {
        Self { epoch, train_loss, val_loss, val_r2, lr }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Coefficient of determination over a validation sweep.
/// Computed in f64 regardless of the f32 inputs; a constant target
/// vector (SS_tot == 0) scores 0 rather than dividing by zero.
pub fn r2_score(targets: &[f32], predictions: &[f32]) -> f64 {
    if targets.is_empty() || targets.len() != predictions.len() {
        return 0.0;
    }

    let n    = targets.len() as f64;
    let mean = targets.iter().map(|&t| t as f64).sum::<f64>() / n;

    let ss_res: f64 = targets
        .iter()
        .zip(predictions)
        .map(|(&t, &p)| (t as f64 - p as f64).powi(2))
        .sum();
    let ss_tot: f64 = targets.iter().map(|&t| (t as f64 - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return 0.0;
    }
    1.0 - ss_res / ss_tot
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| PipelineError::persistence(dir.display().to_string(), e))?;

        let csv_path = dir.join("metrics.csv");

        // Write CSV header only if file is new
        // This allows appending to an existing log across runs
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .map_err(|e| PipelineError::persistence(csv_path.display().to_string(), e))?;
            writeln!(f, "epoch,train_loss,val_loss,val_r2,lr")
                .map_err(|e| PipelineError::persistence(csv_path.display().to_string(), e))?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<(), PipelineError> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| PipelineError::persistence(self.csv_path.display().to_string(), e))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6e}",
            m.epoch, m.train_loss, m.val_loss, m.val_r2, m.lr,
        )
        .map_err(|e| PipelineError::persistence(self.csv_path.display().to_string(), e))?;

        Ok(())
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 2.5, 2.3, 0.2, 1e-4);
        assert!(m.is_improvement(3.0));
        assert!(!m.is_improvement(2.0));
        // Strict: matching the best is not an improvement
        assert!(!m.is_improvement(2.3));
    }

    #[test]
    fn test_r2_perfect_fit() {
        let t = [1.0f32, 2.0, 3.0, 4.0];
        assert_eq!(r2_score(&t, &t), 1.0);
    }

    #[test]
    fn test_r2_mean_prediction_scores_zero() {
        let targets = [1.0f32, 3.0];
        let preds   = [2.0f32, 2.0];
        assert_eq!(r2_score(&targets, &preds), 0.0);
    }

    #[test]
    fn test_r2_known_value() {
        // targets mean=2; SS_tot = 2; SS_res = 0.5 → R² = 0.75
        let targets = [1.0f32, 2.0, 3.0];
        let preds   = [1.5f32, 2.0, 3.0];
        assert!((r2_score(&targets, &preds) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_r2_degenerate_targets() {
        let targets = [2.0f32, 2.0];
        let preds   = [1.0f32, 3.0];
        assert_eq!(r2_score(&targets, &preds), 0.0);
    }

    #[test]
    fn test_logger_appends_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();

        logger.log(&EpochMetrics::new(1, 3.0, 2.9, 0.1, 1e-4)).unwrap();
        logger.log(&EpochMetrics::new(2, 2.5, 2.4, 0.3, 1e-4)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,train_loss,val_loss,val_r2,lr");
        assert!(lines[1].starts_with("1,"));
        assert!(lines[2].starts_with("2,"));
    }
}
