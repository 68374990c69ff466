// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Scores every admissible test window with the best checkpoint:
//
//   Step 1: Load the persisted scaler     (Layer 6 - infra)
//   Step 2: Load test table + RUL file    (Layer 4 - data)
//   Step 3: Reconstruct test RUL labels   (Layer 3 - domain)
//   Step 4: Normalize with TRAIN ranges   (Layer 4 - data)
//   Step 5: Enumerate-valid indexer       (Layer 4 - data)
//   Step 6: Load model, score windows     (Layer 5 - ml)
//   Step 7: Write the prediction trace    (CSV)
//
// The scaler is never refit here — test data is rescaled with the
// ranges recorded during training, or the predictions would not
// live in the space the model was trained on.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::SequenceDataset,
    indexer::EnumerateIndexer,
    loader::{load_final_rul, load_sensor_table},
};
use crate::domain::rul;
use crate::infra::{checkpoint::CheckpointManager, scaler_store::ScalerStore};
use crate::ml::inferencer::{Inferencer, RulPrediction};

// ─── Prediction Configuration ────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictConfig {
    pub test_file:      String,
    pub rul_file:       String,
    pub checkpoint_dir: String,
    pub output_file:    String,
    pub batch_size:     usize,
}

// ─── PredictUseCase ───────────────────────────────────────────────────────────
pub struct PredictUseCase {
    config: PredictConfig,
}

impl PredictUseCase {
    pub fn new(config: PredictConfig) -> Self {
        Self { config }
    }

    /// Score the test table and write the per-cycle prediction trace.
    /// Returns the predictions in enumeration order (table unit order,
    /// then ascending cycle).
    pub fn execute(&self) -> Result<Vec<RulPrediction>> {
        let cfg = &self.config;

        // ── Step 1: Load the scaler fitted during training ───────────────────
        let scaler_store = ScalerStore::new(cfg.checkpoint_dir.as_str());
        let params = scaler_store.load()?;

        // ── Step 2: Load test table and terminal-RUL file ────────────────────
        tracing::info!("Loading test table from '{}'", cfg.test_file);
        let raw_table = load_sensor_table(Path::new(&cfg.test_file))?;
        let final_rul = load_final_rul(Path::new(&cfg.rul_file))?;

        // ── Step 3: Reconstruct RUL labels for truncated units ───────────────
        // Unlike training units, a test unit's last logged cycle still has
        // final_rul(unit) cycles of life left.
        let labels = rul::test_labels(&raw_table, &final_rul)?;

        // ── Step 4: Rescale with the training ranges ─────────────────────────
        let norm_table = params.transform(&raw_table)?;
        let input_dim  = norm_table.feature_count();

        // ── Step 5: Enumerate every admissible window ────────────────────────
        // The window length must match training, so it comes from the
        // persisted train config, not from a CLI flag.
        let ckpt_manager = CheckpointManager::new(cfg.checkpoint_dir.as_str());
        let train_cfg    = ckpt_manager.load_train_config()?;
        let indexer      = EnumerateIndexer::new(&norm_table, train_cfg.seq_len)?;

        let dataset = SequenceDataset::new(
            Arc::new(norm_table),
            Arc::new(labels),
            indexer,
            train_cfg.seq_len,
        )?;

        // ── Step 6: Load the best checkpoint and score all windows ───────────
        let inferencer  = Inferencer::from_checkpoint(&ckpt_manager, input_dim)?;
        let predictions = inferencer.predict_all(&dataset, cfg.batch_size)?;

        // ── Step 7: Write the prediction trace ───────────────────────────────
        self.write_trace(&predictions)?;
        Ok(predictions)
    }

    /// One CSV row per scored window: the window's unit, its final
    /// cycle, the reconstructed truth and the model's estimate.
    fn write_trace(&self, predictions: &[RulPrediction]) -> Result<()> {
        let mut csv = String::from("unit,cycle,actual_rul,predicted_rul\n");
        for p in predictions {
            csv.push_str(&format!(
                "{},{},{:.2},{:.2}\n",
                p.unit_id, p.cycle, p.actual_rul, p.predicted_rul
            ));
        }

        fs::write(&self.config.output_file, csv)
            .with_context(|| format!("Cannot write predictions to '{}'", self.config.output_file))?;
        tracing::info!(
            "Wrote {} predictions to '{}'",
            predictions.len(),
            self.config.output_file
        );
        Ok(())
    }
}
