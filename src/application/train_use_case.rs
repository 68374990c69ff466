// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the training table       (Layer 4 - data)
//   Step 2: Reconstruct RUL labels        (Layer 3 - domain)
//   Step 3: Fit min-max scaler            (Layer 4 - data)
//   Step 4: Persist scaler                (Layer 6 - infra)
//   Step 5: Normalize the table           (Layer 4 - data)
//   Step 6: Build wrap-policy indexer     (Layer 4 - data)
//   Step 7: Split train/validation        (Layer 4 - data)
//   Step 8: Save config                   (Layer 6 - infra)
//   Step 9: Run training loop             (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    dataset::SequenceDataset,
    indexer::WrapIndexer,
    loader::load_sensor_table,
    normalize::NormalizationParams,
    splitter::split_train_val,
};
use crate::domain::{rul, table};
use crate::infra::{checkpoint::CheckpointManager, scaler_store::ScalerStore};
use crate::ml::trainer::{run_training, TrainOutcome};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it can be saved to disk and reloaded for inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub train_file:     String,
    pub checkpoint_dir: String,
    pub seq_len:        usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub weight_decay:   f64,
    pub hidden_dim:     usize,
    pub num_layers:     usize,
    pub dropout:        f64,
    pub patience:       usize,
    pub target_r2:      f64,
    pub train_fraction: f64,
    pub seed:           u64,
    pub num_workers:    usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_file:     "data/train_FD001.txt".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            seq_len:        50,
            batch_size:     32,
            epochs:         100,
            lr:             1e-4,
            weight_decay:   1e-5,
            hidden_dim:     128,
            num_layers:     3,
            dropout:        0.5,
            patience:       10,
            target_r2:      0.82,
            train_fraction: 0.8,
            seed:           42,
            num_workers:    4,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
    cancel: Arc<AtomicBool>,
}

impl TrainUseCase {
    /// Create a new TrainUseCase with the given configuration
    pub fn new(config: TrainConfig) -> Self {
        Self { config, cancel: Arc::new(AtomicBool::new(false)) }
    }

    /// Cooperative cancellation handle: set it from another thread and
    /// the loop stops at the next epoch boundary, best checkpoint intact.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainOutcome> {
        let cfg = &self.config;
        anyhow::ensure!(cfg.seq_len >= 1, "sequence length must be at least 1");

        // ── Step 1: Load the training sensor table ───────────────────────────
        tracing::info!("Loading training table from '{}'", cfg.train_file);
        let raw_table = load_sensor_table(Path::new(&cfg.train_file))?;
        tracing::info!(
            "Loaded {} rows across {} units",
            raw_table.row_count(),
            raw_table.unit_count()
        );

        // ── Step 2: Reconstruct run-to-failure RUL labels ────────────────────
        // Training units ran to failure, so the label is simply the
        // distance to each unit's final cycle.
        let labels = rul::training_labels(&raw_table);

        // ── Step 3: Fit min-max scaler on the feature columns ────────────────
        // The scaler is fit on the TRAINING table only; test data is
        // rescaled with these same ranges at prediction time.
        let params = NormalizationParams::fit(&raw_table, &table::feature_names())?;

        // ── Step 4: Persist the scaler before anything can fail later ────────
        let scaler_store = ScalerStore::new(cfg.checkpoint_dir.as_str());
        scaler_store.save(&params)?;

        // ── Step 5: Normalize the table ──────────────────────────────────────
        let norm_table = params.transform(&raw_table)?;
        let input_dim  = norm_table.feature_count();

        // ── Step 6: Build the wrap-policy indexer ────────────────────────────
        // Logical epoch length: rows - L + 1 windows, unit choices drawn
        // up front from the seeded RNG so window content is order-independent.
        let num_windows = norm_table
            .row_count()
            .checked_sub(cfg.seq_len - 1)
            .context("training table has fewer rows than one window")?;
        let mut rng  = StdRng::seed_from_u64(cfg.seed);
        let indexer  = WrapIndexer::new(&norm_table, cfg.seq_len, num_windows, &mut rng)?;

        let dataset = SequenceDataset::new(
            Arc::new(norm_table),
            Arc::new(labels),
            indexer,
            cfg.seq_len,
        )?;

        // ── Step 7: Train / validation split ─────────────────────────────────
        let (train_dataset, val_dataset) =
            split_train_val(&dataset, cfg.train_fraction, cfg.seed);

        // ── Step 8: Save config for inference ────────────────────────────────
        // The inferencer needs the window length and model architecture
        // to rebuild the exact model.
        let ckpt_manager = CheckpointManager::new(cfg.checkpoint_dir.as_str());
        ckpt_manager.save_train_config(cfg)?;

        // ── Step 9: Run training loop (Layer 5) ──────────────────────────────
        let outcome = run_training(
            cfg,
            input_dim,
            train_dataset,
            val_dataset,
            ckpt_manager,
            Arc::clone(&self.cancel),
        )?;

        tracing::info!("Training finished: {}", outcome);
        Ok(outcome)
    }
}
