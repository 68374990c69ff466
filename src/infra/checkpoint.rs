// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// What gets saved per training run:
//   1. model_best.mpk.gz     — weights of the best epoch so far
//   2. checkpoint_meta.json  — (epoch, val_loss, val_r2) of that epoch
//   3. regressor.json        — model architecture config
//   4. train_config.json     — full training hyperparameters
//
// Why save the configs separately?
//   When loading for inference, we need the exact architecture
//   (input width, hidden width, layer count) to rebuild the model
//   before loading the weights into it. A structural mismatch is
//   refused up front as IncompatibleArchitecture.
//
// Write discipline:
//   Every file — weights included — is written to a temporary
//   sibling and renamed over the destination. A crash mid-write
//   can never corrupt the previously persisted checkpoint, and
//   no partial state is left behind. No two runs may share one
//   checkpoint directory.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::fs;
use std::path::{Path, PathBuf};

use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::domain::errors::PipelineError;
use crate::ml::model::{SequenceRegressor, SequenceRegressorConfig};

/// Base name of the weights file; CompactRecorder appends ".mpk.gz".
const WEIGHTS_BASE: &str = "model_best";
/// Temporary base for the atomic weights swap. Deliberately has no
/// dot: the recorder replaces a final extension, so "model_best.tmp"
/// would collapse straight onto the real file name.
const WEIGHTS_TMP_BASE: &str = "model_best_tmp";

const META_FILE:      &str = "checkpoint_meta.json";
const REGRESSOR_FILE: &str = "regressor.json";
const TRAIN_CFG_FILE: &str = "train_config.json";

/// Epoch provenance of the persisted best checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub epoch:    usize,
    pub val_loss: f64,
    pub val_r2:   f64,
}

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Overwrite the best checkpoint with the current model state.
    /// Called only when the validation loss strictly improved.
    pub fn save_best<B: AutodiffBackend>(
        &self,
        model: &SequenceRegressor<B>,
        meta:  &CheckpointMeta,
    ) -> Result<(), PipelineError> {
        let tmp_base = self.dir.join(WEIGHTS_TMP_BASE);

        CompactRecorder::new()
            .record(model.clone().into_record(), tmp_base.clone())
            .map_err(|e| PipelineError::persistence(tmp_base.display().to_string(), e))?;

        // Swap the finished file into place
        let tmp_file   = self.dir.join(format!("{WEIGHTS_TMP_BASE}.mpk.gz"));
        let final_file = self.dir.join(format!("{WEIGHTS_BASE}.mpk.gz"));
        fs::rename(&tmp_file, &final_file).map_err(|e| {
            // Leave nothing half-written behind
            fs::remove_file(&tmp_file).ok();
            PipelineError::persistence(final_file.display().to_string(), e)
        })?;

        self.write_json(META_FILE, meta)?;
        tracing::debug!("Saved checkpoint: epoch {}", meta.epoch);
        Ok(())
    }

    /// Load the best checkpoint's weights into `model`.
    ///
    /// The architecture recorded at save time must match the
    /// instantiated model's structural dimensions, otherwise loading
    /// fails with IncompatibleArchitecture before touching weights.
    pub fn load_model<B: Backend>(
        &self,
        model:    SequenceRegressor<B>,
        expected: &SequenceRegressorConfig,
        device:   &B::Device,
    ) -> Result<SequenceRegressor<B>, PipelineError> {
        let saved: SequenceRegressorConfig = self.read_json(REGRESSOR_FILE)?;
        check_architecture(&saved, expected)?;

        let meta = self.load_meta()?;
        tracing::info!(
            "Loading checkpoint from epoch {} (val_loss={:.4})",
            meta.epoch, meta.val_loss
        );

        let path = self.dir.join(WEIGHTS_BASE);
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .map_err(|e| {
                PipelineError::persistence(
                    path.display().to_string(),
                    format!("{e} (have you trained the model first?)"),
                )
            })?;

        Ok(model.load_record(record))
    }

    /// Persist the model architecture so inference can rebuild it.
    pub fn save_regressor_config(&self, cfg: &SequenceRegressorConfig) -> Result<(), PipelineError> {
        self.write_json(REGRESSOR_FILE, cfg)
    }

    /// Persist the full training configuration.
    /// Must be called before training starts.
    pub fn save_train_config(&self, cfg: &TrainConfig) -> Result<(), PipelineError> {
        self.write_json(TRAIN_CFG_FILE, cfg)
    }

    /// Load the training configuration saved by a previous run.
    pub fn load_train_config(&self) -> Result<TrainConfig, PipelineError> {
        self.read_json(TRAIN_CFG_FILE)
    }

    /// Load the provenance of the persisted best checkpoint.
    pub fn load_meta(&self) -> Result<CheckpointMeta, PipelineError> {
        self.read_json(META_FILE)
    }

    // ── Atomic JSON helpers ───────────────────────────────────────────────────
    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), PipelineError> {
        let final_path = self.dir.join(name);
        let tmp_path   = self.dir.join(format!("{name}.tmp"));

        let json = serde_json::to_string_pretty(value)
            .map_err(|e| PipelineError::persistence(final_path.display().to_string(), e))?;

        fs::write(&tmp_path, json)
            .map_err(|e| PipelineError::persistence(tmp_path.display().to_string(), e))?;
        fs::rename(&tmp_path, &final_path).map_err(|e| {
            fs::remove_file(&tmp_path).ok();
            PipelineError::persistence(final_path.display().to_string(), e)
        })
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, PipelineError> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .map_err(|e| PipelineError::persistence(path.display().to_string(), e))?;
        serde_json::from_str(&json)
            .map_err(|e| PipelineError::persistence(path.display().to_string(), e))
    }
}

/// Structural comparison between a saved architecture and the model
/// being instantiated. Dropout is a runtime knob, not structure.
fn check_architecture(
    saved:    &SequenceRegressorConfig,
    expected: &SequenceRegressorConfig,
) -> Result<(), PipelineError> {
    if saved.input_dim != expected.input_dim
        || saved.hidden_dim != expected.hidden_dim
        || saved.num_layers != expected.num_layers
    {
        return Err(PipelineError::IncompatibleArchitecture(format!(
            "checkpoint has input={}, hidden={}, layers={} but the model was built with input={}, hidden={}, layers={}",
            saved.input_dim, saved.hidden_dim, saved.num_layers,
            expected.input_dim, expected.hidden_dim, expected.num_layers
        )));
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_architecture_check_accepts_matching_dims() {
        let saved    = SequenceRegressorConfig::new(24, 128, 3);
        let expected = SequenceRegressorConfig::new(24, 128, 3).with_dropout(0.0);
        assert!(check_architecture(&saved, &expected).is_ok());
    }

    #[test]
    fn test_architecture_check_rejects_dimension_drift() {
        let saved = SequenceRegressorConfig::new(24, 128, 3);
        for expected in [
            SequenceRegressorConfig::new(25, 128, 3),
            SequenceRegressorConfig::new(24, 64, 3),
            SequenceRegressorConfig::new(24, 128, 2),
        ] {
            assert!(matches!(
                check_architecture(&saved, &expected),
                Err(PipelineError::IncompatibleArchitecture(_))
            ));
        }
    }

    #[test]
    fn test_train_config_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let mgr  = CheckpointManager::new(dir.path());
        let cfg  = TrainConfig::default();

        mgr.save_train_config(&cfg).unwrap();
        let loaded = mgr.load_train_config().unwrap();
        assert_eq!(loaded.seq_len, cfg.seq_len);
        assert_eq!(loaded.hidden_dim, cfg.hidden_dim);
        assert_eq!(loaded.lr, cfg.lr);

        // No temporary file is left behind by the atomic write
        assert!(!dir.path().join(format!("{TRAIN_CFG_FILE}.tmp")).exists());
    }

    #[test]
    fn test_meta_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path());

        mgr.write_json(META_FILE, &CheckpointMeta { epoch: 7, val_loss: 0.42, val_r2: 0.81 })
            .unwrap();
        let meta = mgr.load_meta().unwrap();
        assert_eq!(meta.epoch, 7);
        assert_eq!(meta.val_loss, 0.42);
    }

    #[test]
    fn test_missing_config_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path());
        assert!(matches!(
            mgr.load_train_config(),
            Err(PipelineError::Persistence { .. })
        ));
    }
}
