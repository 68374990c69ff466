// ============================================================
// Layer 6 — Scaler Store
// ============================================================
// Persists the fitted min-max parameters next to the checkpoint
// so inference rescales test data with the training ranges.
//
// The store never refits: parameters are written once during
// training and only ever read back afterwards. The same
// atomic-swap discipline as the checkpoint files applies.

use std::fs;
use std::path::PathBuf;

use crate::data::normalize::NormalizationParams;
use crate::domain::errors::PipelineError;

const SCALER_FILE: &str = "scaler.json";

pub struct ScalerStore {
    dir: PathBuf,
}

impl ScalerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Write the fitted parameters, replacing any previous file atomically.
    pub fn save(&self, params: &NormalizationParams) -> Result<(), PipelineError> {
        let final_path = self.dir.join(SCALER_FILE);
        let tmp_path   = self.dir.join(format!("{SCALER_FILE}.tmp"));

        let blob = params.persist()?;
        fs::write(&tmp_path, blob)
            .map_err(|e| PipelineError::persistence(tmp_path.display().to_string(), e))?;
        fs::rename(&tmp_path, &final_path).map_err(|e| {
            fs::remove_file(&tmp_path).ok();
            PipelineError::persistence(final_path.display().to_string(), e)
        })?;

        tracing::debug!("Saved scaler parameters to '{}'", final_path.display());
        Ok(())
    }

    /// Load previously fitted parameters.
    /// Fails if training has not produced a scaler yet.
    pub fn load(&self) -> Result<NormalizationParams, PipelineError> {
        let path = self.dir.join(SCALER_FILE);
        let blob = fs::read(&path).map_err(|e| {
            PipelineError::persistence(
                path.display().to_string(),
                format!("{e} (run 'train' before 'predict')"),
            )
        })?;
        NormalizationParams::load(&blob)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::{feature_names, RawRecord, SensorTable};

    fn fitted_params() -> NormalizationParams {
        let rows = vec![
            RawRecord { unit_id: 1, cycle: 1, settings: vec![0.0; 3], sensors: vec![1.0; 21] },
            RawRecord { unit_id: 1, cycle: 2, settings: vec![2.0; 3], sensors: vec![3.5; 21] },
        ];
        let table = SensorTable::new(rows).unwrap();
        NormalizationParams::fit(&table, &feature_names()).unwrap()
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ScalerStore::new(dir.path());
        let params = fitted_params();

        store.save(&params).unwrap();
        let loaded = store.load().unwrap();

        for (a, b) in params.columns().iter().zip(loaded.columns()) {
            assert_eq!(a.min.to_bits(), b.min.to_bits());
            assert_eq!(a.max.to_bits(), b.max.to_bits());
        }
        assert!(!dir.path().join(format!("{SCALER_FILE}.tmp")).exists());
    }

    #[test]
    fn test_load_without_training_fails() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ScalerStore::new(dir.path());
        assert!(matches!(store.load(), Err(PipelineError::Persistence { .. })));
    }

    #[test]
    fn test_save_overwrites_previous_params() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ScalerStore::new(dir.path());
        let params = fitted_params();

        store.save(&params).unwrap();
        store.save(&params).unwrap();
        assert!(store.load().is_ok());
    }
}
