// ============================================================
// Layer 5 — Inferencer
// ============================================================
use anyhow::Result;
use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;

use crate::data::batcher::SequenceBatcher;
use crate::data::dataset::{SequenceDataset, SequenceSample};
use crate::domain::traits::WindowPolicy;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{SequenceRegressor, SequenceRegressorConfig};

type InferBackend = burn::backend::Wgpu;

/// One scored test window: the window's unit, its final cycle, the
/// reconstructed ground truth, and the model's estimate.
#[derive(Debug, Clone)]
pub struct RulPrediction {
    pub unit_id:       u32,
    pub cycle:         u32,
    pub actual_rul:    f32,
    pub predicted_rul: f32,
}

pub struct Inferencer {
    model:  SequenceRegressor<InferBackend>,
    device: burn::backend::wgpu::WgpuDevice,
}

impl Inferencer {
    /// Rebuild the model from the persisted training configuration and
    /// restore the best checkpoint. `input_dim` comes from the table
    /// being scored; a mismatch against the checkpoint's recorded
    /// architecture fails with IncompatibleArchitecture before any
    /// weights are touched.
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, input_dim: usize) -> Result<Self> {
        let device    = burn::backend::wgpu::WgpuDevice::default();
        let train_cfg = ckpt_manager.load_train_config()?;

        // Dropout off for deterministic evaluation
        let expected = SequenceRegressorConfig::new(
            input_dim, train_cfg.hidden_dim, train_cfg.num_layers,
        ).with_dropout(0.0);

        let model = expected.init::<InferBackend>(&device);
        let model = ckpt_manager.load_model(model, &expected, &device)?;
        tracing::info!("Model loaded from checkpoint");
        Ok(Self { model, device })
    }

    /// Score every window of the dataset, in the dataset's own order.
    /// Enumeration order is stable, so the resulting per-cycle trace is
    /// reproducible run to run.
    pub fn predict_all<P>(
        &self,
        dataset:    &SequenceDataset<P>,
        batch_size: usize,
    ) -> Result<Vec<RulPrediction>>
    where
        P: WindowPolicy + Send + Sync,
    {
        let batcher = SequenceBatcher::<InferBackend>::new(self.device.clone());
        let total   = dataset.len();
        let mut out = Vec::with_capacity(total);

        let mut start = 0;
        while start < total {
            let end = (start + batch_size).min(total);
            let items: Vec<SequenceSample> = (start..end)
                .map(|i| dataset.sample(i))
                .collect::<Result<_, _>>()?;

            let batch = batcher.batch(items.clone());
            let predictions: Vec<f32> = self
                .model
                .forward(batch.sequences)
                .into_data()
                .to_vec::<f32>()
                .unwrap_or_default();

            for (sample, predicted) in items.iter().zip(predictions) {
                out.push(RulPrediction {
                    unit_id:       sample.unit_id,
                    cycle:         sample.last_cycle,
                    actual_rul:    sample.target,
                    predicted_rul: predicted,
                });
            }
            start = end;
        }

        tracing::info!("Scored {} windows", out.len());
        Ok(out)
    }
}
