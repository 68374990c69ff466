// ============================================================
// Layer 4 — Sequence Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<SequenceSample>
// into GPU-ready tensors.
//
// How batching works here:
//   Input:  Vec of N SequenceSamples, each a flattened L x F window
//   Output: SequenceBatch with a [N, L, F] sequence tensor and a
//           [N] target tensor
//
//   We concatenate all window matrices into one flat Vec, then
//   reshape: [w1_r1c1, ..., w1_rLcF, w2_r1c1, ...] → [N, L, F]
//
// All windows share the same L and F by construction (the dataset
// slices fixed-length windows), so no padding is needed.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::SequenceSample;

// ─── SequenceBatch ────────────────────────────────────────────────────────────
/// A batch of sensor windows ready for the model forward pass.
///
/// B is the Burn Backend (e.g. Wgpu, NdArray) —
/// generic so the same batcher works on any device.
#[derive(Debug, Clone)]
pub struct SequenceBatch<B: Backend> {
    /// Feature windows — shape: [batch_size, seq_len, features]
    pub sequences: Tensor<B, 3>,

    /// RUL targets at each window's final cycle — shape: [batch_size]
    pub targets: Tensor<B, 1>,
}

// ─── SequenceBatcher ──────────────────────────────────────────────────────────
/// The batcher struct — holds the target device so tensors
/// are created on the correct GPU/CPU.
#[derive(Clone, Debug)]
pub struct SequenceBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SequenceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<SequenceSample, SequenceBatch<B>> for SequenceBatcher<B> {
    fn batch(&self, items: Vec<SequenceSample>) -> SequenceBatch<B> {
        let batch_size  = items.len();
        // All windows have the same dimensions (fixed-length slices)
        let seq_len     = items[0].seq_len;
        let feature_dim = items[0].feature_dim;

        // ── Flatten all windows into one Vec<f32> ─────────────────────────────
        let flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();

        let sequences = Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len, feature_dim]);

        // ── Targets stay as a 1D tensor [batch_size] ──────────────────────────
        let target_values: Vec<f32> = items.iter().map(|s| s.target).collect();
        let targets = Tensor::<B, 1>::from_floats(target_values.as_slice(), &self.device);

        SequenceBatch { sequences, targets }
    }
}
