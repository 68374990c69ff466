// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
// One epoch:
//   - every training batch through forward_loss + backward + Adam
//     step (gradient norms clipped at 1.0 before the update)
//   - every validation batch through forward only (no gradients),
//     accumulating predictions for the validation R² score
//
// The epoch-to-epoch decisions (checkpoint / halve LR / stop) are
// kept in TrainingState, a plain state machine with no tensor
// types, so the control flow is unit-testable without a device:
//
//   Running → {Improving, Plateauing}
//           → {Converged, EarlyStopped, ExhaustedEpochs, Cancelled}
//
//   - checkpoint overwritten only on strict val-loss improvement
//   - LR halved after 3 consecutive epochs without improvement
//     (and again after each further stagnation window)
//   - EarlyStopped after `patience` epochs without improvement
//   - Converged when validation R² reaches the target
//   - Cancelled when the cooperative flag is set (checked once
//     per epoch boundary)
//
// Every terminal state leaves the best checkpoint so far on disk.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    nn::loss::{MseLoss, Reduction},
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::SequenceBatcher, dataset::SequenceSample};
use crate::domain::errors::PipelineError;
use crate::infra::checkpoint::{CheckpointManager, CheckpointMeta};
use crate::infra::metrics::{r2_score, EpochMetrics, MetricsLogger};
use crate::ml::model::SequenceRegressorConfig;

type MyBackend      = burn::backend::Autodiff<burn::backend::Wgpu>;
type MyInnerBackend = burn::backend::Wgpu;

/// Epochs without improvement before the learning rate is halved.
const LR_STAGNATION_WINDOW: usize = 3;

/// Multiplier applied to the learning rate on each stagnation window.
const LR_DECAY: f64 = 0.5;

// ─── Terminal states ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    /// Validation R² reached the configured target
    Converged,
    /// No validation-loss improvement for `patience` epochs
    EarlyStopped,
    /// The configured epoch budget was consumed
    ExhaustedEpochs,
    /// The cooperative cancellation flag was set
    Cancelled,
}

impl std::fmt::Display for TrainOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Converged       => write!(f, "converged (target R² reached)"),
            Self::EarlyStopped    => write!(f, "early-stopped (validation loss plateaued)"),
            Self::ExhaustedEpochs => write!(f, "exhausted the epoch budget"),
            Self::Cancelled       => write!(f, "cancelled"),
        }
    }
}

// ─── Schedule configuration ───────────────────────────────────────────────────
/// The knobs the per-epoch state machine runs on.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub patience:          usize,
    pub stagnation_window: usize,
    pub lr_decay:          f64,
    pub target_r2:         f64,
}

// ─── Per-epoch decision ───────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy)]
pub struct EpochDecision {
    /// Validation loss strictly improved: overwrite the checkpoint
    pub improved: bool,
    /// Terminal state reached this epoch, if any
    pub halt:     Option<TrainOutcome>,
}

// ─── Training state machine ───────────────────────────────────────────────────
/// Mutable per-run state, advanced exactly once per epoch.
/// Not shared across concurrent runs.
#[derive(Debug, Clone)]
pub struct TrainingState {
    pub current_epoch:      usize,
    pub best_val_loss:      f64,
    pub early_stop_counter: usize,
    pub lr_stagnation:      usize,
    pub current_lr:         f64,
}

impl TrainingState {
    pub fn new(initial_lr: f64) -> Self {
        Self {
            current_epoch:      0,
            best_val_loss:      f64::INFINITY,
            early_stop_counter: 0,
            lr_stagnation:      0,
            current_lr:         initial_lr,
        }
    }

    /// Fold one epoch's validation results into the state and decide
    /// what happens next. Strict `<` on the loss: an equal loss is a
    /// plateau, not an improvement.
    pub fn observe(&mut self, sched: &ScheduleConfig, val_loss: f64, val_r2: f64) -> EpochDecision {
        self.current_epoch += 1;

        let improved = val_loss < self.best_val_loss;
        if improved {
            self.best_val_loss      = val_loss;
            self.early_stop_counter = 0;
            self.lr_stagnation      = 0;
        } else {
            self.early_stop_counter += 1;
            self.lr_stagnation      += 1;

            // Halve on every full stagnation window; no floor beyond
            // numeric underflow.
            if self.lr_stagnation >= sched.stagnation_window {
                self.current_lr *= sched.lr_decay;
                self.lr_stagnation = 0;
                tracing::info!(
                    "No improvement for {} epochs — learning rate now {:.2e}",
                    sched.stagnation_window,
                    self.current_lr
                );
            }
        }

        let halt = if self.early_stop_counter >= sched.patience {
            Some(TrainOutcome::EarlyStopped)
        } else if val_r2 >= sched.target_r2 {
            Some(TrainOutcome::Converged)
        } else {
            None
        };

        EpochDecision { improved, halt }
    }
}

// ─── Entry point ──────────────────────────────────────────────────────────────
pub fn run_training<DT, DV>(
    cfg:           &TrainConfig,
    input_dim:     usize,
    train_dataset: DT,
    val_dataset:   DV,
    ckpt_manager:  CheckpointManager,
    cancel:        Arc<AtomicBool>,
) -> Result<TrainOutcome>
where
    DT: Dataset<SequenceSample> + 'static,
    DV: Dataset<SequenceSample> + 'static,
{
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    MyBackend::seed(cfg.seed);
    train_loop(cfg, input_dim, train_dataset, val_dataset, ckpt_manager, cancel, device)
}

fn train_loop<DT, DV>(
    cfg:           &TrainConfig,
    input_dim:     usize,
    train_dataset: DT,
    val_dataset:   DV,
    ckpt_manager:  CheckpointManager,
    cancel:        Arc<AtomicBool>,
    device:        burn::backend::wgpu::WgpuDevice,
) -> Result<TrainOutcome>
where
    DT: Dataset<SequenceSample> + 'static,
    DV: Dataset<SequenceSample> + 'static,
{
    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = SequenceRegressorConfig::new(input_dim, cfg.hidden_dim, cfg.num_layers)
        .with_dropout(cfg.dropout);
    let mut model = model_cfg.init::<MyBackend>(&device);
    ckpt_manager.save_regressor_config(&model_cfg)?;
    tracing::info!(
        "Model ready: {} LSTM layers, hidden={}, input={}",
        cfg.num_layers, cfg.hidden_dim, input_dim
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // Gradient norms are clipped at 1.0 before every update so one
    // outlier batch cannot blow up the recurrent weights.
    let optim_cfg = AdamConfig::new()
        .with_epsilon(1e-8)
        .with_weight_decay(Some(WeightDecayConfig::new(cfg.weight_decay)))
        .with_grad_clipping(Some(GradientClippingConfig::Norm(1.0)));
    let mut optim = optim_cfg.init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_batcher = SequenceBatcher::<MyBackend>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.num_workers)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_batcher = SequenceBatcher::<MyInnerBackend>::new(device.clone());
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers)
        .build(val_dataset);

    let schedule = ScheduleConfig {
        patience:          cfg.patience,
        stagnation_window: LR_STAGNATION_WINDOW,
        lr_decay:          LR_DECAY,
        target_r2:         cfg.target_r2,
    };
    let mut state  = TrainingState::new(cfg.lr);
    let logger     = MetricsLogger::new(&cfg.checkpoint_dir)?;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        // Cooperative cancellation, checked only at epoch boundaries
        if cancel.load(Ordering::Relaxed) {
            tracing::warn!("Cancellation requested — stopping before epoch {}", epoch);
            return Ok(TrainOutcome::Cancelled);
        }

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(batch.sequences, batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                tracing::error!("Non-finite training loss at epoch {} — halting", epoch);
                return Err(PipelineError::NonFiniteLoss { epoch }.into());
            }
            train_loss_sum += loss_val;
            train_batches  += 1;

            // Backward pass + clipped Adam update at the current LR
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(state.current_lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        // model.valid() → SequenceRegressor<MyInnerBackend>
        // dropout disabled for deterministic evaluation
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut val_preds:   Vec<f32> = Vec::new();
        let mut val_targets: Vec<f32> = Vec::new();

        for batch in val_loader.iter() {
            let predictions = model_valid.forward(batch.sequences);

            let batch_loss: f64 = MseLoss::new()
                .forward(predictions.clone(), batch.targets.clone(), Reduction::Mean)
                .into_scalar()
                .elem::<f64>();
            val_loss_sum += batch_loss;
            val_batches  += 1;

            val_preds.extend(predictions.into_data().to_vec::<f32>().unwrap_or_default());
            val_targets.extend(batch.targets.into_data().to_vec::<f32>().unwrap_or_default());
        }

        if val_batches == 0 {
            anyhow::bail!("validation set is empty — lower train_fraction");
        }
        let avg_val_loss = val_loss_sum / val_batches as f64;
        if !avg_val_loss.is_finite() {
            tracing::error!("Non-finite validation loss at epoch {} — halting", epoch);
            return Err(PipelineError::NonFiniteLoss { epoch }.into());
        }
        let val_r2 = r2_score(&val_targets, &val_preds);

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_r2={:.4} | lr={:.2e}",
            epoch, cfg.epochs, avg_train_loss, avg_val_loss, val_r2, state.current_lr,
        );
        logger.log(&EpochMetrics::new(epoch, avg_train_loss, avg_val_loss, val_r2, state.current_lr))?;

        // ── Epoch decision: checkpoint / LR / termination ─────────────────────
        let decision = state.observe(&schedule, avg_val_loss, val_r2);

        if decision.improved {
            ckpt_manager.save_best(&model, &CheckpointMeta {
                epoch,
                val_loss: avg_val_loss,
                val_r2,
            })?;
            tracing::info!("Checkpoint saved at epoch {} (val_loss={:.4})", epoch, avg_val_loss);
        }

        if let Some(outcome) = decision.halt {
            tracing::info!("Training stopped at epoch {}: {}", epoch, outcome);
            return Ok(outcome);
        }
    }

    tracing::info!("Epoch budget consumed after {} epochs", cfg.epochs);
    Ok(TrainOutcome::ExhaustedEpochs)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
// The state machine is exercised directly, without a backend.
#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(patience: usize) -> ScheduleConfig {
        ScheduleConfig {
            patience,
            stagnation_window: LR_STAGNATION_WINDOW,
            lr_decay:          LR_DECAY,
            target_r2:         0.82,
        }
    }

    /// Feed a loss sequence (R² pinned low) and collect the improved flags.
    fn improvements(losses: &[f64], patience: usize) -> Vec<bool> {
        let sched     = schedule(patience);
        let mut state = TrainingState::new(1e-4);
        losses
            .iter()
            .map(|&l| state.observe(&sched, l, 0.0).improved)
            .collect()
    }

    #[test]
    fn test_checkpoint_on_strict_improvement_only() {
        // Checkpoints at epochs 1, 2 and 4 only
        assert_eq!(
            improvements(&[0.8, 0.6, 0.7, 0.5], 10),
            vec![true, true, false, true]
        );
    }

    #[test]
    fn test_equal_loss_is_not_an_improvement() {
        assert_eq!(improvements(&[0.5, 0.5], 10), vec![true, false]);
    }

    #[test]
    fn test_early_stopping_with_patience_two() {
        // Epoch 1 establishes the best; two non-improvements halt at epoch 3
        let sched     = schedule(2);
        let mut state = TrainingState::new(1e-4);

        assert!(state.observe(&sched, 0.5, 0.0).halt.is_none());
        assert!(state.observe(&sched, 0.5, 0.0).halt.is_none());
        let third = state.observe(&sched, 0.5, 0.0);
        assert_eq!(third.halt, Some(TrainOutcome::EarlyStopped));
        assert_eq!(state.current_epoch, 3);
    }

    #[test]
    fn test_convergence_on_target_r2() {
        let sched     = schedule(10);
        let mut state = TrainingState::new(1e-4);

        assert!(state.observe(&sched, 0.5, 0.50).halt.is_none());
        let hit = state.observe(&sched, 0.4, 0.83);
        assert_eq!(hit.halt, Some(TrainOutcome::Converged));
        // The converging epoch also improved, so the checkpoint is fresh
        assert!(hit.improved);
    }

    #[test]
    fn test_lr_halves_after_stagnation_window() {
        let sched     = schedule(10);
        let mut state = TrainingState::new(1e-3);

        state.observe(&sched, 0.5, 0.0); // improvement
        state.observe(&sched, 0.6, 0.0);
        state.observe(&sched, 0.6, 0.0);
        assert_eq!(state.current_lr, 1e-3);
        state.observe(&sched, 0.6, 0.0); // third stagnant epoch
        assert_eq!(state.current_lr, 5e-4);
    }

    #[test]
    fn test_lr_decay_stacks_across_windows() {
        let sched     = schedule(10);
        let mut state = TrainingState::new(1e-3);

        state.observe(&sched, 0.5, 0.0);
        for _ in 0..6 {
            state.observe(&sched, 0.6, 0.0);
        }
        // Two full stagnation windows → two halvings
        assert_eq!(state.current_lr, 2.5e-4);
    }

    #[test]
    fn test_improvement_resets_both_counters() {
        let sched     = schedule(3);
        let mut state = TrainingState::new(1e-3);

        state.observe(&sched, 0.5, 0.0);
        state.observe(&sched, 0.6, 0.0);
        state.observe(&sched, 0.6, 0.0);
        state.observe(&sched, 0.4, 0.0); // improvement
        assert_eq!(state.early_stop_counter, 0);
        assert_eq!(state.lr_stagnation, 0);
        // Counters restart: two more stagnant epochs do not halt at patience 3
        assert!(state.observe(&sched, 0.6, 0.0).halt.is_none());
        assert!(state.observe(&sched, 0.6, 0.0).halt.is_none());
    }

    #[test]
    fn test_nan_val_loss_is_a_plateau_not_an_improvement() {
        let sched     = schedule(10);
        let mut state = TrainingState::new(1e-4);

        state.observe(&sched, 0.5, 0.0);
        let d = state.observe(&sched, f64::NAN, 0.0);
        assert!(!d.improved);
        assert_eq!(state.early_stop_counter, 1);
    }
}
