// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports burn tensor or NN types — only this
// one (the data layer touches only burn's Dataset/Batcher
// machinery, never tensors beyond batch construction).
//
// What's in this layer:
//
//   model.rs      — The stacked-LSTM sequence regressor
//                   • one LSTM cell stack per layer
//                   • inter-layer dropout
//                   • linear head over the final time step
//
//   trainer.rs    — The training loop and its state machine
//                   Forward/backward passes, clipped Adam updates,
//                   validation R², LR-on-plateau halving, strict-
//                   improvement checkpointing, early stopping,
//                   target-R² convergence, cooperative cancellation
//
//   inferencer.rs — The inference engine
//                   Loads the best checkpoint (architecture-checked)
//                   and scores every test window in stable order
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Hochreiter & Schmidhuber (1997) LSTM

/// Stacked-LSTM RUL regressor architecture
pub mod model;

/// Full training loop with validation, scheduling and checkpointing
pub mod trainer;

/// Inference engine — loads a checkpoint and scores test windows
pub mod inferencer;
