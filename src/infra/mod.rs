// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all cross-cutting persistence concerns:
//
//   checkpoint.rs   — Saving and loading model weights
//                     Uses Burn's CompactRecorder, plus JSON
//                     sidecars for the architecture, the training
//                     config and the best-epoch metadata. All
//                     writes are temp-file-and-rename atomic.
//
//   scaler_store.rs — Normalization parameter persistence
//                     Written once after fitting on the training
//                     table; inference only ever reads it back,
//                     never refits.
//
//   metrics.rs      — Training metrics logging
//                     Appends epoch-level metrics (losses, R²,
//                     learning rate) to a CSV file; also hosts
//                     the R² computation itself.
//
// Why is this a separate layer?
//   These concerns are used by multiple other layers but don't
//   belong to any one of them, and all of them share the same
//   atomic-write discipline.
//
// Reference: Rust Book §9 (Error Handling)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Min-max scaler persistence
pub mod scaler_store;

/// Training metrics CSV logger and R² score
pub mod metrics;
