// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from raw sensor log files
// all the way to GPU-ready tensor batches.
//
// The pipeline flows in this order:
//
//   train_FD001.txt / test_FD001.txt / RUL_FD001.txt
//       │
//       ▼
//   loader            → parses whitespace-delimited rows
//       │
//       ▼
//   normalize         → min-max scaling, fit on train only
//       │
//       ▼
//   indexer           → maps window index → (unit, start row)
//       │
//       ▼
//   SequenceDataset   → implements Burn's Dataset trait
//       │
//       ▼
//   SequenceBatcher   → stacks windows into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Parses whitespace-delimited sensor logs and terminal-RUL files
pub mod loader;

/// Min-max normalization parameters: fit, transform, persist, load
pub mod normalize;

/// The two windowing policies: wrap (train) and enumerate-valid (test)
pub mod indexer;

/// Implements Burn's Dataset trait over a table + window policy
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded shuffle-and-split into train/validation datasets
pub mod splitter;
