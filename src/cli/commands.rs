// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `predict`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)

use clap::{Args, Subcommand};

use crate::application::predict_use_case::PredictConfig;
use crate::application::train_use_case::TrainConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the RUL regressor on a run-to-failure sensor log
    Train(TrainArgs),

    /// Score a test sensor log with a trained checkpoint
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Whitespace-delimited training table (unit, cycle, 3 settings, 21 sensors)
    #[arg(long, default_value = "data/train_FD001.txt")]
    pub train_file: String,

    /// Directory for the checkpoint, scaler, configs and metrics CSV
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Cycles per training window
    #[arg(long, default_value_t = 50)]
    pub seq_len: usize,

    /// Number of windows processed together in one forward pass
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Maximum number of epochs before the budget is exhausted
    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Initial Adam learning rate — halved after every 3 epochs
    /// without validation improvement
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// L2 weight decay applied by the optimiser
    #[arg(long, default_value_t = 1e-5)]
    pub weight_decay: f64,

    /// Hidden state width of each LSTM layer
    #[arg(long, default_value_t = 128)]
    pub hidden_dim: usize,

    /// Number of stacked LSTM layers
    #[arg(long, default_value_t = 3)]
    pub num_layers: usize,

    /// Dropout probability between LSTM layers
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    /// Epochs without validation improvement before early stopping
    #[arg(long, default_value_t = 10)]
    pub patience: usize,

    /// Validation R² at which training stops as converged
    #[arg(long, default_value_t = 0.82)]
    pub target_r2: f64,

    /// Fraction of windows used for training (rest is validation)
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    /// Seed for unit selection, shuffling and weight init
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Data loader worker threads (affects batch order only,
    /// never window content)
    #[arg(long, default_value_t = 4)]
    pub num_workers: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            train_file:     a.train_file,
            checkpoint_dir: a.checkpoint_dir,
            seq_len:        a.seq_len,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            weight_decay:   a.weight_decay,
            hidden_dim:     a.hidden_dim,
            num_layers:     a.num_layers,
            dropout:        a.dropout,
            patience:       a.patience,
            target_r2:      a.target_r2,
            train_fraction: a.train_fraction,
            seed:           a.seed,
            num_workers:    a.num_workers,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Whitespace-delimited test table (same 26-column format)
    #[arg(long, default_value = "data/test_FD001.txt")]
    pub test_file: String,

    /// Single-column terminal-RUL file, one value per test unit
    #[arg(long, default_value = "data/RUL_FD001.txt")]
    pub rul_file: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Destination CSV for the per-cycle prediction trace
    #[arg(long, default_value = "predictions.csv")]
    pub output_file: String,

    /// Windows scored per forward pass
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,
}

impl From<PredictArgs> for PredictConfig {
    fn from(a: PredictArgs) -> Self {
        PredictConfig {
            test_file:      a.test_file,
            rul_file:       a.rul_file,
            checkpoint_dir: a.checkpoint_dir,
            output_file:    a.output_file,
            batch_size:     a.batch_size,
        }
    }
}
