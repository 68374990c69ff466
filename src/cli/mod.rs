// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   — trains the regressor on a run-to-failure log
//   2. `predict` — scores a test log with the best checkpoint

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "turbofan-rul",
    version = "0.1.0",
    about = "Train an LSTM on turbofan sensor logs, then predict remaining useful life."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => Self::run_train(args),
            Commands::Predict(args) => Self::run_predict(args),
        }
    }

    /// Handles the `train` subcommand.
    /// Converts CLI args into a TrainConfig and hands off to Layer 2.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on '{}'", args.train_file);

        // Convert CLI args → application config (separates presentation from domain)
        let use_case = TrainUseCase::new(args.into());
        let outcome  = use_case.execute()?;

        println!("Training complete ({outcome}). Best checkpoint saved.");
        Ok(())
    }

    /// Handles the `predict` subcommand.
    /// Scores every admissible test window and reports the trace file.
    fn run_predict(args: PredictArgs) -> Result<()> {
        use crate::application::predict_use_case::PredictUseCase;

        let output_file = args.output_file.clone();
        let use_case    = PredictUseCase::new(args.into());
        let predictions = use_case.execute()?;

        println!(
            "Scored {} windows. Prediction trace written to '{}'.",
            predictions.len(),
            output_file
        );
        Ok(())
    }
}
