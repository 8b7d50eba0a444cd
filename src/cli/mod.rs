// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train` — trains a ResNet classifier, keeping the best
//                checkpoint by validation accuracy
//   2. `eval`  — reloads that checkpoint and re-runs validation
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvalArgs, TrainArgs};

/// The main CLI struct. clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "imagewise-classifier",
    version = "0.1.0",
    about = "Train a ResNet binary image classifier on cluster-partitioned data."
)]
pub struct Cli {
    /// The subcommand to run (train or eval)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Eval(args)  => run_eval(args),
        }
    }
}

/// Handles the `train` subcommand.
/// Converts CLI args into a TrainConfig and hands off to Layer 2.
fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting {} training run in '{}'", args.model, args.save_name.display());

    let save_name = args.save_name.clone();
    let summary   = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Training complete. Best accuracy {:.4} over {} epochs; checkpoint in '{}'.",
        summary.best_accuracy,
        summary.epochs.len(),
        save_name.display()
    );
    if let Some(epoch) = summary.checkpoint_epoch() {
        println!("Checkpoint written by epoch {epoch}.");
    }
    Ok(())
}

/// Handles the `eval` subcommand.
fn run_eval(args: EvalArgs) -> Result<()> {
    use crate::application::eval_use_case::EvalUseCase;

    let use_case = EvalUseCase::new(args.save_name.clone(), args.overrides());
    let summary  = use_case.execute()?;

    println!(
        "Test set: Accuracy: {}/{} ({:.4}%)",
        summary.correct,
        summary.total,
        100.0 * summary.accuracy()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::{Architecture, LabelField};

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["imagewise-classifier", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };

        assert_eq!(args.model, Architecture::ResNet34);
        assert_eq!(args.label, LabelField::PovLabel);
        assert_eq!(args.batch_size, 256);
        assert_eq!(args.num_epochs, 100);
        assert!(!args.pretrained);
        assert_eq!(args.seed, None);
    }

    #[test]
    fn test_unknown_architecture_rejected_at_parse_time() {
        let result = Cli::try_parse_from(["imagewise-classifier", "train", "--model", "vgg16"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_label_rejected_at_parse_time() {
        let result = Cli::try_parse_from(["imagewise-classifier", "train", "--label", "age_label"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_eval_overrides() {
        let cli = Cli::try_parse_from([
            "imagewise-classifier", "eval", "--save-name", "runs/a", "--batch-size", "16",
        ])
        .unwrap();
        let Commands::Eval(args) = cli.command else { panic!("expected eval") };

        let overrides = args.overrides();
        assert_eq!(overrides.batch_size, Some(16));
        assert!(overrides.data_csv.is_none());
    }
}
