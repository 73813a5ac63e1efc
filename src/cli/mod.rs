// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`         — train on a corpus, report, export
//   2. `predict`       — reload a checkpoint and export again
//   3. `generate-demo` — write a synthetic corpus to try 1 and 2
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, GenerateDemoArgs, PredictArgs, TrainArgs};

use crate::application::{
    predict_use_case::PredictUseCase,
    train_use_case::TrainUseCase,
};
use crate::data::synthetic::write_demo_corpus;

#[derive(Parser, Debug)]
#[command(
    name = "mosi-mtl",
    version = "0.1.0",
    about = "Multitask sentiment (valence, polarity, intensity) from text, audio and visual features."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)        => run_train(args),
            Commands::Predict(args)      => run_predict(args),
            Commands::GenerateDemo(args) => run_generate_demo(&args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training on corpus in: {}", args.data_dir);
    let summary = TrainUseCase::new(args.into()).execute()?;
    tracing::info!(
        "Training complete after {} epochs{}",
        summary.epochs_run,
        if summary.stopped_early { " (early stop)" } else { "" }
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    tracing::info!("Loading trained run from: {}", args.checkpoint_dir);
    let predictions = PredictUseCase::new(args.into()).execute()?;
    tracing::info!("Predicted {} test utterances", predictions.len());
    Ok(())
}

fn run_generate_demo(args: &GenerateDemoArgs) -> Result<()> {
    let stats = write_demo_corpus(&args.out_dir, &args.into())?;
    println!(
        "Wrote {} videos / {} segments to '{}'",
        stats.videos,
        stats.segments,
        args.out_dir.display()
    );
    Ok(())
}
