// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes to the use cases.
// This is the only layer that prints results; the layers below
// return structured values.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, DetectArgs, InspectArgs, TrainArgs};
use std::path::Path;

#[derive(Parser, Debug)]
#[command(
    name = "ad-detect-trainer",
    version,
    about = "Train a page-element ad classifier and export it for TensorFlow.js."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Detect(args)  => run_detect(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.dataset);

    let report = TrainUseCase::new(args.into()).execute()?;
    for file in &report.export.files {
        tracing::debug!("Wrote '{}'", file.display());
    }
    if let Some(last) = report.history.last() {
        tracing::info!("Final epoch: {}", last.summary());
    }
    tracing::info!(
        "Split {}/{}/{}, {} epochs, {} weight bytes exported",
        report.split.train,
        report.split.validation,
        report.split.test,
        report.history.len(),
        report.export.weight_bytes
    );

    println!("Test accuracy: {:.4}", report.test.accuracy);
    println!("Model saved in TensorFlow.js format at {}", report.export.dir.display());
    Ok(())
}

fn run_detect(args: DetectArgs) -> Result<()> {
    use crate::application::detect_use_case::DetectUseCase;

    let results = DetectUseCase::new(&args.model_dir).detect_file(&args.elements)?;
    for (i, (element, detection)) in results.iter().enumerate() {
        println!(
            "{:>4}  {:<8} {:>6}x{:<6} p={:.4}  {}",
            i,
            element.tag_name,
            element.width,
            element.height,
            detection.probability,
            if detection.is_ad { "AD" } else { "-" },
        );
    }
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let topology = crate::infra::tfjs::read_topology(Path::new(&args.model_dir))?;

    println!("input: {}", topology.input_dim());
    for layer in &topology.layers {
        println!(
            "{:<10} Dense {:>3} → {:<3} {}",
            layer.name,
            layer.input_dim,
            layer.units,
            layer.activation.as_str()
        );
    }
    println!("output: {}", topology.output_dim());
    Ok(())
}
