// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands:
//   train: fit the classifier and export it for TensorFlow.js
//   detect: score element descriptors with an exported model
//   inspect: print the topology of an exported model

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the ad classifier and export it in TensorFlow.js format
    Train(TrainArgs),

    /// Score page elements with an exported model
    Detect(DetectArgs),

    /// Show the layers of an exported model
    Inspect(InspectArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSON array of labelled element descriptors
    #[arg(long, default_value = "ad_dataset.json")]
    pub dataset: String,

    /// Directory that receives model.json and the weight shards
    #[arg(long, default_value = "ad_detection_model")]
    pub output_dir: String,

    /// Number of full passes through the training partition
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Samples per gradient step
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Seed for weight initialisation and batch order
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Shuffle records with this seed before the 70/15/15 split.
    /// Without it the split follows file order.
    #[arg(long)]
    pub shuffle_seed: Option<u64>,

    /// Append per-epoch metrics to this CSV file
    #[arg(long)]
    pub history_csv: Option<String>,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            dataset_path:  a.dataset,
            output_dir:    a.output_dir,
            epochs:        a.epochs,
            batch_size:    a.batch_size,
            learning_rate: a.learning_rate,
            seed:          a.seed,
            shuffle_seed:  a.shuffle_seed,
            history_csv:   a.history_csv,
        }
    }
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Exported model directory
    #[arg(long, default_value = "ad_detection_model")]
    pub model_dir: String,

    /// JSON array of element descriptors; isAd is optional
    #[arg(long)]
    pub elements: String,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Exported model directory
    #[arg(long, default_value = "ad_detection_model")]
    pub model_dir: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["ad-detect-trainer", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg = TrainConfig::from(args);
        assert_eq!(cfg, TrainConfig::default());
    }

    #[test]
    fn test_train_overrides() {
        let cli = Cli::try_parse_from([
            "ad-detect-trainer", "train",
            "--epochs", "3", "--batch-size", "8", "--shuffle-seed", "9",
        ]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg = TrainConfig::from(args);
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.batch_size, 8);
        assert_eq!(cfg.shuffle_seed, Some(9));
    }

    #[test]
    fn test_detect_requires_elements() {
        assert!(Cli::try_parse_from(["ad-detect-trainer", "detect"]).is_err());
    }
}
