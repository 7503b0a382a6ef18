// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load element records        (Layer 4 - data)
//   Step 2: Extract features            (Layer 3 - domain)
//   Step 3: Split train/val/test        (Layer 4 - data)
//   Step 4: Build Burn datasets         (Layer 4 - data)
//   Step 5: Run training loop           (Layer 5 - ml)
//   Step 6: Evaluate on the test set    (Layer 5 - ml)
//   Step 7: Export for TensorFlow.js    (Layer 6 - infra)
//   Step 8: Write history CSV, if asked (Layer 6 - infra)
//
// Every step is all-or-nothing. If the export fails the trained
// weights are gone; there is no checkpoint to fall back on.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{AdDataset, AdSample},
    loader::JsonElementLoader,
    splitter::{shuffle_then_split, split_positional, Partitions},
};
use crate::domain::traits::ElementSource;
use crate::infra::{
    metrics::{MetricsLogger, TrainingHistory},
    tfjs::{ExportSummary, TfjsExporter},
};
use crate::ml::{
    backend::init_device,
    evaluator::{evaluate, EvalMetrics},
    trainer::run_training,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs. Serialisable so the exact settings can
// be logged alongside the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub dataset_path:  String,
    pub output_dir:    String,
    pub epochs:        usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    /// Seeds weight initialisation and per-epoch batch order
    pub seed:          u64,
    /// When set, records are shuffled with this seed before the split
    pub shuffle_seed:  Option<u64>,
    pub history_csv:   Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataset_path:  "ad_dataset.json".to_string(),
            output_dir:    "ad_detection_model".to_string(),
            epochs:        10,
            batch_size:    32,
            learning_rate: 1e-3,
            seed:          42,
            shuffle_seed:  None,
            history_csv:   None,
        }
    }
}

/// Partition sizes of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSizes {
    pub train:      usize,
    pub validation: usize,
    pub test:       usize,
}

/// Everything a training run produced.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub split:   SplitSizes,
    pub history: TrainingHistory,
    pub test:    EvalMetrics,
    pub export:  ExportSummary,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline on the configured dataset file.
    pub fn execute(&self) -> Result<TrainReport> {
        let loader = JsonElementLoader::new(&self.config.dataset_path);
        self.execute_with(&loader)
    }

    /// Run the pipeline on any element source.
    pub fn execute_with(&self, source: &dyn ElementSource) -> Result<TrainReport> {
        let cfg = &self.config;
        tracing::debug!("Training configuration: {}", serde_json::to_string(cfg)?);

        // ── Step 1: Load records ──────────────────────────────────────────────
        let records = source.load_all()?;

        // ── Step 2: Encode each record as (features, label) ───────────────────
        let samples: Vec<AdSample> = records.iter().map(AdSample::from_record).collect();

        // ── Step 3: Split ─────────────────────────────────────────────────────
        let Partitions { train, validation, test } = match cfg.shuffle_seed {
            Some(seed) => shuffle_then_split(samples, seed),
            None       => split_positional(samples),
        };
        let split = SplitSizes {
            train:      train.len(),
            validation: validation.len(),
            test:       test.len(),
        };
        tracing::info!(
            "Split: {} train, {} validation, {} test",
            split.train, split.validation, split.test
        );

        // ── Step 4: Burn datasets ─────────────────────────────────────────────
        let train_dataset = AdDataset::new(train);
        let val_dataset   = AdDataset::new(validation);
        let test_dataset  = AdDataset::new(test);

        // ── Step 5: Train ─────────────────────────────────────────────────────
        let device = init_device();
        let (model, history) = run_training(cfg, train_dataset, val_dataset, &device)?;

        // ── Step 6: Evaluate on the held-out test set ─────────────────────────
        let test_metrics = evaluate(&model, test_dataset, cfg.batch_size, &device)
            .context("Test evaluation failed")?;
        tracing::info!(
            "Test loss={:.4} accuracy={:.4} over {} samples",
            test_metrics.loss, test_metrics.accuracy, test_metrics.samples
        );

        // ── Step 7: Export ────────────────────────────────────────────────────
        let export = TfjsExporter::new(&cfg.output_dir)
            .with_learning_rate(cfg.learning_rate)
            .export(&model)
            .with_context(|| format!("Export to '{}' failed", cfg.output_dir))?;

        // ── Step 8: History CSV ───────────────────────────────────────────────
        if let Some(path) = &cfg.history_csv {
            MetricsLogger::new(path)?.log_history(&history)?;
        }

        Ok(TrainReport { split, history, test: test_metrics, export })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::element::ElementRecord;
    use crate::domain::features::extract_features;
    use crate::domain::traits::InMemorySource;
    use crate::infra::tfjs::read_topology;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ad-detect-train-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn ten_records() -> Vec<ElementRecord> {
        let mut records = vec![ElementRecord::new(100.0, 50.0, "IFRAME", "ad-slot-1", "", true)];
        for i in 1..10 {
            let is_ad = i % 2 == 0;
            records.push(ElementRecord::new(
                if is_ad { 300.0 } else { 640.0 },
                if is_ad { 250.0 } else { 32.0 },
                if is_ad { "IMG" } else { "DIV" },
                if is_ad { format!("ad-{i}") } else { format!("item-{i}") },
                "",
                is_ad,
            ));
        }
        records
    }

    #[test]
    fn test_ten_record_pipeline() {
        let out     = temp_dir("pipeline");
        let records = ten_records();
        assert_eq!(extract_features(&records[0]), [100.0, 50.0, 0.0, 1.0, 1.0, 0.0]);

        let cfg = TrainConfig {
            output_dir:  out.to_string_lossy().into_owned(),
            epochs:      3,
            history_csv: Some(out.join("history.csv").to_string_lossy().into_owned()),
            ..TrainConfig::default()
        };
        let report = TrainUseCase::new(cfg).execute_with(&InMemorySource::new(records)).unwrap();

        assert_eq!(report.split, SplitSizes { train: 7, validation: 1, test: 2 });
        assert_eq!(report.history.len(), 3);
        assert_eq!(report.test.samples, 2);

        let topology = read_topology(&out).unwrap();
        assert_eq!(topology.layer_count(), 4);
        assert_eq!(topology.input_dim(), 6);
        assert_eq!(topology.output_dim(), 1);

        let csv = std::fs::read_to_string(out.join("history.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn test_reads_dataset_file() {
        let out  = temp_dir("from-file");
        std::fs::create_dir_all(&out).unwrap();
        let path = out.join("ad_dataset.json");
        std::fs::write(&path, serde_json::to_string(&ten_records()).unwrap()).unwrap();

        let cfg = TrainConfig {
            dataset_path: path.to_string_lossy().into_owned(),
            output_dir:   out.join("model").to_string_lossy().into_owned(),
            epochs:       1,
            shuffle_seed: Some(3),
            ..TrainConfig::default()
        };
        let report = TrainUseCase::new(cfg).execute().unwrap();
        assert_eq!(report.split.train + report.split.validation + report.split.test, 10);
        assert!(out.join("model").join("model.json").exists());
    }

    #[test]
    fn test_single_record_leaves_nothing_to_train_on() {
        let out = temp_dir("single");
        let cfg = TrainConfig {
            output_dir: out.to_string_lossy().into_owned(),
            epochs:     1,
            ..TrainConfig::default()
        };
        let records = ten_records().into_iter().take(1).collect();
        let err     = TrainUseCase::new(cfg).execute_with(&InMemorySource::new(records)).unwrap_err();

        assert!(err.to_string().contains("Training partition is empty"));
        assert!(!out.join("model.json").exists());
    }

    #[test]
    fn test_two_records_still_yield_a_test_partition() {
        let out = temp_dir("two");
        let cfg = TrainConfig {
            output_dir: out.to_string_lossy().into_owned(),
            epochs:     1,
            ..TrainConfig::default()
        };
        let records = ten_records().into_iter().take(2).collect();
        let report  = TrainUseCase::new(cfg).execute_with(&InMemorySource::new(records)).unwrap();

        assert_eq!(report.split, SplitSizes { train: 1, validation: 0, test: 1 });
        assert_eq!(report.test.samples, 1);
        assert!(out.join("model.json").exists());
    }

    #[test]
    fn test_unwritable_output_fails_the_run() {
        let out = temp_dir("unwritable");
        std::fs::create_dir_all(&out).unwrap();
        let blocker = out.join("plain-file");
        std::fs::write(&blocker, b"x").unwrap();

        let cfg = TrainConfig {
            output_dir: blocker.join("model").to_string_lossy().into_owned(),
            epochs:     1,
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg)
            .execute_with(&InMemorySource::new(ten_records()))
            .unwrap_err();

        assert!(err.to_string().starts_with("Export to"));
        assert!(!blocker.join("model").join("model.json").exists());
    }
}
