// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fits the ad classifier with Burn's DataLoader and Adam.
//
//   - Training runs on TrainBackend (Autodiff<Inner>)
//   - model.valid() drops autodiff for the validation pass
//   - The schedule is fixed: no early stopping, no checkpoints.
//     Whatever weights exist after the last epoch are returned.
//
// Reference: Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{AdBatch, AdBatcher},
    dataset::{AdDataset, AdSample},
};
use crate::infra::metrics::{EpochMetrics, TrainingHistory};
use crate::ml::backend::{BackendDevice, InnerBackend, TrainBackend};
use crate::ml::evaluator::{binary_cross_entropy, eval_loader, evaluate_batches, RunningStats};
use crate::ml::model::{AdDetectorConfig, AdDetectorModel};

pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: AdDataset,
    val_dataset:   AdDataset,
    device:        &BackendDevice,
) -> Result<(AdDetectorModel<InnerBackend>, TrainingHistory)> {
    if train_dataset.is_empty() {
        bail!("Training partition is empty; the dataset needs at least 2 records");
    }
    if cfg.batch_size == 0 {
        bail!("Batch size must be at least 1");
    }

    <TrainBackend as Backend>::seed(cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = AdDetectorConfig::new();
    let mut model: AdDetectorModel<TrainBackend> = model_cfg.init(device);
    tracing::info!(
        "Model ready: {} dense layers, {} parameters",
        model.layers().len(),
        model.num_params()
    );

    // ── Adam optimiser (Keras defaults) ───────────────────────────────────────
    let mut optim = AdamConfig::new()
        .with_beta_1(0.9)
        .with_beta_2(0.999)
        .with_epsilon(1e-7)
        .init();

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_samples = train_dataset.sample_count();
    let train_ads     = train_dataset.positive_count();
    let train_loader  = DataLoaderBuilder::<TrainBackend, AdSample, AdBatch<TrainBackend>>::new(
            AdBatcher::<TrainBackend>::new(),
        )
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .set_device(device.clone())
        .build(train_dataset);

    let val_loader = if val_dataset.is_empty() {
        tracing::warn!("Validation partition is empty; skipping validation metrics");
        None
    } else {
        Some(eval_loader::<InnerBackend>(val_dataset, cfg.batch_size, device))
    };

    tracing::info!(
        "Training on {} samples ({} ads) for {} epochs (batch size {})",
        train_samples, train_ads, cfg.epochs, cfg.batch_size
    );

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut history = TrainingHistory::default();

    for epoch in 1..=cfg.epochs {
        let mut stats = RunningStats::default();

        for batch in train_loader.iter() {
            let logits = model.forward_logits(batch.features);
            let loss   = binary_cross_entropy(logits.clone(), batch.targets.clone());

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            stats.record_batch(loss_val, logits, batch.targets)?;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }

        let train = stats.metrics();
        let val = match &val_loader {
            Some(loader) => Some(evaluate_batches(&model.valid(), loader)?),
            None         => None,
        };

        let metrics = EpochMetrics::new(
            epoch,
            train.loss,
            train.accuracy,
            val.map(|v| v.loss),
            val.map(|v| v.accuracy),
        );
        println!("Epoch {:>3}/{} | {}", epoch, cfg.epochs, metrics.summary());
        history.push(metrics);
    }

    tracing::info!("Training complete");
    Ok((model.valid(), history))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::element::ElementRecord;
    use crate::ml::backend::init_device;

    fn config() -> TrainConfig {
        TrainConfig { epochs: 10, batch_size: 32, ..TrainConfig::default() }
    }

    #[test]
    fn test_constant_label_converges() {
        let device  = init_device();
        let record  = ElementRecord::new(100.0, 50.0, "IFRAME", "ad-slot-1", "", true);
        let records = vec![record; 320];
        let train   = AdDataset::from_records(&records[..256]);
        let val     = AdDataset::from_records(&records[256..]);

        let (_, history) = run_training(&config(), train, val, &device).unwrap();

        assert_eq!(history.len(), 10);
        let last = history.last().unwrap();
        assert_eq!(last.train_accuracy, 1.0);
        assert_eq!(last.val_accuracy, Some(1.0));
    }

    #[test]
    fn test_history_without_validation() {
        let device  = init_device();
        let records = vec![
            ElementRecord::new(300.0, 250.0, "IMG", "", "ad", true),
            ElementRecord::new(640.0, 20.0, "DIV", "nav", "menu", false),
        ];
        let cfg = TrainConfig { epochs: 2, batch_size: 4, ..TrainConfig::default() };

        let (model, history) = run_training(
            &cfg,
            AdDataset::from_records(&records),
            AdDataset::new(Vec::new()),
            &device,
        ).unwrap();

        assert_eq!(history.len(), 2);
        assert!(history.epochs().iter().all(|m| m.val_loss.is_none()));
        assert_eq!(model.layer_shapes().len(), 4);
    }

    #[test]
    fn test_empty_training_partition_is_an_error() {
        let device = init_device();
        let result = run_training(
            &config(),
            AdDataset::new(Vec::new()),
            AdDataset::new(Vec::new()),
            &device,
        );
        assert!(result.is_err());
    }
}
