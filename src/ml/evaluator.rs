// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Loss and accuracy over a held-out partition, using the same
// definitions as training:
//
//   loss     = mean binary cross-entropy over every sample
//   accuracy = fraction of samples where (p > 0.5) == label
//
// Batch losses are weighted by batch size, so a short final
// batch counts for exactly its samples.

use anyhow::{anyhow, bail, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    nn::loss::BinaryCrossEntropyLossConfig,
    prelude::*,
    tensor::activation::sigmoid,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::{
    batcher::{AdBatch, AdBatcher},
    dataset::{AdDataset, AdSample},
};
use crate::ml::model::AdDetectorModel;

/// Probability above which an element is called an ad
pub const DECISION_THRESHOLD: f32 = 0.5;

/// Scalar results of evaluating a model on one partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub loss:     f64,
    pub accuracy: f64,
    pub samples:  usize,
}

pub type BatchLoader<B> = Arc<dyn DataLoader<B, AdBatch<B>>>;

/// Build an unshuffled loader over `dataset`.
pub fn eval_loader<B: Backend>(
    dataset:    AdDataset,
    batch_size: usize,
    device:     &B::Device,
) -> BatchLoader<B> {
    DataLoaderBuilder::<B, AdSample, AdBatch<B>>::new(AdBatcher::<B>::new())
        .batch_size(batch_size)
        .num_workers(1)
        .set_device(device.clone())
        .build(dataset)
}

/// Evaluate `model` on `dataset`. An empty partition is an error.
pub fn evaluate<B: Backend>(
    model:      &AdDetectorModel<B>,
    dataset:    AdDataset,
    batch_size: usize,
    device:     &B::Device,
) -> Result<EvalMetrics> {
    if dataset.is_empty() {
        bail!("Cannot evaluate on an empty partition");
    }
    let loader = eval_loader::<B>(dataset, batch_size, device);
    let metrics = evaluate_batches(model, &loader)?;
    tracing::debug!(
        "Evaluated {} samples: loss={:.4} accuracy={:.4}",
        metrics.samples, metrics.loss, metrics.accuracy
    );
    Ok(metrics)
}

/// Run every batch of `loader` through `model` without updating it.
pub fn evaluate_batches<B: Backend>(
    model:  &AdDetectorModel<B>,
    loader: &BatchLoader<B>,
) -> Result<EvalMetrics> {
    let mut stats = RunningStats::default();

    for batch in loader.iter() {
        let logits = model.forward_logits(batch.features);
        let loss   = binary_cross_entropy(logits.clone(), batch.targets.clone());

        stats.record(
            loss.into_scalar().elem::<f64>(),
            &read_probabilities(logits)?,
            &read_targets(batch.targets)?,
        );
    }

    Ok(stats.metrics())
}

/// Mean binary cross-entropy of sigmoid(logits) against 0/1 targets.
/// Computed on logits, which stays finite when the sigmoid saturates.
pub fn binary_cross_entropy<B: Backend>(
    logits:  Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
) -> Tensor<B, 1> {
    let logits = logits.flatten::<1>(0, 1);
    BinaryCrossEntropyLossConfig::new()
        .with_logits(true)
        .init(&logits.device())
        .forward(logits, targets)
}

pub fn predicted_label(probability: f32) -> i64 {
    i64::from(probability > DECISION_THRESHOLD)
}

/// Sigmoid of `[batch, 1]` logits, copied to the host.
pub fn read_probabilities<B: Backend>(logits: Tensor<B, 2>) -> Result<Vec<f32>> {
    sigmoid(logits)
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read probabilities: {e:?}"))
}

fn read_targets<B: Backend>(targets: Tensor<B, 1, Int>) -> Result<Vec<i64>> {
    targets
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| anyhow!("Cannot read targets: {e:?}"))
}

// ─── RunningStats ─────────────────────────────────────────────────────────────
/// Accumulates loss and accuracy batch by batch.
#[derive(Debug, Default)]
pub struct RunningStats {
    loss_sum: f64,
    examples: usize,
    correct:  usize,
}

impl RunningStats {
    pub fn record(&mut self, batch_loss: f64, probabilities: &[f32], targets: &[i64]) {
        self.loss_sum += batch_loss * targets.len() as f64;
        self.examples += targets.len();
        self.correct  += probabilities
            .iter()
            .zip(targets)
            .filter(|(p, t)| predicted_label(**p) == **t)
            .count();
    }

    /// Record a training batch straight from its tensors.
    pub fn record_batch<B: Backend>(
        &mut self,
        batch_loss: f64,
        logits:     Tensor<B, 2>,
        targets:    Tensor<B, 1, Int>,
    ) -> Result<()> {
        let probabilities = read_probabilities(logits)?;
        let targets       = read_targets(targets)?;
        self.record(batch_loss, &probabilities, &targets);
        Ok(())
    }

    pub fn metrics(&self) -> EvalMetrics {
        let (loss, accuracy) = if self.examples == 0 {
            (f64::NAN, 0.0)
        } else {
            (
                self.loss_sum / self.examples as f64,
                self.correct as f64 / self.examples as f64,
            )
        };
        EvalMetrics { loss, accuracy, samples: self.examples }
    }
}
