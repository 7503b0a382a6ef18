// ============================================================
// Layer 4 — Ad Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<AdSample>
// into tensors the network can consume.
//
//   Input:  N samples, 6 features each
//   Output: features [N, 6] (float), targets [N] (int, 0 or 1)
//
// The features are flattened row by row and reshaped:
//   [s1_f1, ..., s1_f6, s2_f1, ..., sN_f6] → [N, 6]

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};
use std::marker::PhantomData;

use crate::data::dataset::AdSample;
use crate::domain::features::FEATURE_COUNT;

// ─── AdBatch ──────────────────────────────────────────────────────────────────
/// A batch of samples ready for the forward pass.
#[derive(Debug, Clone)]
pub struct AdBatch<B: Backend> {
    /// Feature rows, shape: [batch_size, 6]
    pub features: Tensor<B, 2>,

    /// Ground-truth labels, shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

// ─── AdBatcher ────────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct AdBatcher<B: Backend> {
    _marker: PhantomData<B>,
}

impl<B: Backend> AdBatcher<B> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<B: Backend> Batcher<B, AdSample, AdBatch<B>> for AdBatcher<B> {
    fn batch(&self, items: Vec<AdSample>, device: &B::Device) -> AdBatch<B> {
        let batch_size = items.len();

        let features: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();

        let labels: Vec<i64> = items
            .iter()
            .map(|s| i64::from(s.label))
            .collect();

        AdBatch {
            features: features_tensor(features, batch_size, device),
            targets:  Tensor::<B, 1, Int>::from_data(
                TensorData::new(labels, [batch_size]),
                device,
            ),
        }
    }
}

/// Build a `[rows, 6]` float tensor from row-major feature values.
pub fn features_tensor<B: Backend>(values: Vec<f32>, rows: usize, device: &B::Device) -> Tensor<B, 2> {
    Tensor::<B, 2>::from_data(TensorData::new(values, [rows, FEATURE_COUNT]), device)
}
