use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::element::ElementRecord;
use crate::domain::features::{extract_features, FeatureVector};

/// One encoded training sample: six features and a 0/1 target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdSample {
    pub features: FeatureVector,
    pub label:    u8,
}

impl AdSample {
    pub fn from_record(record: &ElementRecord) -> Self {
        Self { features: extract_features(record), label: record.target() }
    }
}

#[derive(Debug, Clone)]
pub struct AdDataset {
    samples: Vec<AdSample>,
}

impl AdDataset {
    pub fn new(samples: Vec<AdSample>) -> Self { Self { samples } }

    pub fn from_records(records: &[ElementRecord]) -> Self {
        Self::new(records.iter().map(AdSample::from_record).collect())
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    pub fn is_empty(&self) -> bool { self.samples.is_empty() }

    pub fn positive_count(&self) -> usize {
        self.samples.iter().filter(|s| s.label == 1).count()
    }
}

impl Dataset<AdSample> for AdDataset {
    fn get(&self, index: usize) -> Option<AdSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
