// ============================================================
// Layer 5 — Detector
// ============================================================
// Loads an exported model directory and scores page elements
// the way the browser extension does: extract the six features,
// run the network, call it an ad when p > 0.5.
use anyhow::Result;
use std::path::Path;

use crate::data::batcher::features_tensor;
use crate::domain::element::UnlabeledElement;
use crate::domain::features::extract_unlabeled;
use crate::infra::tfjs;
use crate::ml::backend::{init_device, BackendDevice, InnerBackend};
use crate::ml::evaluator::{read_probabilities, DECISION_THRESHOLD};
use crate::ml::model::AdDetectorModel;

/// Model output for one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub probability: f32,
    pub is_ad:       bool,
}

pub struct Detector {
    model:  AdDetectorModel<InnerBackend>,
    device: BackendDevice,
}

impl Detector {
    pub fn from_export(dir: &Path) -> Result<Self> {
        let device = init_device();
        let model  = tfjs::load_model::<InnerBackend>(dir, &device)?;
        Ok(Self { model, device })
    }

    pub fn from_model(model: AdDetectorModel<InnerBackend>, device: BackendDevice) -> Self {
        Self { model, device }
    }

    pub fn score(&self, elements: &[UnlabeledElement]) -> Result<Vec<Detection>> {
        if elements.is_empty() {
            return Ok(Vec::new());
        }

        let values: Vec<f32> = elements
            .iter()
            .flat_map(extract_unlabeled)
            .collect();
        let input  = features_tensor::<InnerBackend>(values, elements.len(), &self.device);
        let logits = self.model.forward_logits(input);

        let detections = read_probabilities(logits)?
            .into_iter()
            .map(|probability| Detection { probability, is_ad: probability > DECISION_THRESHOLD })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Scored {} elements, {} flagged as ads",
            detections.len(),
            detections.iter().filter(|d| d.is_ad).count()
        );
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::element::ElementRecord;
    use crate::infra::tfjs::TfjsExporter;
    use crate::ml::model::AdDetectorConfig;

    #[test]
    fn test_export_then_detect() {
        let device = init_device();
        let model: AdDetectorModel<InnerBackend> = AdDetectorConfig::new().init(&device);
        let dir = std::env::temp_dir().join(format!("ad-detect-detector-{}", std::process::id()));
        TfjsExporter::new(&dir).export(&model).unwrap();

        let elements: Vec<UnlabeledElement> = vec![
            ElementRecord::new(300.0, 250.0, "IMG", "", "ad-box", true).into(),
            ElementRecord::new(800.0, 40.0, "DIV", "nav", "menu", false).into(),
        ];

        let in_memory = Detector::from_model(model, device).score(&elements).unwrap();
        let reloaded  = Detector::from_export(&dir).unwrap().score(&elements).unwrap();

        assert_eq!(reloaded.len(), 2);
        for (a, b) in in_memory.iter().zip(&reloaded) {
            assert!((a.probability - b.probability).abs() < 1e-6);
            assert_eq!(b.is_ad, b.probability > 0.5);
        }
    }

    #[test]
    fn test_no_elements_no_detections() {
        let device = init_device();
        let model: AdDetectorModel<InnerBackend> = AdDetectorConfig::new().init(&device);
        assert!(Detector::from_model(model, device).score(&[]).unwrap().is_empty());
    }
}
