// ============================================================
// Layer 2 — Detect Use Case
// ============================================================
// Scores a file of element descriptors with an exported model.
//   1. Load the elements (isAd optional)
//   2. Load the exported model
//   3. Return one Detection per element, in file order

use anyhow::Result;
use std::path::PathBuf;

use crate::data::loader::load_unlabeled;
use crate::domain::element::UnlabeledElement;
use crate::ml::inferencer::{Detection, Detector};

pub struct DetectUseCase {
    model_dir: PathBuf,
}

impl DetectUseCase {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self { model_dir: model_dir.into() }
    }

    pub fn detect_file(&self, elements_path: impl Into<PathBuf>) -> Result<Vec<(UnlabeledElement, Detection)>> {
        let elements  = load_unlabeled(&elements_path.into())?;
        let detector  = Detector::from_export(&self.model_dir)?;
        let detections = detector.score(&elements)?;
        Ok(elements.into_iter().zip(detections).collect())
    }
}
