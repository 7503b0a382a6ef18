// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Reads the labelled element dump produced by the browser
// extension: one JSON array, one object per element.
//
//   [
//     {"width":300,"height":250,"tagName":"IMG","id":"","className":"ad-box","isAd":true},
//     ...
//   ]
//
// The file is read and parsed in one shot. Any record with a
// missing key or wrong type fails the whole load; nothing is
// skipped.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::element::{ElementRecord, UnlabeledElement};
use crate::domain::traits::ElementSource;

/// Loads labelled elements from a JSON file.
pub struct JsonElementLoader {
    path: PathBuf,
}

impl JsonElementLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ElementSource for JsonElementLoader {
    fn load_all(&self) -> Result<Vec<ElementRecord>> {
        let records: Vec<ElementRecord> = read_json_array(&self.path)?;

        let ads = records.iter().filter(|r| r.is_ad).count();
        tracing::info!(
            "Loaded {} elements from '{}' ({} ads, {} non-ads)",
            records.len(),
            self.path.display(),
            ads,
            records.len() - ads,
        );
        Ok(records)
    }
}

/// Load elements to be scored; `isAd` is optional here.
pub fn load_unlabeled(path: &Path) -> Result<Vec<UnlabeledElement>> {
    let elements: Vec<UnlabeledElement> = read_json_array(path)?;
    tracing::debug!("Loaded {} elements to score", elements.len());
    Ok(elements)
}

fn read_json_array<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read dataset '{}'", path.display()))?;

    serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not a JSON array of element objects", path.display()))
}
