// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits so the
// concrete source of elements and the export target can be
// swapped without touching the pipeline.

use anyhow::Result;
use crate::domain::element::ElementRecord;

// ─── ElementSource ────────────────────────────────────────────────────────────
/// Any component that can produce the labelled training elements.
///
/// Implementations:
///   - JsonElementLoader → reads a JSON array from disk
pub trait ElementSource {
    /// Load every record, in source order.
    /// Order matters: the train/validation/test split is positional.
    fn load_all(&self) -> Result<Vec<ElementRecord>>;
}

// ─── InMemorySource ───────────────────────────────────────────────────────────
/// Hands out a fixed list of records. Used by tests and by callers
/// that already hold the records.
pub struct InMemorySource {
    records: Vec<ElementRecord>,
}

impl InMemorySource {
    pub fn new(records: Vec<ElementRecord>) -> Self {
        Self { records }
    }
}

impl ElementSource for InMemorySource {
    fn load_all(&self) -> Result<Vec<ElementRecord>> {
        Ok(self.records.clone())
    }
}
