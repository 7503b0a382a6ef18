// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model and training code lives here.
//
//   backend.rs: backend aliases and the once-only device setup
//   model.rs: the 64 → 32 → 16 → 1 dense classifier
//   trainer.rs: the fixed-schedule Adam training loop
//   evaluator.rs: loss / accuracy over a held-out partition
//   inferencer.rs: scoring elements with an exported model
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Backend type aliases and device initialisation
pub mod backend;

/// Feed-forward ad classifier architecture
pub mod model;

/// Training loop with per-epoch validation
pub mod trainer;

/// Loss and accuracy on a held-out partition
pub mod evaluator;

/// Loads an export and scores elements
pub mod inferencer;
