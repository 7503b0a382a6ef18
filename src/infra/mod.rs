// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the application layer:
//
//   tfjs.rs: TensorFlow.js layers-model export, plus reading
//                an export back (topology summary, Burn model)
//
//   metrics.rs: training history and the per-epoch CSV log

/// TF.js layers-model writer and reader
pub mod tfjs;

/// Training history and CSV metrics logger
pub mod metrics;
