// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe what the system works with:
// page elements, the numeric features derived from them,
// and the traits other layers implement.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// One labelled DOM element from the dataset file
pub mod element;

// ElementRecord → FeatureVector
pub mod features;

// Core abstractions (traits) that other layers implement
pub mod traits;
