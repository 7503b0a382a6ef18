// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the dataset file to tensor batches:
//
//   ad_dataset.json
//       │
//       ▼
//   JsonElementLoader  → reads the JSON array of ElementRecords
//       │
//       ▼
//   extract_features   → six numbers per element (domain layer)
//       │
//       ▼
//   split_positional   → 70% train / 15% validation / 15% test
//       │
//       ▼
//   AdDataset          → implements Burn's Dataset trait
//       │
//       ▼
//   AdBatcher          → stacks samples into [N, 6] tensors
//       │
//       ▼
//   DataLoader         → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads element records from a JSON file
pub mod loader;

/// Implements Burn's Dataset trait for encoded samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Positional train/validation/test split
pub mod splitter;
