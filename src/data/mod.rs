// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a raw table and model-ready numbers:
//
//   embedded CSV / downloaded CSV
//       │
//       ▼
//   loader.rs        → TabularDataset (records + targets)
//       │
//       ▼
//   splitter.rs      → seeded train/test partitions
//       │
//       ▼
//   preprocessor.rs  → StandardScaler fitted on train only
//
// No ML framework code lives here; the ml layer receives
// already-scaled ndarray tables.

/// Labelled table type shared by every loader
pub mod dataset;

/// Iris (embedded) and California housing (CSV) sources
pub mod loader;

/// Seeded train/test split
pub mod splitter;

/// Zero-mean / unit-variance feature scaler
pub mod preprocessor;
