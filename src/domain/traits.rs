// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between layers:
//
//   DatasetSource — anything that can produce a labelled table
//                   (built-in Iris, housing CSV, ...)
//   Predictor     — anything that maps one feature row to one
//                   prediction (fitted MLP, linear model, mocks)
//
// The HTTP layer only ever sees `dyn Predictor`, so a model
// backend can be swapped without touching the routes.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use thiserror::Error;

use crate::data::dataset::TabularDataset;
use crate::domain::prediction::Prediction;

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Any component that can load a labelled tabular dataset.
///
/// Implementations:
///   - IrisSource    → embedded 150-row Iris table
///   - HousingSource → California housing CSV (local or fetched)
pub trait DatasetSource {
    /// Load the complete dataset, unsplit and unscaled.
    fn load(&self) -> Result<TabularDataset>;
}

// ─── PredictError ─────────────────────────────────────────────────────────────
/// Why a single-row prediction could not be produced.
///
/// Every variant is a client-side problem: the HTTP layer maps
/// all of them to 400 with the message below.
#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("feature at index {index} is not a finite number")]
    NonFinite { index: usize },

    #[error("feature at index {index} overflows after scaling")]
    ScaledOverflow { index: usize },

    #[error("model failed to produce a prediction: {0}")]
    Model(String),
}

// ─── Predictor ────────────────────────────────────────────────────────────────
/// Any fitted model that can score exactly one row of features.
pub trait Predictor: Send + Sync {
    /// Number of features a row must contain
    fn n_features(&self) -> usize;

    /// Score one row. Implementations must reject rows whose
    /// length differs from `n_features()`.
    fn predict(&self, features: &[f64]) -> Result<Prediction, PredictError>;
}

/// Shared width and finiteness check used by every Predictor.
pub fn validate_row(features: &[f64], expected: usize) -> Result<(), PredictError> {
    if features.len() != expected {
        return Err(PredictError::FeatureCount {
            expected,
            actual: features.len(),
        });
    }
    if let Some(index) = features.iter().position(|v| !v.is_finite()) {
        return Err(PredictError::NonFinite { index });
    }
    Ok(())
}
