// ============================================================
// Layer 3 — Prediction Domain Types
// ============================================================
// What a model is (classifier or regressor) and what it returns
// for one row of features.
//
// A prediction is always a single scalar — the serving layer
// never returns batches, because every request is reshaped to
// exactly one sample.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two families of model this crate can train and serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Multi-layer perceptron over a fixed set of classes
    Classification,

    /// Ordinary least-squares linear model
    Regression,
}

impl ModelKind {
    /// Artifact filename written by the training command for this kind
    pub fn default_artifact_name(self) -> &'static str {
        match self {
            ModelKind::Classification => "iris_classification.bin",
            ModelKind::Regression     => "housing_regression.bin",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Classification => f.write_str("classification"),
            ModelKind::Regression     => f.write_str("regression"),
        }
    }
}

/// A single-row model output.
///
/// Serialised untagged so the JSON body carries a bare number:
/// class labels become integers, regression outputs become floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prediction {
    /// Index of the winning class
    Class(u32),

    /// Continuous regression output
    Value(f64),
}

impl Prediction {
    /// Numeric view of the prediction, used by metrics and logging
    pub fn as_f64(&self) -> f64 {
        match *self {
            Prediction::Class(label) => label as f64,
            Prediction::Value(value) => value,
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Class(label) => write!(f, "class {label}"),
            Prediction::Value(value) => write!(f, "{value}"),
        }
    }
}
