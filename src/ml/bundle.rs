// ============================================================
// Layer 5 — Model Bundle
// ============================================================
// Everything the server needs to reproduce a trained model's
// predictions, in one serialisable value:
//
//   feature_names — expected input width and column order
//   scaler        — mean/scale fitted on the train partition
//   params        — the fitted model's parameters
//   summary       — how it was trained and how well it scored
//
// The bundle is backend-free: MLP weights are copied out of burn
// into plain vectors so serving never needs an ML framework.
// infra::artifact_store handles the on-disk framing.

use serde::{Deserialize, Serialize};

use crate::data::preprocessor::StandardScaler;
use crate::domain::prediction::ModelKind;

/// One dense layer. `weight` is row-major [inputs, outputs].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseParams {
    pub inputs:  usize,
    pub outputs: usize,
    pub weight:  Vec<f32>,
    pub bias:    Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelParams {
    /// ReLU MLP; the last layer emits one logit per class
    Mlp { layers: Vec<DenseParams> },

    /// y = x · coefficients + intercept
    Linear { coefficients: Vec<f64>, intercept: f64 },
}

impl ModelParams {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelParams::Mlp { .. }    => ModelKind::Classification,
            ModelParams::Linear { .. } => ModelKind::Regression,
        }
    }
}

/// Held-out scores computed right after fitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Evaluation {
    Classification { accuracy: f64 },
    Regression { mse: f64, r2: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub dataset:    String,
    pub seed:       u64,
    pub test_size:  f64,
    pub n_train:    usize,
    pub n_test:     usize,
    pub evaluation: Evaluation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub feature_names: Vec<String>,
    pub scaler:        StandardScaler,
    pub params:        ModelParams,
    pub summary:       TrainingSummary,
}

impl ModelBundle {
    pub fn kind(&self) -> ModelKind {
        self.params.kind()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}
