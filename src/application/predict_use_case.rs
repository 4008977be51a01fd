// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Offline single-row prediction from a saved artifact: the same
// load path the server uses, without the HTTP layer.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::domain::prediction::Prediction;
use crate::domain::traits::Predictor;
use crate::infra::artifact_store::ArtifactStore;
use crate::ml::inferencer::Pipeline;

pub struct PredictUseCase {
    model_name: String,
    pipeline:   Pipeline,
}

impl PredictUseCase {
    /// Load `model_dir/model_name` once; reuse for many rows.
    pub fn new(model_dir: impl Into<PathBuf>, model_name: &str) -> Result<Self> {
        let store    = ArtifactStore::new(model_dir);
        let pipeline = store
            .load_pipeline(model_name)
            .with_context(|| format!("Cannot load model '{model_name}'"))?;

        tracing::info!(
            "Loaded {} model '{}' (features: {})",
            pipeline.kind(),
            model_name,
            pipeline.feature_names().join(", ")
        );
        Ok(Self { model_name: model_name.to_string(), pipeline })
    }

    pub fn predict(&self, features: &[f64]) -> Result<Prediction> {
        self.pipeline
            .predict(features)
            .with_context(|| format!("Model '{}' rejected the input", self.model_name))
    }
}
