use std::{fmt, sync::Arc};

use crate::domain::traits::Predictor;

/// The serving context handed to every request handler.
///
/// Built once at startup and never mutated afterwards, so it is
/// shared across worker threads behind an `Arc` without locking.
/// A service without a model still answers /health and /test;
/// /predict reports it as not ready.
pub struct ModelService {
    model_name: String,
    model:      Option<Arc<dyn Predictor>>,
}

impl ModelService {
    pub fn ready(model_name: impl Into<String>, model: Arc<dyn Predictor>) -> Self {
        Self { model_name: model_name.into(), model: Some(model) }
    }

    pub fn not_ready(model_name: impl Into<String>) -> Self {
        Self { model_name: model_name.into(), model: None }
    }

    pub fn model(&self) -> Option<&dyn Predictor> {
        self.model.as_deref()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl fmt::Debug for ModelService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelService")
            .field("model_name", &self.model_name)
            .field("loaded", &self.model.is_some())
            .finish()
    }
}
