// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Framework-free predictors rebuilt from a ModelBundle:
//
//   MlpClassifier   — dense ReLU forward pass, argmax over logits
//   LinearRegressor — dot product plus intercept
//   Pipeline        — width check → stored scaler → estimator
//
// Pipeline is what the server holds. The estimators assume their
// input is already scaled; Pipeline is the only thing that sees
// raw request features.

use anyhow::{bail, Result};
use ndarray::{Array1, Array2, ArrayView1};

use crate::data::preprocessor::StandardScaler;
use crate::domain::prediction::{ModelKind, Prediction};
use crate::domain::traits::{validate_row, PredictError, Predictor};
use crate::ml::bundle::{DenseParams, ModelBundle, ModelParams, TrainingSummary};

// ─── MlpClassifier ────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct MlpClassifier {
    /// (weight [inputs, outputs], bias [outputs]) per layer
    layers: Vec<(Array2<f64>, Array1<f64>)>,
}

impl MlpClassifier {
    /// Rebuild from stored layers, checking that consecutive
    /// widths line up.
    pub fn from_params(params: &[DenseParams]) -> Result<Self> {
        if params.is_empty() {
            bail!("MLP has no layers");
        }

        let mut layers = Vec::with_capacity(params.len());
        for (i, p) in params.iter().enumerate() {
            if p.weight.len() != p.inputs * p.outputs || p.bias.len() != p.outputs {
                bail!("layer {i} parameters do not match its {}x{} shape", p.inputs, p.outputs);
            }
            if i > 0 && params[i - 1].outputs != p.inputs {
                bail!(
                    "layer {i} expects {} inputs but layer {} emits {}",
                    p.inputs,
                    i - 1,
                    params[i - 1].outputs
                );
            }
            let weight = Array2::from_shape_vec(
                (p.inputs, p.outputs),
                p.weight.iter().map(|&w| w as f64).collect(),
            )?;
            let bias = p.bias.iter().map(|&b| b as f64).collect::<Array1<f64>>();
            layers.push((weight, bias));
        }

        Ok(Self { layers })
    }

    pub fn n_classes(&self) -> usize {
        self.layers.last().map_or(0, |(w, _)| w.ncols())
    }

    fn logits(&self, row: ArrayView1<f64>) -> Array1<f64> {
        let last  = self.layers.len() - 1;
        let mut x = row.to_owned();
        for (i, (weight, bias)) in self.layers.iter().enumerate() {
            x = x.dot(weight) + bias;
            if i < last {
                x.mapv_inplace(|v| v.max(0.0));
            }
        }
        x
    }

    /// Softmax class probabilities for one scaled row.
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, PredictError> {
        validate_row(row, self.n_features())?;
        let logits = self.logits(ArrayView1::from(row));

        let max   = logits.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        let exp   = logits.mapv(|v| (v - max).exp());
        let total = exp.sum();
        Ok(exp.iter().map(|e| e / total).collect())
    }
}

impl Predictor for MlpClassifier {
    fn n_features(&self) -> usize {
        self.layers.first().map_or(0, |(w, _)| w.nrows())
    }

    fn predict(&self, features: &[f64]) -> Result<Prediction, PredictError> {
        validate_row(features, self.n_features())?;
        let logits = self.logits(ArrayView1::from(features));

        // First maximum wins on ties.
        let mut best = 0usize;
        for (i, &v) in logits.iter().enumerate() {
            if !v.is_finite() {
                return Err(PredictError::Model(format!("logit {i} is not finite")));
            }
            if v > logits[best] {
                best = i;
            }
        }
        Ok(Prediction::Class(best as u32))
    }
}

// ─── LinearRegressor ──────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    coefficients: Array1<f64>,
    intercept:    f64,
}

impl LinearRegressor {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self { coefficients: Array1::from_vec(coefficients), intercept }
    }
}

impl Predictor for LinearRegressor {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> Result<Prediction, PredictError> {
        validate_row(features, self.n_features())?;
        let value = ArrayView1::from(features).dot(&self.coefficients) + self.intercept;
        if !value.is_finite() {
            return Err(PredictError::Model("regression output is not finite".to_string()));
        }
        Ok(Prediction::Value(value))
    }
}

// ─── Pipeline ─────────────────────────────────────────────────────────────────
/// Scaler plus estimator: the complete request-to-prediction path.
pub struct Pipeline {
    kind:          ModelKind,
    feature_names: Vec<String>,
    scaler:        StandardScaler,
    estimator:     Box<dyn Predictor>,
    summary:       TrainingSummary,
}

impl Pipeline {
    /// Rebuild a servable model from a decoded bundle, rejecting
    /// bundles whose parts disagree on the feature width.
    pub fn from_bundle(bundle: ModelBundle) -> Result<Self> {
        let kind  = bundle.kind();
        let width = bundle.n_features();
        let estimator: Box<dyn Predictor> = match bundle.params {
            ModelParams::Mlp { layers } => Box::new(MlpClassifier::from_params(&layers)?),
            ModelParams::Linear { coefficients, intercept } => {
                Box::new(LinearRegressor::new(coefficients, intercept))
            }
        };

        if bundle.scaler.n_features() != width
            || bundle.scaler.scale.len() != width
            || estimator.n_features() != width
        {
            bail!(
                "bundle is inconsistent: {} feature names, scaler width {}, model width {}",
                width,
                bundle.scaler.n_features(),
                estimator.n_features()
            );
        }

        Ok(Self {
            kind,
            feature_names: bundle.feature_names,
            scaler:        bundle.scaler,
            estimator,
            summary:       bundle.summary,
        })
    }

    pub fn kind(&self) -> ModelKind { self.kind }

    pub fn feature_names(&self) -> &[String] { &self.feature_names }

    pub fn summary(&self) -> &TrainingSummary { &self.summary }
}

impl Predictor for Pipeline {
    fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    fn predict(&self, features: &[f64]) -> Result<Prediction, PredictError> {
        validate_row(features, self.n_features())?;
        let scaled = self.scaler.transform_row(features);
        if let Some(index) = scaled.iter().position(|v| !v.is_finite()) {
            return Err(PredictError::ScaledOverflow { index });
        }
        self.estimator.predict(&scaled)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::bundle::Evaluation;

    /// 2 inputs → 2 classes; class 1 wins when x1 > x0.
    fn two_class_layers() -> Vec<DenseParams> {
        vec![DenseParams {
            inputs:  2,
            outputs: 2,
            weight:  vec![1.0, 0.0, 0.0, 1.0],
            bias:    vec![0.0, 0.0],
        }]
    }

    fn summary() -> TrainingSummary {
        TrainingSummary {
            dataset:    "unit".into(),
            seed:       1,
            test_size:  0.2,
            n_train:    4,
            n_test:     1,
            evaluation: Evaluation::Regression { mse: 0.0, r2: 1.0 },
        }
    }

    #[test]
    fn test_mlp_argmax() {
        let mlp = MlpClassifier::from_params(&two_class_layers()).unwrap();
        assert_eq!(mlp.predict(&[0.2, 0.9]).unwrap(), Prediction::Class(1));
        assert_eq!(mlp.predict(&[3.0, 1.0]).unwrap(), Prediction::Class(0));
    }

    #[test]
    fn test_mlp_hidden_relu() {
        // hidden unit = relu(x0); output = hidden - 1 vs constant 0
        let layers = vec![
            DenseParams { inputs: 1, outputs: 1, weight: vec![1.0], bias: vec![0.0] },
            DenseParams { inputs: 1, outputs: 2, weight: vec![0.0, 1.0], bias: vec![0.5, 0.0] },
        ];
        let mlp = MlpClassifier::from_params(&layers).unwrap();
        // negative input is clipped to 0 → logits [0.5, 0.0]
        assert_eq!(mlp.predict(&[-10.0]).unwrap(), Prediction::Class(0));
        assert_eq!(mlp.predict(&[2.0]).unwrap(),   Prediction::Class(1));
    }

    #[test]
    fn test_mlp_probabilities_sum_to_one() {
        let mlp   = MlpClassifier::from_params(&two_class_layers()).unwrap();
        let proba = mlp.predict_proba(&[0.3, -0.4]).unwrap();
        assert_eq!(proba.len(), 2);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(proba[0] > proba[1]);
    }

    #[test]
    fn test_mismatched_layers_rejected() {
        let layers = vec![
            DenseParams { inputs: 2, outputs: 3, weight: vec![0.0; 6], bias: vec![0.0; 3] },
            DenseParams { inputs: 4, outputs: 2, weight: vec![0.0; 8], bias: vec![0.0; 2] },
        ];
        assert!(MlpClassifier::from_params(&layers).is_err());
    }

    #[test]
    fn test_linear_prediction() {
        let lr = LinearRegressor::new(vec![2.0, -1.0], 0.5);
        assert_eq!(lr.predict(&[1.0, 1.0]).unwrap(), Prediction::Value(1.5));
    }

    #[test]
    fn test_pipeline_scales_before_predicting() {
        let bundle = ModelBundle {
            feature_names: vec!["a".into(), "b".into()],
            scaler: StandardScaler { mean: vec![10.0, 0.0], scale: vec![2.0, 1.0] },
            params: ModelParams::Linear { coefficients: vec![1.0, 0.0], intercept: 0.0 },
            summary: summary(),
        };
        let pipeline = Pipeline::from_bundle(bundle).unwrap();
        // (14 - 10) / 2 = 2
        assert_eq!(pipeline.predict(&[14.0, 99.0]).unwrap(), Prediction::Value(2.0));
    }

    #[test]
    fn test_pipeline_rejects_wrong_width() {
        let bundle = ModelBundle {
            feature_names: vec!["a".into(), "b".into()],
            scaler: StandardScaler { mean: vec![0.0, 0.0], scale: vec![1.0, 1.0] },
            params: ModelParams::Mlp { layers: two_class_layers() },
            summary: summary(),
        };
        let pipeline = Pipeline::from_bundle(bundle).unwrap();
        let err = pipeline.predict(&[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err, PredictError::FeatureCount { expected: 2, actual: 3 });
    }

    #[test]
    fn test_finite_input_overflowing_the_scaler() {
        let bundle = ModelBundle {
            feature_names: vec!["a".into(), "b".into()],
            scaler: StandardScaler { mean: vec![-1e308, 0.0], scale: vec![1.0, 1.0] },
            params: ModelParams::Linear { coefficients: vec![1.0, 1.0], intercept: 0.0 },
            summary: summary(),
        };
        let pipeline = Pipeline::from_bundle(bundle).unwrap();
        let err = pipeline.predict(&[1e308, 0.0]).unwrap_err();
        assert_eq!(err, PredictError::ScaledOverflow { index: 0 });
        assert_eq!(err.to_string(), "feature at index 0 overflows after scaling");
    }

    #[test]
    fn test_inconsistent_bundle_rejected() {
        let bundle = ModelBundle {
            feature_names: vec!["a".into(), "b".into(), "c".into()],
            scaler: StandardScaler { mean: vec![0.0; 3], scale: vec![1.0; 3] },
            params: ModelParams::Mlp { layers: two_class_layers() },
            summary: summary(),
        };
        assert!(Pipeline::from_bundle(bundle).is_err());
    }
}
