// ============================================================
// Layer 2 — Training Use Cases
// ============================================================
// Orchestrates the two training pipelines in order:
//
//   Step 1: Load the dataset              (Layer 4 - data)
//   Step 2: Seeded train/test split       (Layer 4 - data)
//   Step 3: Fit the scaler on train only  (Layer 4 - data)
//   Step 4: Fit the model                 (Layer 5 - ml)
//   Step 5: Evaluate on the test split    (Layer 5 - ml)
//   Step 6: Save the bundle               (Layer 6 - infra)
//
// Classification: Iris, MLP (100, 50), Adam, 500 epochs.
// Regression:     California housing, ordinary least squares.

use anyhow::{bail, Context, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    dataset::TabularDataset,
    loader::{HousingSource, IrisSource, DEFAULT_HOUSING_URL},
    preprocessor::StandardScaler,
    splitter::train_test_split,
};
use crate::domain::prediction::ModelKind;
use crate::domain::traits::{DatasetSource, Predictor};
use crate::infra::{artifact_store::ArtifactStore, metrics::MetricsLogger};
use crate::ml::{
    bundle::{Evaluation, ModelBundle, ModelParams, TrainingSummary},
    evaluation::{accuracy, mean_squared_error, r2_score},
    inferencer::{LinearRegressor, MlpClassifier},
    linear::fit_least_squares,
    trainer::{train_mlp, LabelledTable, MlpTrainingConfig},
};

/// How many test rows get their prediction logged after training.
const PREVIEW_ROWS: usize = 5;

// ─── Classification configuration ────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub model_dir:     PathBuf,
    pub model_name:    String,
    pub test_size:     f64,
    pub seed:          u64,
    pub epochs:        usize,
    pub lr:            f64,
    pub batch_size:    usize,
    pub hidden_layers: Vec<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model_dir:     PathBuf::from("model_dump"),
            model_name:    ModelKind::Classification.default_artifact_name().to_string(),
            test_size:     0.2,
            seed:          42,
            epochs:        500,
            lr:            1e-3,
            batch_size:    200,
            hidden_layers: vec![100, 50],
        }
    }
}

// ─── Regression configuration ────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionConfig {
    pub model_dir:  PathBuf,
    pub model_name: String,
    pub test_size:  f64,
    pub seed:       u64,
    /// Local cache of the housing CSV
    pub data_path:  PathBuf,
    /// Where to fetch the CSV when the cache is absent
    pub data_url:   String,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            model_dir:  PathBuf::from("model_dump"),
            model_name: ModelKind::Regression.default_artifact_name().to_string(),
            test_size:  0.2,
            seed:       42,
            data_path:  PathBuf::from("data/housing.csv"),
            data_url:   DEFAULT_HOUSING_URL.to_string(),
        }
    }
}

/// What a training run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub path:       PathBuf,
    pub evaluation: Evaluation,
}

/// Split and scale: shared by both pipelines.
struct Prepared {
    train:   TabularDataset,
    test:    TabularDataset,
    scaler:  StandardScaler,
    train_x: Array2<f64>,
    test_x:  Array2<f64>,
}

fn prepare(dataset: &TabularDataset, test_size: f64, seed: u64) -> Result<Prepared> {
    let (train, test) = train_test_split(dataset, test_size, seed)?;
    tracing::info!(
        "Split '{}': {} train, {} test (seed {})",
        dataset.name,
        train.n_samples(),
        test.n_samples(),
        seed
    );

    // Fitted on train only so no test statistics leak into the model.
    let scaler  = StandardScaler::fit(&train.records)?;
    let train_x = scaler.transform(&train.records);
    let test_x  = scaler.transform(&test.records);

    Ok(Prepared { train, test, scaler, train_x, test_x })
}

// ─── TrainClassifierUseCase ───────────────────────────────────────────────────
pub struct TrainClassifierUseCase {
    config: TrainConfig,
    source: Box<dyn DatasetSource>,
}

impl TrainClassifierUseCase {
    /// Train on the embedded Iris table.
    pub fn new(config: TrainConfig) -> Self {
        Self::with_source(config, Box::new(IrisSource))
    }

    pub fn with_source(config: TrainConfig, source: Box<dyn DatasetSource>) -> Self {
        Self { config, source }
    }

    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;

        // ── Step 1: Load ──────────────────────────────────────────────────────
        let dataset   = self.source.load()?;
        let n_classes = dataset.n_classes()?;
        tracing::info!(
            "Loaded '{}': {} rows, {} features, {} classes",
            dataset.name,
            dataset.n_samples(),
            dataset.n_features(),
            n_classes
        );

        // ── Steps 2-3: Split + scale ──────────────────────────────────────────
        let prepared     = prepare(&dataset, cfg.test_size, cfg.seed)?;
        let train_labels = prepared.train.class_labels()?;
        let test_labels  = prepared.test.class_labels()?;

        // ── Step 4: Fit the MLP ───────────────────────────────────────────────
        let store   = ArtifactStore::new(&cfg.model_dir);
        let metrics = MetricsLogger::create(MetricsLogger::path_for_artifact(
            &store.path_for(&cfg.model_name),
        ))?;

        let trained = train_mlp(
            &MlpTrainingConfig {
                hidden_layers: cfg.hidden_layers.clone(),
                epochs:        cfg.epochs,
                learning_rate: cfg.lr,
                batch_size:    cfg.batch_size,
                seed:          cfg.seed,
            },
            LabelledTable { records: &prepared.train_x, labels: &train_labels },
            LabelledTable { records: &prepared.test_x,  labels: &test_labels },
            n_classes,
            Some(&metrics),
        )?;
        if let Some(last) = trained.history.last() {
            tracing::info!(
                "Finished {} epochs: train_loss={:.4}; metrics in '{}'",
                last.epoch,
                last.train_loss,
                metrics.csv_path().display()
            );
        }

        // ── Step 5: Evaluate ──────────────────────────────────────────────────
        let classifier = MlpClassifier::from_params(&trained.layers)?;
        if classifier.n_classes() != n_classes {
            bail!("trained MLP emits {} logits for {} classes", classifier.n_classes(), n_classes);
        }
        let mut predicted = Vec::with_capacity(test_labels.len());
        for (i, row) in prepared.test_x.rows().into_iter().enumerate() {
            let row = row.to_vec();
            if i < PREVIEW_ROWS {
                let proba = classifier.predict_proba(&row)?;
                tracing::info!("Test row {i}: probabilities {:.3?}", proba);
            }
            predicted.push(classifier.predict(&row)?.as_f64() as u32);
        }
        let acc = accuracy(&predicted, &test_labels);
        tracing::info!("Test accuracy: {:.2}%", acc * 100.0);

        // ── Step 6: Save ──────────────────────────────────────────────────────
        let evaluation = Evaluation::Classification { accuracy: acc };
        let bundle = ModelBundle {
            feature_names: dataset.feature_names.clone(),
            scaler:        prepared.scaler,
            params:        ModelParams::Mlp { layers: trained.layers },
            summary:       TrainingSummary {
                dataset:   dataset.name.clone(),
                seed:      cfg.seed,
                test_size: cfg.test_size,
                n_train:   prepared.train.n_samples(),
                n_test:    prepared.test.n_samples(),
                evaluation,
            },
        };
        let path = store.save(&cfg.model_name, &bundle)?;
        tracing::info!("Saved classification model to '{}'", path.display());

        Ok(TrainReport { path, evaluation })
    }
}

// ─── TrainRegressorUseCase ────────────────────────────────────────────────────
pub struct TrainRegressorUseCase {
    config: RegressionConfig,
    source: Box<dyn DatasetSource>,
}

impl TrainRegressorUseCase {
    /// Train on the California housing CSV (cached or fetched).
    pub fn new(config: RegressionConfig) -> Self {
        let source = HousingSource::new(&config.data_path, &config.data_url);
        Self::with_source(config, Box::new(source))
    }

    pub fn with_source(config: RegressionConfig, source: Box<dyn DatasetSource>) -> Self {
        Self { config, source }
    }

    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;

        let dataset = self.source.load().context("Cannot load the regression dataset")?;
        tracing::info!(
            "Loaded '{}': {} rows, {} features",
            dataset.name,
            dataset.n_samples(),
            dataset.n_features()
        );

        let prepared = prepare(&dataset, cfg.test_size, cfg.seed)?;
        let params   = fit_least_squares(&prepared.train_x, &prepared.train.targets)?;

        let regressor = match &params {
            ModelParams::Linear { coefficients, intercept } => {
                LinearRegressor::new(coefficients.clone(), *intercept)
            }
            ModelParams::Mlp { .. } => bail!("least squares produced non-linear params"),
        };

        let predicted = prepared
            .test_x
            .rows()
            .into_iter()
            .map(|row| -> Result<f64> { Ok(regressor.predict(&row.to_vec())?.as_f64()) })
            .collect::<Result<Vec<f64>>>()?;
        let truth = prepared.test.targets.to_vec();

        if let Some(first) = predicted.first() {
            tracing::info!("Prediction for first test row: {first:.4}");
        }
        tracing::info!(
            "First {} test predictions: {:.4?}",
            PREVIEW_ROWS.min(predicted.len()),
            &predicted[..PREVIEW_ROWS.min(predicted.len())]
        );

        let mse = mean_squared_error(&predicted, &truth);
        let r2  = r2_score(&predicted, &truth);
        tracing::info!("Test MSE: {mse:.4} | R²: {r2:.4}");

        let evaluation = Evaluation::Regression { mse, r2 };
        let bundle = ModelBundle {
            feature_names: dataset.feature_names.clone(),
            scaler:        prepared.scaler,
            params,
            summary:       TrainingSummary {
                dataset:   dataset.name.clone(),
                seed:      cfg.seed,
                test_size: cfg.test_size,
                n_train:   prepared.train.n_samples(),
                n_test:    prepared.test.n_samples(),
                evaluation,
            },
        };
        let path = ArtifactStore::new(&cfg.model_dir).save(&cfg.model_name, &bundle)?;
        tracing::info!("Saved regression model to '{}'", path.display());

        Ok(TrainReport { path, evaluation })
    }
}
