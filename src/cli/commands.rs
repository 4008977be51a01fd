// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands and their flags:
//
//   train classification | train regression
//   serve
//   predict
//
// Each Args struct converts into its application-layer config
// through a From impl, so Layer 2 never sees clap types.

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::serve_use_case::{ServeConfig, ServeMode, DEFAULT_PORT};
use crate::application::train_use_case::{RegressionConfig, TrainConfig};
use crate::data::loader::DEFAULT_HOUSING_URL;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a model and save it under the model directory
    Train(TrainCommand),

    /// Serve a saved model over HTTP
    Serve(ServeArgs),

    /// Predict one row with a saved model
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
pub struct TrainCommand {
    #[command(subcommand)]
    pub target: TrainTarget,
}

#[derive(Subcommand, Debug)]
pub enum TrainTarget {
    /// MLP classifier on the Iris table
    Classification(ClassificationArgs),

    /// Least-squares regressor on the California housing table
    Regression(RegressionArgs),
}

// ─── train classification ─────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct ClassificationArgs {
    /// Directory the artifact is written to
    #[arg(long, default_value = "model_dump")]
    pub model_dir: PathBuf,

    /// Artifact file name
    #[arg(long, default_value = "iris_classification.bin")]
    pub model_name: String,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,

    /// Seed for the split, weight init and batch order
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, default_value_t = 500)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Mini-batch size, capped at the number of train rows
    #[arg(long, default_value_t = 200)]
    pub batch_size: usize,

    /// Hidden layer widths, comma separated
    #[arg(long, value_delimiter = ',', default_value = "100,50")]
    pub hidden_layers: Vec<usize>,
}

impl From<ClassificationArgs> for TrainConfig {
    fn from(a: ClassificationArgs) -> Self {
        TrainConfig {
            model_dir:     a.model_dir,
            model_name:    a.model_name,
            test_size:     a.test_size,
            seed:          a.seed,
            epochs:        a.epochs,
            lr:            a.lr,
            batch_size:    a.batch_size,
            hidden_layers: a.hidden_layers,
        }
    }
}

// ─── train regression ─────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct RegressionArgs {
    #[arg(long, default_value = "model_dump")]
    pub model_dir: PathBuf,

    #[arg(long, default_value = "housing_regression.bin")]
    pub model_name: String,

    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Housing CSV; downloaded here first if it does not exist
    #[arg(long, default_value = "data/housing.csv")]
    pub data_path: PathBuf,

    #[arg(long, default_value = DEFAULT_HOUSING_URL)]
    pub data_url: String,
}

impl From<RegressionArgs> for RegressionConfig {
    fn from(a: RegressionArgs) -> Self {
        RegressionConfig {
            model_dir:  a.model_dir,
            model_name: a.model_name,
            test_size:  a.test_size,
            seed:       a.seed,
            data_path:  a.data_path,
            data_url:   a.data_url,
        }
    }
}

// ─── serve ────────────────────────────────────────────────────────────────────
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Single thread on 127.0.0.1
    Dev,
    /// Four workers on 0.0.0.0 with a 30s graceful shutdown
    Production,
}

impl From<ModeArg> for ServeMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Dev        => ServeMode::Dev,
            ModeArg::Production => ServeMode::Production,
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Artifact file name inside the model directory
    #[arg(long, env = "MODEL_NAME")]
    pub model: String,

    #[arg(long, default_value = "model_dump")]
    pub model_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = ModeArg::Dev)]
    pub mode: ModeArg,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Start even if the model cannot be loaded; /predict answers 500
    #[arg(long)]
    pub serve_without_model: bool,
}

impl From<ServeArgs> for ServeConfig {
    fn from(a: ServeArgs) -> Self {
        ServeConfig {
            model_dir:           a.model_dir,
            model_name:          a.model,
            mode:                a.mode.into(),
            port:                a.port,
            serve_without_model: a.serve_without_model,
        }
    }
}

// ─── predict ──────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct PredictArgs {
    #[arg(long, env = "MODEL_NAME")]
    pub model: String,

    #[arg(long, default_value = "model_dump")]
    pub model_dir: PathBuf,

    /// One row of raw feature values, comma separated
    #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
    pub features: Vec<f64>,
}
