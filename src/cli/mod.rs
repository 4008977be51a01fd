// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with clap.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`   — fit a classifier or regressor and save it
//   2. `serve`   — load a saved model and serve it over HTTP
//   3. `predict` — load a saved model and predict one row
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, ServeArgs, TrainCommand, TrainTarget};

use crate::ml::bundle::Evaluation;

#[derive(Parser, Debug)]
#[command(
    name = "model-serve",
    version,
    about = "Train small tabular models and serve single-row predictions over HTTP."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. This layer only routes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(cmd)    => run_train(cmd),
            Commands::Serve(args)   => run_serve(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(cmd: TrainCommand) -> Result<()> {
    use crate::application::train_use_case::{TrainClassifierUseCase, TrainRegressorUseCase};

    let report = match cmd.target {
        TrainTarget::Classification(args) => TrainClassifierUseCase::new(args.into()).execute()?,
        TrainTarget::Regression(args)     => TrainRegressorUseCase::new(args.into()).execute()?,
    };

    match report.evaluation {
        Evaluation::Classification { accuracy } => {
            println!("Accuracy: {:.4}", accuracy);
        }
        Evaluation::Regression { mse, r2 } => {
            println!("Mean Squared Error: {:.4}", mse);
            println!("R-squared: {:.4}", r2);
        }
    }
    println!("Model saved to {}", report.path.display());
    Ok(())
}

fn run_serve(args: ServeArgs) -> Result<()> {
    use crate::application::serve_use_case::ServeUseCase;

    tracing::info!("Starting server for model '{}' in {:?} mode", args.model, args.mode);
    ServeUseCase::new(args.into()).execute()
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case   = PredictUseCase::new(args.model_dir, &args.model)?;
    let prediction = use_case.predict(&args.features)?;
    println!("{}", serde_json::json!({ "prediction": prediction }));
    Ok(())
}
