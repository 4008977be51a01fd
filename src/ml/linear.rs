// ============================================================
// Layer 5 — Ordinary Least Squares
// ============================================================
// Fits y = X·β + b by least squares using linfa-linear. The
// fitted coefficients are copied into ModelParams::Linear so the
// artifact carries no linfa types.

use anyhow::{anyhow, Result};
use linfa::prelude::*;
use linfa::DatasetBase;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};

use crate::ml::bundle::ModelParams;

pub fn fit_least_squares(records: &Array2<f64>, targets: &Array1<f64>) -> Result<ModelParams> {
    let dataset = DatasetBase::new(records.clone(), targets.clone());

    let fitted = LinearRegression::new()
        .fit(&dataset)
        .map_err(|e| anyhow!("Least-squares fit failed: {e}"))?;

    tracing::debug!(
        "OLS fitted: {} coefficients, intercept {:.4}",
        fitted.params().len(),
        fitted.intercept()
    );

    Ok(ModelParams::Linear {
        coefficients: fitted.params().to_vec(),
        intercept:    fitted.intercept(),
    })
}
