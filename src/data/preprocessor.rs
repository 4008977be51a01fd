// ============================================================
// Layer 4 — Feature Scaler
// ============================================================
// Standardises every feature column to zero mean and unit
// variance before the model sees it:
//
//   z = (x - mean) / scale
//
// The scaler is fitted on the TRAIN partition only and then
// applied unchanged to the test partition and to every request
// the server receives. Fitting on the full dataset would leak
// test statistics into training.
//
// scale is the population standard deviation (ddof = 0).
// Constant columns get scale 1.0 so they map to 0 instead of
// dividing by zero.
//
// The fitted parameters are stored inside the model artifact so
// the server applies exactly the transform the model was
// trained with.

use anyhow::{bail, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean:  Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Learn per-column mean and standard deviation.
    pub fn fit(records: &Array2<f64>) -> Result<Self> {
        if records.nrows() == 0 {
            bail!("cannot fit a scaler on zero rows");
        }

        let mean: Array1<f64> = records
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(records.ncols()));
        let std: Array1<f64> = records.std_axis(Axis(0), 0.0);

        let scale = std
            .iter()
            .map(|&s| if s > f64::EPSILON { s } else { 1.0 })
            .collect();

        Ok(Self { mean: mean.to_vec(), scale })
    }

    pub fn n_features(&self) -> usize { self.mean.len() }

    /// Scale every row of a table.
    pub fn transform(&self, records: &Array2<f64>) -> Array2<f64> {
        let mean  = ArrayView1::from(&self.mean[..]);
        let scale = ArrayView1::from(&self.scale[..]);
        (records - &mean) / &scale
    }

    /// Scale one row. The caller has already checked the width.
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }
}
