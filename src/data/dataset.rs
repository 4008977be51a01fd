use anyhow::{bail, Result};
use ndarray::{Array1, Array2, Axis};

/// A labelled table: one row per sample, one column per feature,
/// plus one target value per row.
///
/// Classification targets are stored as whole-number floats
/// (0.0, 1.0, 2.0, ...) so both model kinds share one type.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    pub name:          String,
    pub feature_names: Vec<String>,
    pub records:       Array2<f64>,
    pub targets:       Array1<f64>,
}

impl TabularDataset {
    pub fn new(
        name:          impl Into<String>,
        feature_names: Vec<String>,
        records:       Array2<f64>,
        targets:       Array1<f64>,
    ) -> Result<Self> {
        if records.nrows() != targets.len() {
            bail!(
                "dataset has {} rows but {} targets",
                records.nrows(),
                targets.len()
            );
        }
        if records.ncols() != feature_names.len() {
            bail!(
                "dataset has {} columns but {} feature names",
                records.ncols(),
                feature_names.len()
            );
        }
        Ok(Self { name: name.into(), feature_names, records, targets })
    }

    pub fn n_samples(&self) -> usize { self.records.nrows() }

    pub fn n_features(&self) -> usize { self.records.ncols() }

    /// Copy the given rows (in the given order) into a new dataset.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            name:          self.name.clone(),
            feature_names: self.feature_names.clone(),
            records:       self.records.select(Axis(0), indices),
            targets:       self.targets.select(Axis(0), indices),
        }
    }

    /// Targets as class indices. Fails if any target is negative
    /// or fractional.
    pub fn class_labels(&self) -> Result<Vec<u32>> {
        self.targets
            .iter()
            .map(|&t| {
                if t < 0.0 || t.fract() != 0.0 {
                    bail!("target {t} is not a class index");
                }
                Ok(t as u32)
            })
            .collect()
    }

    /// Number of distinct classes, assuming labels are 0..n
    pub fn n_classes(&self) -> Result<usize> {
        let labels = self.class_labels()?;
        Ok(labels.iter().max().map_or(0, |&m| m as usize + 1))
    }
}
