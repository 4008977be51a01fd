// ============================================================
// Layer 4 — Dataset Loaders
// ============================================================
// Produces the two labelled tables the training commands use:
//
//   IrisSource    — the classic 150-row Iris table, embedded in
//                   the binary from assets/iris.csv so training
//                   the classifier never touches the network.
//
//   HousingSource — the California housing table. Read from a
//                   local CSV if present, otherwise fetched once
//                   over HTTP and cached at that path.
//
// Housing CSV columns:
//   longitude, latitude, housing_median_age, total_rooms,
//   total_bedrooms, population, households, median_income,
//   median_house_value, ocean_proximity
//
// The categorical ocean_proximity column is ignored, rows with a
// missing numeric field are dropped (total_bedrooms has gaps),
// and the target is expressed in units of 100,000.

use anyhow::{bail, Context, Result};
use ndarray::{Array1, Array2};
use std::{fs, path::PathBuf, sync::OnceLock, time::Duration};

use crate::data::dataset::TabularDataset;
use crate::domain::traits::DatasetSource;

const IRIS_CSV: &str = include_str!("../../assets/iris.csv");

pub const IRIS_FEATURES: [&str; 4] = [
    "sepal_length",
    "sepal_width",
    "petal_length",
    "petal_width",
];

pub const HOUSING_FEATURES: [&str; 8] = [
    "longitude",
    "latitude",
    "housing_median_age",
    "total_rooms",
    "total_bedrooms",
    "population",
    "households",
    "median_income",
];

pub const HOUSING_TARGET: &str = "median_house_value";

pub const DEFAULT_HOUSING_URL: &str =
    "https://raw.githubusercontent.com/ageron/handson-ml2/master/datasets/housing/housing.csv";

const HOUSING_TARGET_UNITS: f64 = 100_000.0;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

// ─── IrisSource ───────────────────────────────────────────────────────────────
/// The embedded Iris table. Targets: 0 = setosa, 1 = versicolor,
/// 2 = virginica.
#[derive(Debug, Default, Clone, Copy)]
pub struct IrisSource;

impl DatasetSource for IrisSource {
    fn load(&self) -> Result<TabularDataset> {
        let table   = parse_numeric_csv(IRIS_CSV, &IRIS_FEATURES, "species")
            .context("Embedded Iris table is malformed")?;
        let dataset = table.into_dataset("iris", 1.0)?;
        tracing::debug!("Loaded Iris table: {} rows", dataset.n_samples());
        Ok(dataset)
    }
}

// ─── HousingSource ────────────────────────────────────────────────────────────
/// California housing CSV, cached at `path`.
#[derive(Debug, Clone)]
pub struct HousingSource {
    path: PathBuf,
    url:  String,
}

impl HousingSource {
    pub fn new(path: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self { path: path.into(), url: url.into() }
    }

    /// Download the CSV to the cache path. Single attempt, no retry.
    fn fetch(&self) -> Result<String> {
        tracing::info!("Fetching housing data from {}", self.url);
        let body = http_agent()
            .get(&self.url)
            .call()
            .with_context(|| format!("Failed to fetch '{}'", self.url))?
            .into_string()
            .context("Housing response was not valid text")?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Cannot create data directory '{}'", parent.display())
            })?;
        }
        fs::write(&self.path, &body).with_context(|| {
            format!("Cannot cache housing data at '{}'", self.path.display())
        })?;
        tracing::info!("Cached housing data at '{}'", self.path.display());
        Ok(body)
    }
}

impl DatasetSource for HousingSource {
    fn load(&self) -> Result<TabularDataset> {
        let text = if self.path.exists() {
            tracing::info!("Reading housing data from '{}'", self.path.display());
            fs::read_to_string(&self.path).with_context(|| {
                format!("Cannot read '{}'", self.path.display())
            })?
        } else {
            self.fetch()?
        };

        let table = parse_numeric_csv(&text, &HOUSING_FEATURES, HOUSING_TARGET)?;
        if table.skipped > 0 {
            tracing::warn!(
                "Dropped {} housing rows with missing values",
                table.skipped
            );
        }
        table.into_dataset("california_housing", HOUSING_TARGET_UNITS)
    }
}

fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build()
    })
}

// ─── CSV parsing ──────────────────────────────────────────────────────────────
/// Rows parsed out of a CSV before they become a dataset.
struct ParsedTable {
    feature_names: Vec<String>,
    rows:          Vec<f64>,
    targets:       Vec<f64>,
    skipped:       usize,
}

impl ParsedTable {
    fn into_dataset(self, name: &str, target_divisor: f64) -> Result<TabularDataset> {
        if self.targets.is_empty() {
            bail!("'{name}' contains no usable rows");
        }
        let n_rows    = self.targets.len();
        let n_cols    = self.feature_names.len();
        let records   = Array2::from_shape_vec((n_rows, n_cols), self.rows)
            .context("CSV rows have inconsistent widths")?;
        let targets   = Array1::from_vec(self.targets) / target_divisor;
        TabularDataset::new(name, self.feature_names, records, targets)
    }
}

/// Parse a headed, comma-separated table, picking the named
/// feature columns (in the given order) and the target column.
/// Columns not named are ignored; rows with an empty or
/// non-numeric selected field are skipped.
fn parse_numeric_csv(text: &str, features: &[&str], target: &str) -> Result<ParsedTable> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header    = lines.next().context("CSV is empty")?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let position = |name: &str| -> Result<usize> {
        columns
            .iter()
            .position(|c| *c == name)
            .with_context(|| format!("CSV has no '{name}' column"))
    };
    let feature_idx: Vec<usize> = features
        .iter()
        .map(|f| position(*f))
        .collect::<Result<_>>()?;
    let target_idx = position(target)?;

    let mut table = ParsedTable {
        feature_names: features.iter().map(|f| f.to_string()).collect(),
        rows:          Vec::new(),
        targets:       Vec::new(),
        skipped:       0,
    };

    for line in lines {
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        let field = |i: usize| {
            cells
                .get(i)
                .and_then(|c| c.parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };

        let row: Option<Vec<f64>> = feature_idx.iter().map(|&i| field(i)).collect();
        match (row, field(target_idx)) {
            (Some(row), Some(y)) => {
                table.rows.extend(row);
                table.targets.push(y);
            }
            _ => table.skipped += 1,
        }
    }

    Ok(table)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const HOUSING_SAMPLE: &str = "\
longitude,latitude,housing_median_age,total_rooms,total_bedrooms,population,households,median_income,median_house_value,ocean_proximity
-122.23,37.88,41.0,880.0,129.0,322.0,126.0,8.3252,452600.0,NEAR BAY
-122.22,37.86,21.0,7099.0,1106.0,2401.0,1138.0,8.3014,358500.0,NEAR BAY
-122.16,37.77,47.0,1256.0,,570.0,218.0,4.375,161900.0,NEAR BAY
";

    #[test]
    fn test_iris_has_150_rows_and_3_classes() {
        let ds = IrisSource.load().unwrap();
        assert_eq!(ds.n_samples(), 150);
        assert_eq!(ds.n_features(), 4);
        assert_eq!(ds.n_classes().unwrap(), 3);
        assert_eq!(ds.records.row(0).to_vec(), vec![5.1, 3.5, 1.4, 0.2]);
    }

    #[test]
    fn test_housing_drops_incomplete_rows_and_scales_target() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("housing.csv");
        fs::write(&path, HOUSING_SAMPLE).unwrap();

        let ds = HousingSource::new(&path, "http://unused.invalid").load().unwrap();
        assert_eq!(ds.n_samples(), 2);
        assert_eq!(ds.n_features(), 8);
        assert!((ds.targets[0] - 4.526).abs() < 1e-9);
        assert_eq!(ds.records[[0, 7]], 8.3252);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let res = parse_numeric_csv("a,b\n1,2\n", &["a", "c"], "b");
        assert!(res.is_err());
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let table = parse_numeric_csv("x,label,y,t\n1,foo,2,3\n", &["y", "x"], "t").unwrap();
        assert_eq!(table.rows, vec![2.0, 1.0]);
        assert_eq!(table.targets, vec![3.0]);
    }
}
