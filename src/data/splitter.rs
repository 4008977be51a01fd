// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Shuffles row indices with a seeded RNG and partitions them:
//   - Train set: used to fit the scaler and the model
//   - Test set:  held out for evaluation only
//
// The seed makes the split reproducible: the same seed and the
// same dataset always give the same partitions, which is what
// lets two training runs produce identical artifacts.
//
// Sizing: n_test = ceil(n * test_size), n_train = n - n_test.
// The test rows are taken from the front of the permutation.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom over a
// StdRng seeded from a u64.

use anyhow::{bail, Result};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::dataset::TabularDataset;

/// Shuffle `0..n` with `seed` and split into (train, test) indices.
pub fn split_indices(n: usize, test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        bail!("test_size must be in (0, 1), got {test_size}");
    }

    let n_test = ((n as f64) * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        bail!("cannot split {n} rows with test_size {test_size}: one partition would be empty");
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    // split_off(k) leaves [0..k] behind and returns [k..]
    let train = indices.split_off(n_test);
    let test  = indices;

    tracing::debug!(
        "Dataset split: {} train, {} test (seed {})",
        train.len(),
        test.len(),
        seed,
    );

    Ok((train, test))
}

/// Split a dataset into (train, test) partitions.
pub fn train_test_split(
    dataset:   &TabularDataset,
    test_size: f64,
    seed:      u64,
) -> Result<(TabularDataset, TabularDataset)> {
    let (train_idx, test_idx) = split_indices(dataset.n_samples(), test_size, seed)?;
    Ok((dataset.select(&train_idx), dataset.select(&test_idx)))
}
