// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Mini-batch Adam training of the MLP classifier on the burn
// NdArray backend (CPU), with autodiff for gradients.
//
//   - TrainBackend (Autodiff<NdArray>) for forward + backward
//   - model.valid() drops to NdArray for held-out evaluation
//   - batch order comes from a StdRng seeded with the run seed,
//     so two runs with the same seed take identical steps
//   - argmax(1) returns [batch,1] so we flatten before .equal()
//
// Reference: Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};
use ndarray::{Array2, Axis};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::bundle::DenseParams;
use crate::ml::model::{MlpConfig, MlpModel};

type TrainBackend = Autodiff<NdArray>;
type EvalBackend  = NdArray;

/// Hyperparameters for one MLP fit.
#[derive(Debug, Clone)]
pub struct MlpTrainingConfig {
    pub hidden_layers: Vec<usize>,
    pub epochs:        usize,
    pub learning_rate: f64,
    pub batch_size:    usize,
    pub seed:          u64,
}

/// Scaled features and class labels for one partition.
pub struct LabelledTable<'a> {
    pub records: &'a Array2<f64>,
    pub labels:  &'a [u32],
}

pub struct TrainedMlp {
    pub layers:  Vec<DenseParams>,
    pub history: Vec<EpochMetrics>,
}

pub fn train_mlp(
    cfg:       &MlpTrainingConfig,
    train:     LabelledTable<'_>,
    test:      LabelledTable<'_>,
    n_classes: usize,
    metrics:   Option<&MetricsLogger>,
) -> Result<TrainedMlp> {
    let n_train = train.records.nrows();
    if n_train == 0 || n_train != train.labels.len() {
        bail!("train partition has {} rows and {} labels", n_train, train.labels.len());
    }
    if test.records.nrows() != test.labels.len() {
        bail!("test partition has {} rows and {} labels", test.records.nrows(), test.labels.len());
    }
    if cfg.epochs == 0 {
        bail!("epochs must be at least 1");
    }

    let device = NdArrayDevice::default();

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = MlpConfig::new(train.records.ncols(), cfg.hidden_layers.clone(), n_classes)
        .with_seed(cfg.seed);
    let mut model: MlpModel<TrainBackend> = model_cfg.init(&device);
    tracing::info!(
        "MLP ready: {} → {:?} → {} (seed {})",
        train.records.ncols(),
        cfg.hidden_layers,
        n_classes,
        cfg.seed,
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    let batch_size = cfg.batch_size.clamp(1, n_train);
    let mut rng    = StdRng::seed_from_u64(cfg.seed);
    let mut order: Vec<usize> = (0..n_train).collect();

    let test_x = features_tensor::<EvalBackend>(test.records, None, &device);
    let test_y = labels_tensor::<EvalBackend>(test.labels, None, &device);

    let mut history    = Vec::with_capacity(cfg.epochs);
    let mut best_loss  = f64::INFINITY;
    let mut best_epoch = 0;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        order.shuffle(&mut rng);

        let mut loss_sum = 0.0f64;
        for rows in order.chunks(batch_size) {
            let x = features_tensor::<TrainBackend>(train.records, Some(rows), &device);
            let y = labels_tensor::<TrainBackend>(train.labels, Some(rows), &device);

            let (loss, _) = model.forward_loss(x, y);
            loss_sum += loss.clone().into_scalar().elem::<f64>() * rows.len() as f64;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }
        let train_loss = loss_sum / n_train as f64;

        // ── Held-out evaluation (no autodiff) ─────────────────────────────────
        let (test_loss, test_accuracy) = if test.labels.is_empty() {
            (f64::NAN, f64::NAN)
        } else {
            let model_valid = model.valid();
            let (loss, logits) = model_valid.forward_loss(test_x.clone(), test_y.clone());
            let predicted = logits.argmax(1).flatten::<1>(0, 1);
            let correct: i64 = predicted
                .equal(test_y.clone())
                .int()
                .sum()
                .into_scalar()
                .elem::<i64>();
            (
                loss.into_scalar().elem::<f64>(),
                correct as f64 / test.labels.len() as f64,
            )
        };

        let m = EpochMetrics::new(epoch, train_loss, test_loss, test_accuracy);
        if let Some(logger) = metrics {
            logger.log(&m)?;
        }
        if m.is_improvement(best_loss) {
            best_loss  = test_loss;
            best_epoch = epoch;
        }
        if epoch == 1 || epoch % 50 == 0 || epoch == cfg.epochs {
            tracing::info!(
                "Epoch {:>4}/{} | train_loss={:.4} | test_loss={:.4} | test_acc={:.1}%",
                epoch,
                cfg.epochs,
                train_loss,
                test_loss,
                test_accuracy * 100.0,
            );
        }
        history.push(m);
    }

    if best_epoch > 0 {
        tracing::info!("Lowest test loss {:.4} at epoch {}", best_loss, best_epoch);
    }

    let layers = model.valid().to_params()?;
    Ok(TrainedMlp { layers, history })
}

/// Rows of `records` (all of them, or the listed ones in order)
/// as an f32 tensor of shape [rows, features].
fn features_tensor<B: Backend>(
    records: &Array2<f64>,
    rows:    Option<&[usize]>,
    device:  &B::Device,
) -> Tensor<B, 2> {
    let selected = match rows {
        Some(rows) => records.select(Axis(0), rows),
        None       => records.to_owned(),
    };
    let shape = [selected.nrows(), selected.ncols()];
    let flat: Vec<f32> = selected.iter().map(|&v| v as f32).collect();
    Tensor::<B, 2>::from_data(TensorData::new(flat, shape), device)
}

fn labels_tensor<B: Backend>(
    labels: &[u32],
    rows:   Option<&[usize]>,
    device: &B::Device,
) -> Tensor<B, 1, Int> {
    let ints: Vec<i32> = match rows {
        Some(rows) => rows.iter().map(|&r| labels[r] as i32).collect(),
        None       => labels.iter().map(|&l| l as i32).collect(),
    };
    Tensor::<B, 1, Int>::from_ints(ints.as_slice(), device)
}
