// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// All framework-specific code (burn, linfa) is confined here.
//
//   model.rs      — burn MLP: seeded Dense layers, ReLU, softmax
//                   cross-entropy loss
//
//   trainer.rs    — mini-batch Adam loop for the MLP, per-epoch
//                   held-out evaluation and metrics logging
//
//   linear.rs     — ordinary least squares via linfa-linear
//
//   bundle.rs     — backend-free ModelBundle written to disk
//
//   inferencer.rs — plain ndarray predictors rebuilt from a
//                   bundle; what the server actually runs
//
//   evaluation.rs — accuracy, MSE, R²

/// MLP classifier architecture (burn)
pub mod model;

/// MLP training loop
pub mod trainer;

/// Least-squares linear regression (linfa)
pub mod linear;

/// Serialisable model bundle types
pub mod bundle;

/// Framework-free predictors used for serving
pub mod inferencer;

/// Held-out evaluation metrics
pub mod evaluation;
