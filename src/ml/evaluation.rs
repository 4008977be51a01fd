// ============================================================
// Layer 5 — Evaluation Metrics
// ============================================================
// Held-out scores reported after training:
//
//   accuracy            — fraction of exact label matches
//   mean_squared_error  — mean of (y - ŷ)²
//   r2_score            — 1 - SS_res / SS_tot
//
// All three return NaN for empty input rather than panicking.

/// Fraction of predictions equal to the truth.
pub fn accuracy(predicted: &[u32], truth: &[u32]) -> f64 {
    if truth.is_empty() || predicted.len() != truth.len() {
        return f64::NAN;
    }
    let correct = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    correct as f64 / truth.len() as f64
}

pub fn mean_squared_error(predicted: &[f64], truth: &[f64]) -> f64 {
    if truth.is_empty() || predicted.len() != truth.len() {
        return f64::NAN;
    }
    let sum: f64 = predicted.iter().zip(truth).map(|(p, t)| (t - p).powi(2)).sum();
    sum / truth.len() as f64
}

/// Coefficient of determination. A constant truth vector gives
/// 1.0 for a perfect fit and 0.0 otherwise.
pub fn r2_score(predicted: &[f64], truth: &[f64]) -> f64 {
    if truth.is_empty() || predicted.len() != truth.len() {
        return f64::NAN;
    }
    let mean   = truth.iter().sum::<f64>() / truth.len() as f64;
    let ss_tot: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();
    let ss_res: f64 = predicted.iter().zip(truth).map(|(p, t)| (t - p).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
