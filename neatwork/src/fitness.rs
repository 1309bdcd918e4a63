//! Regression scoring helpers for task authors.
//!
//! All helpers are oriented so that higher is better, matching the
//! trainer's fitness convention: a perfect predictor scores `1.0` and
//! scores fall as the error grows. Mismatched prediction and target
//! lengths score `0.0`.

/// `1 − mean(|prediction − target|)`.
///
/// # Examples
/// ```
/// use neatwork::fitness::mean_absolute_error;
///
/// assert_eq!(mean_absolute_error(&[0.0, 1.0], &[0.0, 1.0]), 1.0);
/// assert_eq!(mean_absolute_error(&[0.5, 0.5], &[0.0, 1.0]), 0.5);
/// ```
pub fn mean_absolute_error(predictions: &[f64], targets: &[f64]) -> f64 {
    if predictions.len() != targets.len() || predictions.is_empty() {
        return 0.0;
    }
    let error: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).abs())
        .sum();
    1.0 - error / predictions.len() as f64
}

/// `1 − mean((prediction − target)²)`.
pub fn mean_squared_error(predictions: &[f64], targets: &[f64]) -> f64 {
    if predictions.len() != targets.len() || predictions.is_empty() {
        return 0.0;
    }
    let error: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t) * (p - t))
        .sum();
    1.0 - error / predictions.len() as f64
}

/// Square root of [`mean_squared_error`].
pub fn root_mean_squared_error(predictions: &[f64], targets: &[f64]) -> f64 {
    mean_squared_error(predictions, targets).sqrt()
}

/// The coefficient of determination, `1 − SSR/SST`.
pub fn r_squared(predictions: &[f64], targets: &[f64]) -> f64 {
    if predictions.len() != targets.len() || predictions.is_empty() {
        return 0.0;
    }
    let mean = targets.iter().sum::<f64>() / targets.len() as f64;
    let total: f64 = targets.iter().map(|t| (t - mean) * (t - mean)).sum();
    let residual: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t) * (p - t))
        .sum();
    1.0 - residual / total
}
