//! Inequality and coverage measures

/// Gini coefficient of a non-negative sequence
///
/// ```text
/// G = Σ (2i - n - 1) · x_(i) / (n · Σx)      i = 1..n, x sorted ascending
/// ```
///
/// Returns 0 for an empty sequence and for a sequence summing to zero.
pub fn gini(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let total: f64 = sorted.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let n_f = n as f64;
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (2.0 * (i as f64 + 1.0) - n_f - 1.0) * x)
        .sum();

    (weighted / (n_f * total)).clamp(0.0, 1.0)
}

/// Fraction of values strictly below `threshold` and fraction at or above it
pub fn coverage(values: &[f64], threshold: f64) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let below = values.iter().filter(|&&v| v < threshold).count();
    let n = values.len() as f64;
    let below = below as f64 / n;
    (below, 1.0 - below)
}
