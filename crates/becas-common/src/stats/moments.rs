//! Means, dispersion and correlation

use crate::error::StatsError;

/// Arithmetic mean; 0 for an empty sequence
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n); 0 for an empty sequence
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Pearson correlation coefficient of two equal-length series
///
/// Fails with [`StatsError::Degenerate`] when fewer than two points are
/// given or either series is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64, StatsError> {
    if x.len() != y.len() {
        return Err(StatsError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(StatsError::Degenerate("fewer than two points"));
    }

    let mx = mean(x);
    let my = mean(y);

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return Err(StatsError::Degenerate("constant series"));
    }

    Ok((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Mean of the best `n` values and how many values reach it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopMean {
    pub mean: f64,
    pub at_or_above: usize,
}

/// Mean of the `n` largest values (`n` is clamped to `1..=len`)
///
/// Returns `None` for an empty sequence.
pub fn top_mean(values: &[f64], n: usize) -> Option<TopMean> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = n.clamp(1, sorted.len());
    let top = &sorted[sorted.len() - n..];
    let mean = top.iter().sum::<f64>() / n as f64;
    let at_or_above = sorted.iter().rev().take_while(|&&v| v >= mean).count();

    Some(TopMean { mean, at_or_above })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert_eq!(population_std_dev(&values), 2.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_pearson_perfect() {
        let r = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((r - 1.0).abs() < 1e-12);

        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_degenerate() {
        assert_eq!(
            pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]),
            Err(StatsError::Degenerate("constant series"))
        );
        assert!(matches!(
            pearson(&[1.0], &[1.0, 2.0]),
            Err(StatsError::LengthMismatch { left: 1, right: 2 })
        ));
        assert!(pearson(&[1.0], &[1.0]).is_err());
    }

    #[test]
    fn test_top_mean() {
        let top = top_mean(&[1.0, 9.0, 3.0, 10.0, 5.0], 2).unwrap();
        assert_eq!(top.mean, 9.5);
        assert_eq!(top.at_or_above, 1);

        // n = 0 falls back to the single best value
        let top = top_mean(&[4.0, 8.0], 0).unwrap();
        assert_eq!(top.mean, 8.0);
        assert!(top_mean(&[], 3).is_none());
    }
}
