//! Small descriptive-statistics helpers shared by the analytics modules.

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample variance (n-1 denominator)
pub fn sample_variance(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (n - 1) as f64
}

/// Sample standard deviation (n-1 denominator)
pub fn sample_std(data: &[f64]) -> f64 {
    sample_variance(data).sqrt()
}

/// Covariance between two series (sample, n-1)
pub fn covariance(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let (mx, my) = (mean(&x[..n]), mean(&y[..n]));
    x.iter()
        .zip(y.iter())
        .map(|(xi, yi)| (xi - mx) * (yi - my))
        .sum::<f64>()
        / (n - 1) as f64
}

/// Percentile of an ascending-sorted slice with linear interpolation between
/// closest ranks. `pct` is a fraction in [0, 1].
///
/// Matches the default (`linear`) definition used by most statistics
/// packages: rank `h = pct × (n - 1)`.
pub fn percentile_sorted(sorted: &[f64], pct: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&pct) {
        return None;
    }
    let n = sorted.len();
    if n == 1 {
        return Some(sorted[0]);
    }

    let h = pct * (n - 1) as f64;
    let lower = h.floor() as usize;
    let upper = h.ceil() as usize;
    let frac = h - lower as f64;

    if upper >= n {
        Some(sorted[n - 1])
    } else {
        Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
    }
}

/// Copy and sort ascending. Callers guarantee finite values.
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut out = data.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_variance() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // population variance 4, sample variance 32/7
        assert!((sample_variance(&data) - 32.0 / 7.0).abs() < 1e-12);
        assert_eq!(sample_variance(&[1.0]), 0.0);
    }

    #[test]
    fn test_covariance_of_self_is_variance() {
        let data = [0.01, -0.02, 0.015, -0.005];
        assert!((covariance(&data, &data) - sample_variance(&data)).abs() < 1e-15);
    }

    #[test]
    fn test_percentile_linear() {
        let s = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_sorted(&s, 0.0), Some(1.0));
        assert_eq!(percentile_sorted(&s, 1.0), Some(5.0));
        assert_eq!(percentile_sorted(&s, 0.5), Some(3.0));
        // h = 0.05 * 4 = 0.2 -> 1 + 0.2
        assert!((percentile_sorted(&s, 0.05).unwrap() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_out_of_range() {
        assert_eq!(percentile_sorted(&[], 0.5), None);
        assert_eq!(percentile_sorted(&[1.0], 1.5), None);
    }

    #[test]
    fn test_sorted() {
        assert_eq!(sorted(&[3.0, -1.0, 2.0]), vec![-1.0, 2.0, 3.0]);
    }
}
