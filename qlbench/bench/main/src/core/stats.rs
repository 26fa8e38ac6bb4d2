//! Latency summary statistics.

use crate::api::types::TrialStats;

/// z-score of the two-sided 95% interval.
pub const Z_95: f64 = 1.96;

/// Summarize per-trial latencies: mean, population std and `Z_95 * std`.
///
/// Returns zeroed stats when `samples` is empty.
pub fn summarize(samples: Vec<f64>) -> TrialStats {
    let n = samples.len();
    if n == 0 {
        return TrialStats { samples, mean: 0.0, std: 0.0, ci: 0.0 };
    }

    let mean = samples.iter().sum::<f64>() / n as f64;
    let variance = samples.iter().map(|&t| (t - mean).powi(2)).sum::<f64>() / n as f64;
    let std = variance.sqrt();

    TrialStats { samples, mean, std, ci: Z_95 * std }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_std() {
        let stats = summarize(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std - 2.0).abs() < 1e-12);
        assert!((stats.ci - 3.92).abs() < 1e-12);
        assert_eq!(stats.samples.len(), 8);
    }

    #[test]
    fn test_constant_samples_have_zero_ci() {
        let stats = summarize(vec![1.5; 10]);
        assert_eq!(stats.mean, 1.5);
        assert_eq!(stats.ci, 0.0);
    }

    #[test]
    fn test_empty() {
        let stats = summarize(Vec::new());
        assert_eq!((stats.mean, stats.std, stats.ci), (0.0, 0.0, 0.0));
    }
}
