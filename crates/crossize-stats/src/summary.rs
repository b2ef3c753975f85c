//! Summary statistics and numeric primitives
//!
//! Provides the building blocks shared by the comparison routines:
//! - Mean, variance, standard deviation (population and unbiased)
//! - Median and linearly interpolated percentiles (d10/d50/d90)
//! - Rank assignment with tie-averaging

use serde::{Deserialize, Serialize};

/// Which divisor to use for variance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarianceKind {
    /// Divide by n
    Population,
    /// Divide by n - 1 (unbiased)
    Sample,
}

/// Arithmetic mean, or `None` for an empty slice
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Variance with the requested divisor
///
/// Returns `None` when there are too few values for the divisor
/// (empty for population, fewer than two for sample).
pub fn variance(data: &[f64], kind: VarianceKind) -> Option<f64> {
    let m = mean(data)?;
    let n = data.len();
    let divisor = match kind {
        VarianceKind::Population => n as f64,
        VarianceKind::Sample if n < 2 => return None,
        VarianceKind::Sample => (n - 1) as f64,
    };
    Some(data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / divisor)
}

/// Standard deviation with the requested divisor
pub fn std_dev(data: &[f64], kind: VarianceKind) -> Option<f64> {
    variance(data, kind).map(f64::sqrt)
}

/// Copy the finite values of `data` into a sorted vector
pub fn sorted_finite(data: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Median of the data, ignoring non-finite values
pub fn median(data: &[f64]) -> Option<f64> {
    let sorted = sorted_finite(data);
    median_of_sorted(&sorted)
}

fn median_of_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    Some(if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    })
}

/// Percentile (0-100) with linear interpolation between closest ranks
///
/// `p` is clamped into `[0, 100]`.
pub fn percentile(data: &[f64], p: f64) -> Option<f64> {
    percentile_of_sorted(&sorted_finite(data), p)
}

/// Percentile over data that is already sorted ascending
pub fn percentile_of_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || p.is_nan() {
        return None;
    }
    let p = p.clamp(0.0, 100.0);
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    Some(sorted[lower] * (1.0 - frac) + sorted[upper] * frac)
}

/// Assign 1-based ranks, averaging the ranks of tied values
///
/// Ranks are returned in the original order of `data`.
pub fn rank_with_ties(data: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..data.len()).collect();
    order.sort_by(|&a, &b| data[a].total_cmp(&data[b]));

    let mut ranks = vec![0.0; data.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && data[order[j + 1]] == data[order[i]] {
            j += 1;
        }
        // Positions i..=j share the average of ranks (i+1)..=(j+1)
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }
    ranks
}

/// Summary statistics for a numeric dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct SummaryStats {
    /// Number of finite values
    pub count: u64,
    /// Number of missing/NaN values
    pub missing: u64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Mean (average)
    pub mean: f64,
    /// Unbiased standard deviation (n - 1); zero for a single value
    pub std_dev: f64,
    /// 10th percentile
    pub d10: f64,
    /// Median (50th percentile)
    pub d50: f64,
    /// 90th percentile
    pub d90: f64,
}

impl SummaryStats {
    /// Compute summary statistics from data
    pub fn from_data(data: &[f64]) -> Self {
        let sorted = sorted_finite(data);
        let missing = (data.len() - sorted.len()) as u64;

        let Some(mean) = mean(&sorted) else {
            return Self::empty(missing);
        };

        Self {
            count: sorted.len() as u64,
            missing,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean,
            std_dev: std_dev(&sorted, VarianceKind::Sample).unwrap_or(0.0),
            d10: percentile_of_sorted(&sorted, 10.0).unwrap_or(f64::NAN),
            d50: median_of_sorted(&sorted).unwrap_or(f64::NAN),
            d90: percentile_of_sorted(&sorted, 90.0).unwrap_or(f64::NAN),
        }
    }

    /// Create empty statistics (all NaN)
    fn empty(missing: u64) -> Self {
        Self {
            count: 0,
            missing,
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            std_dev: f64::NAN,
            d10: f64::NAN,
            d50: f64::NAN,
            d90: f64::NAN,
        }
    }

    /// Whether any finite values were seen
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Get the range (max - min)
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Span of the distribution: (d90 - d10) / d50
    pub fn span(&self) -> Option<f64> {
        if self.d50 == 0.0 || !self.d50.is_finite() {
            return None;
        }
        Some((self.d90 - self.d10) / self.d50)
    }

    /// Get the coefficient of variation (std_dev / mean)
    pub fn cv(&self) -> Option<f64> {
        if self.mean == 0.0 || !self.mean.is_finite() {
            return None;
        }
        Some(self.std_dev / self.mean.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let data = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&data), Some(5.0));
        assert!((std_dev(&data, VarianceKind::Population).unwrap() - 2.0).abs() < 1e-12);
        let sample = std_dev(&data, VarianceKind::Sample).unwrap();
        assert!((sample - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
        assert_eq!(variance(&[1.0], VarianceKind::Sample), None);
        assert_eq!(variance(&[1.0], VarianceKind::Population), Some(0.0));
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[f64::NAN, 1.0, 3.0]), Some(2.0));
    }

    #[test]
    fn test_percentile_interpolates() {
        let data: Vec<f64> = (0..=10).map(|x| x as f64).collect();
        assert_eq!(percentile(&data, 0.0), Some(0.0));
        assert_eq!(percentile(&data, 100.0), Some(10.0));
        assert!((percentile(&data, 25.0).unwrap() - 2.5).abs() < 1e-12);
        assert!((percentile(&data, 150.0).unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_rank_with_ties() {
        let ranks = rank_with_ties(&[10.0, 20.0, 10.0, 30.0]);
        assert_eq!(ranks, vec![1.5, 3.0, 1.5, 4.0]);

        let ranks = rank_with_ties(&[5.0, 5.0, 5.0]);
        assert_eq!(ranks, vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_summary_stats_basic() {
        let data: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let stats = SummaryStats::from_data(&data);

        assert_eq!(stats.count, 10);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
        assert!((stats.mean - 5.5).abs() < 1e-10);
        assert!((stats.d50 - 5.5).abs() < 1e-10);
        assert!((stats.d10 - 1.9).abs() < 1e-10);
        assert!((stats.d90 - 9.1).abs() < 1e-10);
    }

    #[test]
    fn test_summary_stats_with_nan() {
        let data = vec![1.0, 2.0, f64::NAN, 4.0, 5.0];
        let stats = SummaryStats::from_data(&data);

        assert_eq!(stats.count, 4);
        assert_eq!(stats.missing, 1);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
    }

    #[test]
    fn test_summary_stats_empty() {
        let stats = SummaryStats::from_data(&[f64::NAN]);
        assert!(stats.is_empty());
        assert!(stats.mean.is_nan());
        assert_eq!(stats.cv(), None);
    }

    #[test]
    fn test_single_value_has_zero_spread() {
        let stats = SummaryStats::from_data(&[42.0]);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.d10, 42.0);
        assert_eq!(stats.span(), Some(0.0));
    }
}
