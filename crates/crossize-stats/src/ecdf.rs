//! Empirical Cumulative Distribution Function (ECDF)
//!
//! The ECDF is a step function that estimates the underlying CDF of a sample.
//! For a sample of n values, ECDF(x) = (number of values <= x) / n.
//!
//! The Kolmogorov-Smirnov statistic is the largest vertical gap between two
//! ECDFs, see [`Ecdf::supremum_distance`].

use serde::{Deserialize, Serialize};

/// Empirical Cumulative Distribution Function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ecdf {
    /// Sorted finite values
    values: Vec<f64>,
}

impl Ecdf {
    /// Build an ECDF from data, dropping non-finite values
    ///
    /// Time complexity: O(n log n) for sorting
    pub fn from_data(data: &[f64]) -> Self {
        Self {
            values: crate::summary::sorted_finite(data),
        }
    }

    /// Evaluate the ECDF at a point
    ///
    /// Returns the proportion of values <= x
    /// Time complexity: O(log n)
    pub fn evaluate(&self, x: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let at_or_below = self.values.partition_point(|&v| v <= x);
        at_or_below as f64 / self.values.len() as f64
    }

    /// Get the quantile (inverse CDF)
    ///
    /// Returns the smallest value x such that ECDF(x) >= p
    pub fn quantile(&self, p: f64) -> Option<f64> {
        if self.values.is_empty() || !(0.0..=1.0).contains(&p) {
            return None;
        }
        let n = self.values.len();
        let idx = ((p * n as f64).ceil() as usize).clamp(1, n) - 1;
        Some(self.values[idx])
    }

    /// Largest absolute difference between this ECDF and another
    ///
    /// Both step functions only change at sample values, so the supremum is
    /// attained at one of the points in the union of the two samples.
    pub fn supremum_distance(&self, other: &Ecdf) -> f64 {
        self.values
            .iter()
            .chain(other.values.iter())
            .map(|&x| (self.evaluate(x) - other.evaluate(x)).abs())
            .fold(0.0, f64::max)
    }

    /// Get the number of samples
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the ECDF is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the sorted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get points for step-function plotting (x, y pairs)
    pub fn plot_points(&self) -> Vec<(f64, f64)> {
        let Some(&first) = self.values.first() else {
            return Vec::new();
        };

        let n = self.values.len() as f64;
        let mut points = Vec::with_capacity(self.values.len() * 2);
        points.push((first, 0.0));

        for (i, &x) in self.values.iter().enumerate() {
            if i > 0 {
                points.push((x, i as f64 / n));
            }
            points.push((x, (i + 1) as f64 / n));
        }

        points
    }
}
