//! Gaussian kernel density estimation
//!
//! Produces smooth density curves for overlaying the FCS and NTA size
//! distributions on one chart. Bandwidth is either supplied or chosen with
//! Silverman's rule of thumb `1.06 * sigma * n^(-1/5)`.

use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};
use crate::summary::{sorted_finite, std_dev, VarianceKind};

/// Default number of evaluation points for a density curve
pub const DEFAULT_KDE_POINTS: usize = 100;

const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Bandwidth selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Bandwidth {
    /// Silverman's rule of thumb
    Silverman,
    /// Explicit kernel width in data units
    Fixed(f64),
}

impl Default for Bandwidth {
    fn default() -> Self {
        Bandwidth::Silverman
    }
}

/// Silverman's rule-of-thumb bandwidth, `None` for an empty sample
///
/// Uses the population standard deviation; a zero result (all values equal)
/// is returned as-is and floored later by [`KdeCurve::estimate`].
pub fn silverman_bandwidth(data: &[f64]) -> Option<f64> {
    let sigma = std_dev(data, VarianceKind::Population)?;
    Some(1.06 * sigma * (data.len() as f64).powf(-0.2))
}

/// Smallest usable kernel width around `center`
fn floor_bandwidth(center: f64) -> f64 {
    (center.abs() * 1e-3).max(1e-6)
}

/// Gaussian kernel density at `x`
fn density_at(sample: &[f64], bandwidth: f64, x: f64) -> f64 {
    let norm = INV_SQRT_2PI / (bandwidth * sample.len() as f64);
    sample
        .iter()
        .map(|&xi| {
            let u = (x - xi) / bandwidth;
            (-0.5 * u * u).exp()
        })
        .sum::<f64>()
        * norm
}

/// A density curve evaluated on an evenly spaced grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdeCurve {
    /// Grid positions
    pub xs: Vec<f64>,
    /// Density at each grid position
    pub densities: Vec<f64>,
    /// Kernel width actually used
    pub bandwidth: f64,
}

impl KdeCurve {
    /// An empty curve (no data)
    pub fn empty() -> Self {
        Self {
            xs: Vec::new(),
            densities: Vec::new(),
            bandwidth: 0.0,
        }
    }

    /// Estimate the density of `data` at `points` grid positions spanning its range
    ///
    /// Non-finite values are ignored. An empty sample gives an empty curve.
    pub fn estimate(data: &[f64], bandwidth: Bandwidth, points: usize) -> StatsResult<Self> {
        if points < 2 {
            return Err(StatsError::TooFewPoints(points));
        }

        let sample = sorted_finite(data);
        let (Some(&min), Some(&max)) = (sample.first(), sample.last()) else {
            return Ok(Self::empty());
        };

        let requested = match bandwidth {
            Bandwidth::Silverman => silverman_bandwidth(&sample).unwrap_or(0.0),
            Bandwidth::Fixed(h) => h,
        };
        let h = if requested.is_finite() && requested > 0.0 {
            requested
        } else {
            floor_bandwidth((min + max) / 2.0)
        };

        // A zero-width range is widened so the kernel peak is visible
        let (lo, hi) = if max > min {
            (min, max)
        } else {
            (min - 3.0 * h, max + 3.0 * h)
        };

        let step = (hi - lo) / (points - 1) as f64;
        let xs: Vec<f64> = (0..points).map(|i| lo + step * i as f64).collect();
        let densities = evaluate_grid(&sample, h, &xs);

        tracing::trace!(n = sample.len(), bandwidth = h, points, "kde evaluated");

        Ok(Self {
            xs,
            densities,
            bandwidth: h,
        })
    }

    /// Number of grid points
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Whether the curve has no points
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Highest density on the grid (0 for an empty curve)
    pub fn max_density(&self) -> f64 {
        self.densities.iter().copied().fold(0.0, f64::max)
    }

    /// Grid position of the highest density
    pub fn mode(&self) -> Option<f64> {
        self.densities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| self.xs[i])
    }

    /// Divide every density by `scale`; no-op when `scale` is not positive
    pub fn scaled(&self, scale: f64) -> Self {
        if scale.is_nan() || scale <= 0.0 {
            return self.clone();
        }
        Self {
            xs: self.xs.clone(),
            densities: self.densities.iter().map(|d| d / scale).collect(),
            bandwidth: self.bandwidth,
        }
    }

    /// (x, density) pairs for plotting
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.xs
            .iter()
            .copied()
            .zip(self.densities.iter().copied())
            .collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn evaluate_grid(sample: &[f64], h: f64, xs: &[f64]) -> Vec<f64> {
    xs.iter().map(|&x| density_at(sample, h, x)).collect()
}

#[cfg(feature = "parallel")]
fn evaluate_grid(sample: &[f64], h: f64, xs: &[f64]) -> Vec<f64> {
    use rayon::prelude::*;
    xs.par_iter().map(|&x| density_at(sample, h, x)).collect()
}

/// Normalize two curves for display by their shared maximum density
///
/// The taller curve peaks at exactly 1.0 and relative heights are preserved.
pub fn normalize_pair(a: &KdeCurve, b: &KdeCurve) -> (KdeCurve, KdeCurve) {
    let global_max = a.max_density().max(b.max_density());
    (a.scaled(global_max), b.scaled(global_max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silverman_bandwidth() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let sigma = 2.0_f64.sqrt();
        let expected = 1.06 * sigma * 5.0_f64.powf(-0.2);
        assert!((silverman_bandwidth(&data).unwrap() - expected).abs() < 1e-12);
        assert_eq!(silverman_bandwidth(&[]), None);
    }

    #[test]
    fn test_grid_spans_data_range() {
        let data = vec![10.0, 20.0, 30.0, 40.0];
        let curve = KdeCurve::estimate(&data, Bandwidth::Silverman, 50).unwrap();
        assert_eq!(curve.len(), 50);
        assert_eq!(curve.xs[0], 10.0);
        assert!((curve.xs[49] - 40.0).abs() < 1e-9);
        assert!(curve.densities.iter().all(|d| d.is_finite() && *d >= 0.0));
    }

    #[test]
    fn test_density_integrates_to_about_one() {
        let data: Vec<f64> = (0..200).map(|i| 50.0 + i as f64 * 0.05).collect();
        let curve = KdeCurve::estimate(&data, Bandwidth::Fixed(0.5), 400).unwrap();
        let step = curve.xs[1] - curve.xs[0];
        let area: f64 = curve.densities.iter().sum::<f64>() * step;
        // Tails beyond the data range are cut off, so allow some slack
        assert!(area > 0.85 && area < 1.05, "area = {area}");
    }

    #[test]
    fn test_identical_values_are_finite() {
        let data = vec![100.0; 25];
        let curve = KdeCurve::estimate(&data, Bandwidth::Silverman, 101).unwrap();

        assert!(curve.bandwidth > 0.0);
        assert!(curve.densities.iter().all(|d| d.is_finite()));
        let mode = curve.mode().unwrap();
        assert!((mode - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_fixed_bandwidth_is_floored() {
        let curve = KdeCurve::estimate(&[1.0, 2.0], Bandwidth::Fixed(0.0), 10).unwrap();
        assert!(curve.bandwidth > 0.0);
        let curve = KdeCurve::estimate(&[1.0, 2.0], Bandwidth::Fixed(f64::NAN), 10).unwrap();
        assert!(curve.bandwidth > 0.0);
    }

    #[test]
    fn test_empty_and_too_few_points() {
        assert!(KdeCurve::estimate(&[], Bandwidth::Silverman, 10).unwrap().is_empty());
        assert_eq!(
            KdeCurve::estimate(&[1.0], Bandwidth::Silverman, 1),
            Err(StatsError::TooFewPoints(1))
        );
    }

    #[test]
    fn test_normalize_pair_uses_global_max() {
        let narrow = KdeCurve::estimate(&[5.0, 5.1, 4.9, 5.0], Bandwidth::Fixed(0.1), 50).unwrap();
        let wide = KdeCurve::estimate(&[0.0, 10.0, 5.0, 2.0], Bandwidth::Fixed(2.0), 50).unwrap();
        let (a, b) = normalize_pair(&narrow, &wide);

        assert!((a.max_density() - 1.0).abs() < 1e-12);
        assert!(b.max_density() < 1.0);
        let ratio = wide.max_density() / narrow.max_density();
        assert!((b.max_density() - ratio).abs() < 1e-12);
    }
}
