//! Ordinary least squares regression for paired instrument readings

use serde::{Deserialize, Serialize};

/// Result of a least-squares fit `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, clamped to [0, 1]
    pub r_squared: f64,
    /// Number of pairs used
    pub n: u64,
}

impl LinearFit {
    /// Identity line returned when a fit cannot be computed
    pub fn degenerate(n: usize) -> Self {
        Self {
            slope: 1.0,
            intercept: 0.0,
            r_squared: 0.0,
            n: n as u64,
        }
    }

    /// Whether this fit is the degenerate fallback
    pub fn is_degenerate(&self) -> bool {
        self.slope == 1.0 && self.intercept == 0.0 && self.r_squared == 0.0
    }

    /// Evaluate the fitted line
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Residuals `y - predict(x)` for each pair
    pub fn residuals(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(y)
            .map(|(&xi, &yi)| yi - self.predict(xi))
            .collect()
    }
}

fn finite_pairs(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    x.iter()
        .zip(y)
        .map(|(&a, &b)| (a, b))
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .collect()
}

/// Fit `y` against `x` by ordinary least squares
///
/// Pairs are truncated to the shorter slice and non-finite pairs dropped.
/// Fewer than two pairs, or zero variance in `x`, yields
/// [`LinearFit::degenerate`].
pub fn linear_regression(x: &[f64], y: &[f64]) -> LinearFit {
    let pairs = finite_pairs(x, y);
    let n = pairs.len();
    if n < 2 {
        return LinearFit::degenerate(n);
    }

    let nf = n as f64;
    let x_mean = pairs.iter().map(|p| p.0).sum::<f64>() / nf;
    let y_mean = pairs.iter().map(|p| p.1).sum::<f64>() / nf;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for &(xi, yi) in &pairs {
        let dx = xi - x_mean;
        sxy += dx * (yi - y_mean);
        sxx += dx * dx;
    }

    if sxx == 0.0 {
        return LinearFit::degenerate(n);
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_tot: f64 = pairs.iter().map(|&(_, yi)| (yi - y_mean).powi(2)).sum();
    let ss_res: f64 = pairs
        .iter()
        .map(|&(xi, yi)| (yi - (slope * xi + intercept)).powi(2))
        .sum();

    // Constant y is fitted exactly by a flat line
    let r_squared = if ss_tot == 0.0 {
        1.0
    } else {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    LinearFit {
        slope,
        intercept,
        r_squared,
        n: n as u64,
    }
}

/// Pearson correlation coefficient, or `None` when either side has no variance
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let pairs = finite_pairs(x, y);
    let n = pairs.len();
    if n < 2 {
        return None;
    }

    let nf = n as f64;
    let x_mean = pairs.iter().map(|p| p.0).sum::<f64>() / nf;
    let y_mean = pairs.iter().map(|p| p.1).sum::<f64>() / nf;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for &(xi, yi) in &pairs {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some((sxy / denom).clamp(-1.0, 1.0))
}
