//! Standard normal distribution helpers
//!
//! Tail probabilities come straight from the complementary error function,
//! so p-values far out in the tail stay positive instead of cancelling to 0.

use std::f64::consts::SQRT_2;

use statrs::function::erf::erfc;

/// Cumulative distribution function of the standard normal
pub fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / SQRT_2)
}

/// Upper tail P(Z > z) of the standard normal
pub fn standard_normal_sf(z: f64) -> f64 {
    0.5 * erfc(z / SQRT_2)
}

/// Two-tailed p-value for a z statistic
pub fn two_tailed_p(z: f64) -> f64 {
    if z.is_nan() {
        return 1.0;
    }
    erfc(z.abs() / SQRT_2).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_normal_cdf() {
        assert!((standard_normal_cdf(0.0) - 0.5).abs() < 1e-12);
        assert!((standard_normal_cdf(1.96) - 0.975_002_1).abs() < 1e-6);
        assert!((standard_normal_cdf(-1.96) - 0.024_997_9).abs() < 1e-6);
        assert!((standard_normal_cdf(1.0) + standard_normal_sf(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_two_tailed_p() {
        assert!((two_tailed_p(1.96) - 0.05).abs() < 1e-3);
        assert!((two_tailed_p(-1.96) - 0.05).abs() < 1e-3);
        assert!((two_tailed_p(0.0) - 1.0).abs() < 1e-12);
        assert_eq!(two_tailed_p(f64::NAN), 1.0);
    }

    #[test]
    fn test_far_tail_stays_positive() {
        // 2 * (1 - Phi(6)) = 1.973e-9
        let p = two_tailed_p(6.0);
        assert!(p > 0.0);
        assert!((p - 1.973_175e-9).abs() < 1e-13, "p {p}");

        // Beyond where 1 - Phi(z) rounds to zero in f64
        let p = two_tailed_p(9.0);
        assert!(p > 0.0 && p < 1e-18, "p {p}");
        assert!(standard_normal_sf(9.0) > 0.0);
    }
}
