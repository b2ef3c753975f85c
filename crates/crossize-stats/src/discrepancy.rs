//! Symmetric percentage discrepancy between paired measurements
//!
//! `discrepancy(a, b) = |a - b| / ((a + b) / 2) * 100`
//!
//! The mean of the pair is the reference, so neither instrument is treated
//! as ground truth and swapping the arguments gives the same value.

use serde::{Deserialize, Serialize};

/// Percentage discrepancy between two values
///
/// Returns `None` when the pair mean is zero or either value is non-finite.
pub fn discrepancy(a: f64, b: f64) -> Option<f64> {
    if !a.is_finite() || !b.is_finite() {
        return None;
    }
    let avg = (a + b) / 2.0;
    if avg == 0.0 {
        return None;
    }
    Some(((a - b).abs() / avg.abs()) * 100.0)
}

/// Discrepancy for one FCS/NTA pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairDiscrepancy {
    /// Position in the paired input
    pub index: usize,
    pub fcs: f64,
    pub nta: f64,
    /// Percentage, `None` when undefined for this pair
    pub percent: Option<f64>,
}

/// Discrepancy of every pair; pairs are truncated to the shorter slice
pub fn paired_discrepancies(fcs: &[f64], nta: &[f64]) -> Vec<PairDiscrepancy> {
    fcs.iter()
        .zip(nta)
        .enumerate()
        .map(|(index, (&fcs, &nta))| PairDiscrepancy {
            index,
            fcs,
            nta,
            percent: discrepancy(fcs, nta),
        })
        .collect()
}

/// Mean of the defined pair discrepancies
pub fn mean_discrepancy(pairs: &[PairDiscrepancy]) -> Option<f64> {
    let defined: Vec<f64> = pairs.iter().filter_map(|p| p.percent).collect();
    crate::summary::mean(&defined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric() {
        for (a, b) in [(10.0, 12.0), (150.0, 95.0), (0.5, 3.0)] {
            assert_eq!(discrepancy(a, b), discrepancy(b, a));
        }
    }

    #[test]
    fn test_identical_values() {
        assert_eq!(discrepancy(87.5, 87.5), Some(0.0));
        assert_eq!(discrepancy(-3.0, -3.0), Some(0.0));
        assert_eq!(discrepancy(0.0, 0.0), None);
    }

    #[test]
    fn test_undefined_inputs() {
        assert_eq!(discrepancy(5.0, -5.0), None);
        assert_eq!(discrepancy(f64::NAN, 1.0), None);
        assert_eq!(discrepancy(1.0, f64::INFINITY), None);
    }

    #[test]
    fn test_paired_example() {
        let pairs = paired_discrepancies(&[10.0, 20.0, 30.0], &[12.0, 22.0, 28.0]);
        assert_eq!(pairs.len(), 3);

        let expected = [200.0 / 11.0, 200.0 / 21.0, 200.0 / 29.0];
        for (pair, want) in pairs.iter().zip(expected) {
            assert!((pair.percent.unwrap() - want).abs() < 1e-9);
        }
        assert!((pairs[0].percent.unwrap() - 18.18).abs() < 0.01);

        let mean = mean_discrepancy(&pairs).unwrap();
        assert!((mean - expected.iter().sum::<f64>() / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_truncates_to_shorter() {
        let pairs = paired_discrepancies(&[1.0, 2.0], &[1.0]);
        assert_eq!(pairs.len(), 1);
        assert_eq!(mean_discrepancy(&[]), None);
    }
}
