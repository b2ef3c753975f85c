//! Binned particle-size distributions
//!
//! NTA instruments report a histogram rather than per-particle sizes. The
//! canonical form here is a pair of parallel `bins` / `counts` vectors that are
//! always the same length.

use serde::{Deserialize, Serialize};

use crossize_io::SizeTable;

use crate::error::{DistributionError, DistributionResult};
use crate::sample::SizeStatistics;

/// Default number of draws when expanding a distribution into a sample
pub const DEFAULT_EXPANSION_SIZE: usize = 2_000;

/// Size histogram: bin sizes (nm) and their counts or concentrations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DistributionParts")]
pub struct SizeDistribution {
    bins: Vec<f64>,
    counts: Vec<f64>,
}

#[derive(Deserialize)]
struct DistributionParts {
    bins: Vec<f64>,
    counts: Vec<f64>,
}

impl TryFrom<DistributionParts> for SizeDistribution {
    type Error = DistributionError;

    fn try_from(parts: DistributionParts) -> DistributionResult<Self> {
        Self::from_parallel(parts.bins, parts.counts)
    }
}

impl TryFrom<SizeTable> for SizeDistribution {
    type Error = DistributionError;

    fn try_from(table: SizeTable) -> DistributionResult<Self> {
        Self::from_parallel(table.sizes, table.counts)
    }
}

impl SizeDistribution {
    /// Build from parallel arrays; bins are sorted ascending
    pub fn from_parallel(bins: Vec<f64>, counts: Vec<f64>) -> DistributionResult<Self> {
        if bins.len() != counts.len() {
            return Err(DistributionError::LengthMismatch {
                bins: bins.len(),
                counts: counts.len(),
            });
        }
        Self::from_pairs(bins.into_iter().zip(counts))
    }

    /// Build from `(size, count)` pairs in any order
    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, f64)>) -> DistributionResult<Self> {
        let mut pairs: Vec<(f64, f64)> = pairs.into_iter().collect();
        if pairs.is_empty() {
            return Err(DistributionError::Empty);
        }
        for (index, &(size, count)) in pairs.iter().enumerate() {
            if !size.is_finite() || !count.is_finite() {
                return Err(DistributionError::NonFinite { index });
            }
            if count < 0.0 {
                return Err(DistributionError::NegativeCount { index, value: count });
            }
        }

        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (bins, counts) = pairs.into_iter().unzip();
        Ok(Self { bins, counts })
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn total_count(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// `(size, count)` pairs in ascending size order
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.bins.iter().copied().zip(self.counts.iter().copied())
    }

    /// Count-weighted mean size
    pub fn mean(&self) -> Option<f64> {
        let total = self.total_count();
        if total <= 0.0 {
            return None;
        }
        Some(self.pairs().map(|(b, c)| b * c).sum::<f64>() / total)
    }

    /// Count-weighted (population) standard deviation
    pub fn std_dev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let total = self.total_count();
        let var = self
            .pairs()
            .map(|(b, c)| c * (b - mean).powi(2))
            .sum::<f64>()
            / total;
        Some(var.sqrt())
    }

    /// Bin with the largest count
    pub fn mode(&self) -> Option<f64> {
        self.pairs()
            .filter(|&(_, c)| c > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(b, _)| b)
    }

    /// Count-weighted percentile, `p` in 0..=100
    ///
    /// Each bin's mass is placed at its size, and the cumulative curve is
    /// linearly interpolated between bin midpoints of mass.
    pub fn percentile(&self, p: f64) -> Option<f64> {
        let total = self.total_count();
        if total <= 0.0 || p.is_nan() {
            return None;
        }
        let target = p.clamp(0.0, 100.0) / 100.0 * total;

        let mut mids = Vec::with_capacity(self.len());
        let mut cum = 0.0;
        for &c in &self.counts {
            mids.push(cum + c / 2.0);
            cum += c;
        }

        let last = self.len() - 1;
        if target <= mids[0] {
            return Some(self.bins[0]);
        }
        if target >= mids[last] {
            return Some(self.bins[last]);
        }

        let i = mids.partition_point(|&m| m < target);
        let frac = (target - mids[i - 1]) / (mids[i] - mids[i - 1]);
        Some(self.bins[i - 1] + frac * (self.bins[i] - self.bins[i - 1]))
    }

    /// Summary statistics (count is the total weight, rounded)
    pub fn statistics(&self) -> SizeStatistics {
        SizeStatistics {
            count: self.total_count().round() as u64,
            mean: self.mean(),
            std_dev: self.std_dev(),
            d10: self.percentile(10.0),
            d50: self.percentile(50.0),
            d90: self.percentile(90.0),
        }
    }

    /// Counts scaled so the tallest bin is 1.0
    pub fn normalized_counts(&self) -> Vec<f64> {
        let max = self.counts.iter().copied().fold(0.0, f64::max);
        if max <= 0.0 {
            return vec![0.0; self.len()];
        }
        self.counts.iter().map(|c| c / max).collect()
    }

    /// Expand into a weighted sample of exactly `size` values for KDE and
    /// two-sample tests
    ///
    /// Draws are placed at evenly spaced positions along the cumulative
    /// count, so every bin receives the floor or ceiling of its share and
    /// bins far smaller than one draw still contribute in proportion.
    pub fn expand(&self, size: usize) -> Vec<f64> {
        let total = self.total_count();
        if total <= 0.0 || size == 0 {
            return Vec::new();
        }

        let step = total / size as f64;
        let last = self.len() - 1;
        let mut out = Vec::with_capacity(size);
        let mut bin = 0;
        let mut upper = self.counts[0];
        for k in 0..size {
            let target = (k as f64 + 0.5) * step;
            while target > upper && bin < last {
                bin += 1;
                upper += self.counts[bin];
            }
            out.push(self.bins[bin]);
        }
        out
    }
}
