//! Two-sample statistical tests
//!
//! Compares an FCS size sample against an NTA size sample:
//! - Kolmogorov-Smirnov: largest ECDF gap with the asymptotic Kolmogorov p-value
//! - Mann-Whitney U: rank-sum test with a normal approximation
//! - Cohen's d: standardized mean difference
//!
//! Samples with fewer than [`MIN_SAMPLE_SIZE`] finite values produce
//! [`TestOutcome::InsufficientData`] without touching any arithmetic.

use serde::{Deserialize, Serialize};

use crate::ecdf::Ecdf;
use crate::error::{StatsError, StatsResult};
use crate::normal::two_tailed_p;
use crate::summary::{mean, rank_with_ties, variance, VarianceKind};

/// Minimum number of values per sample for any test to run
pub const MIN_SAMPLE_SIZE: usize = 10;

/// Number of terms of the Kolmogorov series
const KOLMOGOROV_TERMS: u32 = 100;

/// Significance threshold used to call a difference significant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SignificanceLevel {
    /// alpha = 0.05
    Standard,
    /// alpha = 0.01
    Strict,
    /// Any alpha in (0, 1)
    Custom(f64),
}

impl Default for SignificanceLevel {
    fn default() -> Self {
        SignificanceLevel::Standard
    }
}

impl SignificanceLevel {
    /// Build a level from a raw alpha, mapping 0.05 / 0.01 to the named variants
    pub fn from_alpha(alpha: f64) -> StatsResult<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(StatsError::InvalidAlpha(alpha));
        }
        Ok(if alpha == 0.05 {
            SignificanceLevel::Standard
        } else if alpha == 0.01 {
            SignificanceLevel::Strict
        } else {
            SignificanceLevel::Custom(alpha)
        })
    }

    /// The alpha value
    pub fn alpha(&self) -> f64 {
        match self {
            SignificanceLevel::Standard => 0.05,
            SignificanceLevel::Strict => 0.01,
            SignificanceLevel::Custom(alpha) => *alpha,
        }
    }
}

/// Which test produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestKind {
    KolmogorovSmirnov,
    MannWhitneyU,
}

impl TestKind {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            TestKind::KolmogorovSmirnov => "Kolmogorov-Smirnov",
            TestKind::MannWhitneyU => "Mann-Whitney U",
        }
    }
}

/// Outcome of a hypothesis test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalTestResult {
    pub test: TestKind,
    /// D for KS, U for Mann-Whitney
    pub statistic: f64,
    pub p_value: f64,
    pub alpha: f64,
    /// `p_value < alpha`
    pub significant: bool,
    pub interpretation: String,
}

impl StatisticalTestResult {
    fn new(test: TestKind, statistic: f64, p_value: f64, level: SignificanceLevel) -> Self {
        let alpha = level.alpha();
        let significant = p_value < alpha;
        let interpretation = if significant {
            format!(
                "{}: distributions differ significantly (p = {:.4} < {})",
                test.name(),
                p_value,
                alpha
            )
        } else {
            format!(
                "{}: no significant difference (p = {:.4} >= {})",
                test.name(),
                p_value,
                alpha
            )
        };
        Self {
            test,
            statistic,
            p_value,
            alpha,
            significant,
            interpretation,
        }
    }
}

/// Either a computed result or the "cannot compute" sentinel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TestOutcome<T> {
    Computed(T),
    InsufficientData { required: usize, n1: usize, n2: usize },
}

impl<T> TestOutcome<T> {
    /// The computed value, if any
    pub fn computed(&self) -> Option<&T> {
        match self {
            TestOutcome::Computed(value) => Some(value),
            TestOutcome::InsufficientData { .. } => None,
        }
    }

    /// Whether the sentinel was returned
    pub fn is_insufficient(&self) -> bool {
        matches!(self, TestOutcome::InsufficientData { .. })
    }
}

fn finite(data: &[f64]) -> Vec<f64> {
    data.iter().copied().filter(|x| x.is_finite()).collect()
}

/// Finite values of both samples, or the sentinel when either is too small
fn prepare(a: &[f64], b: &[f64]) -> Result<(Vec<f64>, Vec<f64>), (usize, usize)> {
    let a = finite(a);
    let b = finite(b);
    if a.len() < MIN_SAMPLE_SIZE || b.len() < MIN_SAMPLE_SIZE {
        tracing::warn!(
            n1 = a.len(),
            n2 = b.len(),
            required = MIN_SAMPLE_SIZE,
            "insufficient data for two-sample test"
        );
        return Err((a.len(), b.len()));
    }
    Ok((a, b))
}

fn insufficient<T>((n1, n2): (usize, usize)) -> TestOutcome<T> {
    TestOutcome::InsufficientData {
        required: MIN_SAMPLE_SIZE,
        n1,
        n2,
    }
}

/// Asymptotic Kolmogorov p-value for statistic `d` and effective size `n_eff`
pub fn kolmogorov_p_value(d: f64, n_eff: f64) -> f64 {
    let sqrt_n = n_eff.sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * d;
    if lambda == 0.0 {
        return 1.0;
    }
    let sum: f64 = (1..=KOLMOGOROV_TERMS)
        .map(|k| {
            let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
            let k = f64::from(k);
            sign * (-2.0 * k * k * lambda * lambda).exp()
        })
        .sum();
    (2.0 * sum).clamp(0.0, 1.0)
}

/// Two-sample Kolmogorov-Smirnov test
pub fn ks_test(a: &[f64], b: &[f64], level: SignificanceLevel) -> TestOutcome<StatisticalTestResult> {
    let (a, b) = match prepare(a, b) {
        Ok(samples) => samples,
        Err(counts) => return insufficient(counts),
    };

    let d = Ecdf::from_data(&a).supremum_distance(&Ecdf::from_data(&b));
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let p_value = kolmogorov_p_value(d, n1 * n2 / (n1 + n2));

    TestOutcome::Computed(StatisticalTestResult::new(
        TestKind::KolmogorovSmirnov,
        d,
        p_value,
        level,
    ))
}

/// Two-sample Mann-Whitney U test (two-tailed, normal approximation)
pub fn mann_whitney_u(
    a: &[f64],
    b: &[f64],
    level: SignificanceLevel,
) -> TestOutcome<StatisticalTestResult> {
    let (a, b) = match prepare(a, b) {
        Ok(samples) => samples,
        Err(counts) => return insufficient(counts),
    };

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;

    let combined: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
    let ranks = rank_with_ties(&combined);
    let rank_sum_a: f64 = ranks[..a.len()].iter().sum();

    let u1 = rank_sum_a - n1 * (n1 + 1.0) / 2.0;
    let u2 = n1 * n2 - u1;
    let u = u1.min(u2);

    let mu = n1 * n2 / 2.0;
    let sigma = (n1 * n2 * (n1 + n2 + 1.0) / 12.0).sqrt();

    let all_tied = combined.iter().all(|&v| v == combined[0]);
    let p_value = if all_tied || sigma == 0.0 {
        1.0
    } else {
        let z = (((u - mu).abs() - 0.5) / sigma).max(0.0);
        two_tailed_p(z)
    };

    TestOutcome::Computed(StatisticalTestResult::new(
        TestKind::MannWhitneyU,
        u,
        p_value,
        level,
    ))
}

/// Conventional magnitude bands for Cohen's d
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectMagnitude {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectMagnitude {
    /// Classify |d|
    pub fn from_d(d: f64) -> Self {
        let d = d.abs();
        if d < 0.2 {
            EffectMagnitude::Negligible
        } else if d < 0.5 {
            EffectMagnitude::Small
        } else if d < 0.8 {
            EffectMagnitude::Medium
        } else {
            EffectMagnitude::Large
        }
    }
}

/// Standardized mean difference between two samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSize {
    /// (mean_a - mean_b) / pooled_std
    pub cohens_d: f64,
    pub pooled_std: f64,
    pub magnitude: EffectMagnitude,
}

/// Cohen's d with a pooled unbiased standard deviation
///
/// Zero pooled spread (both samples constant) gives d = 0.
pub fn cohens_d(a: &[f64], b: &[f64]) -> TestOutcome<EffectSize> {
    let (a, b) = match prepare(a, b) {
        Ok(samples) => samples,
        Err(counts) => return insufficient(counts),
    };

    // prepare() guarantees at least MIN_SAMPLE_SIZE values on each side
    let (Some(mean_a), Some(mean_b)) = (mean(&a), mean(&b)) else {
        return insufficient((a.len(), b.len()));
    };
    let var_a = variance(&a, VarianceKind::Sample).unwrap_or(0.0);
    let var_b = variance(&b, VarianceKind::Sample).unwrap_or(0.0);

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let pooled_std = (((n1 - 1.0) * var_a + (n2 - 1.0) * var_b) / (n1 + n2 - 2.0)).sqrt();

    let d = if pooled_std == 0.0 {
        0.0
    } else {
        (mean_a - mean_b) / pooled_std
    };

    TestOutcome::Computed(EffectSize {
        cohens_d: d,
        pooled_std,
        magnitude: EffectMagnitude::from_d(d),
    })
}

/// All two-sample comparisons for one FCS/NTA pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSuite {
    pub ks: TestOutcome<StatisticalTestResult>,
    pub mann_whitney: TestOutcome<StatisticalTestResult>,
    pub effect_size: TestOutcome<EffectSize>,
}

impl ComparisonSuite {
    /// Whether any computed test found a significant difference
    pub fn any_significant(&self) -> bool {
        [&self.ks, &self.mann_whitney]
            .iter()
            .filter_map(|outcome| outcome.computed())
            .any(|result| result.significant)
    }
}

/// Run every two-sample comparison
pub fn compare_samples(a: &[f64], b: &[f64], level: SignificanceLevel) -> ComparisonSuite {
    ComparisonSuite {
        ks: ks_test(a, b, level),
        mann_whitney: mann_whitney_u(a, b, level),
        effect_size: cohens_d(a, b),
    }
}
