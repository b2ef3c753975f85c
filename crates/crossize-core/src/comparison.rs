//! Backend cross-validation results
//!
//! The analysis backend decides the overall [`Verdict`]; it is never derived
//! locally. Per-metric discrepancies the backend leaves out are filled in by
//! [`MetricComparison::resolve`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crossize_stats::discrepancy;

/// Overall agreement between the two instruments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Acceptable,
    Warning,
    Fail,
}

impl Verdict {
    /// Parse a backend label, ignoring case
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "pass" | "passed" => Some(Verdict::Pass),
            "acceptable" => Some(Verdict::Acceptable),
            "warning" | "warn" => Some(Verdict::Warning),
            "fail" | "failed" => Some(Verdict::Fail),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Pass => "Pass",
            Verdict::Acceptable => "Acceptable",
            Verdict::Warning => "Warning",
            Verdict::Fail => "Fail",
        }
    }

    /// Pass or Acceptable
    pub fn is_ok(&self) -> bool {
        matches!(self, Verdict::Pass | Verdict::Acceptable)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Paired FCS/NTA values for one metric (e.g. "d50")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: String,
    pub fcs_value: f64,
    pub nta_value: f64,
    /// Percentage discrepancy between the two values
    pub discrepancy_percent: f64,
}

impl MetricComparison {
    /// Fill in the discrepancy: backend value, then the locally computed
    /// symmetric discrepancy, then 0
    pub fn resolve(
        metric: impl Into<String>,
        fcs_value: f64,
        nta_value: f64,
        backend_discrepancy: Option<f64>,
    ) -> Self {
        let metric = metric.into();
        let discrepancy_percent = backend_discrepancy
            .filter(|d| d.is_finite())
            .or_else(|| {
                tracing::warn!(%metric, "Backend omitted discrepancy, computing locally");
                discrepancy(fcs_value, nta_value)
            })
            .unwrap_or(0.0);

        Self {
            metric,
            fcs_value,
            nta_value,
            discrepancy_percent,
        }
    }
}

/// Result of a backend cross-validation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub fcs_sample_id: String,
    pub nta_sample_id: String,
    pub metrics: Vec<MetricComparison>,
    pub verdict: Verdict,
    /// Free-text explanation from the backend
    pub summary: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl ComparisonResult {
    pub fn metric(&self, name: &str) -> Option<&MetricComparison> {
        self.metrics
            .iter()
            .find(|m| m.metric.eq_ignore_ascii_case(name))
    }

    /// Largest per-metric discrepancy
    pub fn max_discrepancy(&self) -> Option<f64> {
        self.metrics
            .iter()
            .map(|m| m.discrepancy_percent)
            .max_by(|a, b| a.total_cmp(b))
    }

    /// Whether this result belongs to the given sample pair
    pub fn matches(&self, fcs_sample_id: &str, nta_sample_id: &str) -> bool {
        self.fcs_sample_id == fcs_sample_id && self.nta_sample_id == nta_sample_id
    }
}
