//! Backend request and response payloads
//!
//! The backend omits fields freely, so most response fields are `Option` and
//! read through accessor methods that apply a fixed fallback order.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crossize_core::{
    ComparisonResult, DistributionResult, MetricComparison, SizeDistribution, Verdict,
};
use crossize_gating::DataPoint;

use crate::error::{ClientError, ClientResult};

/// One entry of `GET /samples`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    #[serde(alias = "sample_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub has_fcs: Option<bool>,
    #[serde(default)]
    pub has_nta: Option<bool>,
}

impl SampleSummary {
    /// Display name, falling back to the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// `GET /samples` answers either a bare array or `{"samples": [...]}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum SampleListing {
    Bare(Vec<SampleSummary>),
    Wrapped { samples: Vec<SampleSummary> },
}

impl SampleListing {
    pub(crate) fn into_samples(self) -> Vec<SampleSummary> {
        match self {
            SampleListing::Bare(samples) | SampleListing::Wrapped { samples } => samples,
        }
    }
}

/// Size statistics as the backend reports them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeSummary {
    pub mean_size: Option<f64>,
    pub median_size: Option<f64>,
    pub d10: Option<f64>,
    pub d50: Option<f64>,
    pub d90: Option<f64>,
    #[serde(alias = "std")]
    pub std_size: Option<f64>,
}

impl SizeSummary {
    /// `d50`, then `median_size`
    pub fn median_size(&self) -> Option<f64> {
        self.d50.or(self.median_size)
    }

    /// `mean_size`, then the median
    pub fn mean_size(&self) -> Option<f64> {
        self.mean_size.or_else(|| self.median_size())
    }
}

/// `GET /samples/{id}/fcs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcsResults {
    pub sample_id: String,
    #[serde(default, alias = "total_events")]
    pub event_count: Option<u64>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(flatten)]
    pub sizes: SizeSummary,
}

/// One histogram bin in an NTA result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeBin {
    #[serde(alias = "size_nm", alias = "bin")]
    pub size: f64,
    #[serde(alias = "concentration", alias = "number")]
    pub count: f64,
}

/// `GET /samples/{id}/nta`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NtaResults {
    pub sample_id: String,
    #[serde(default)]
    pub concentration: Option<f64>,
    #[serde(default, alias = "distribution")]
    pub size_distribution: Vec<SizeBin>,
    #[serde(flatten)]
    pub sizes: SizeSummary,
}

impl NtaResults {
    /// Histogram as a [`SizeDistribution`], `None` if the backend sent no bins
    pub fn distribution(&self) -> Option<DistributionResult<SizeDistribution>> {
        if self.size_distribution.is_empty() {
            return None;
        }
        Some(SizeDistribution::from_pairs(
            self.size_distribution.iter().map(|b| (b.size, b.count)),
        ))
    }
}

/// A point of `GET /samples/{id}/scatter`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub index: Option<usize>,
}

/// `GET /samples/{id}/scatter`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterResponse {
    #[serde(default)]
    pub x_channel: Option<String>,
    #[serde(default)]
    pub y_channel: Option<String>,
    #[serde(default)]
    pub points: Vec<ScatterPoint>,
    #[serde(default)]
    pub total_events: Option<u64>,
}

impl ScatterResponse {
    pub fn data_points(&self) -> Vec<DataPoint> {
        self.points.iter().map(|p| DataPoint::new(p.x, p.y)).collect()
    }

    /// Event index of every point; position in the response when the
    /// backend leaves it out
    pub fn event_indices(&self) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| p.index.unwrap_or(i))
            .collect()
    }

    /// Whether the backend sent fewer points than the sample has
    pub fn is_downsampled(&self) -> bool {
        self.total_events
            .is_some_and(|total| total > self.points.len() as u64)
    }
}

/// `POST /cross-validate` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidateRequest {
    pub fcs_sample_id: String,
    pub nta_sample_id: String,
}

/// One metric of a cross-validation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPayload {
    #[serde(alias = "name")]
    pub metric: String,
    pub fcs_value: f64,
    pub nta_value: f64,
    #[serde(default, alias = "discrepancy")]
    pub discrepancy_percent: Option<f64>,
}

/// `POST /cross-validate` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationPayload {
    #[serde(default)]
    pub fcs_sample_id: Option<String>,
    #[serde(default)]
    pub nta_sample_id: Option<String>,
    #[serde(default, alias = "status")]
    pub verdict: Option<String>,
    #[serde(default, alias = "comparisons")]
    pub metrics: Vec<MetricPayload>,
    #[serde(default, alias = "message")]
    pub summary: Option<String>,
}

impl CrossValidationPayload {
    /// Convert into a [`ComparisonResult`] for `request`
    ///
    /// Sample ids fall back to the request's. A missing or unknown verdict is
    /// a decode error since it is never computed locally.
    pub fn into_result(self, request: &CrossValidateRequest) -> ClientResult<ComparisonResult> {
        let label = self.verdict.ok_or(ClientError::Decode {
            what: "cross-validation",
            message: "missing verdict".to_string(),
        })?;
        let verdict = Verdict::parse(&label).ok_or_else(|| ClientError::Decode {
            what: "cross-validation",
            message: format!("unknown verdict '{label}'"),
        })?;

        let metrics = self
            .metrics
            .into_iter()
            .map(|m| {
                MetricComparison::resolve(m.metric, m.fcs_value, m.nta_value, m.discrepancy_percent)
            })
            .collect();

        Ok(ComparisonResult {
            fcs_sample_id: self
                .fcs_sample_id
                .unwrap_or_else(|| request.fcs_sample_id.clone()),
            nta_sample_id: self
                .nta_sample_id
                .unwrap_or_else(|| request.nta_sample_id.clone()),
            metrics,
            verdict,
            summary: self.summary,
            received_at: Utc::now(),
        })
    }
}

/// `POST /population-shift` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationShiftRequest {
    pub baseline_sample_id: String,
    pub sample_id: String,
    pub channel: String,
}

/// `POST /population-shift` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftReport {
    pub shift_detected: Option<bool>,
    pub shift_percent: Option<f64>,
    pub p_value: Option<f64>,
    pub baseline_median: Option<f64>,
    pub sample_median: Option<f64>,
    pub message: Option<String>,
}

impl ShiftReport {
    /// `shift_detected`, then `p_value < alpha`, then false
    pub fn detected(&self, alpha: f64) -> bool {
        self.shift_detected
            .or_else(|| self.p_value.map(|p| p < alpha))
            .unwrap_or(false)
    }

    /// `shift_percent`, then the discrepancy of the two medians
    pub fn shift_percent(&self) -> Option<f64> {
        self.shift_percent.or_else(|| {
            let (a, b) = (self.baseline_median?, self.sample_median?);
            crossize_core::stats::discrepancy(a, b)
        })
    }
}

/// `POST /gated-analysis` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatedAnalysisRequest {
    pub sample_id: String,
    pub x_channel: String,
    pub y_channel: String,
    /// Event indices inside the gate
    pub indices: Vec<usize>,
}

/// `POST /gated-analysis` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatedStats {
    #[serde(default, alias = "n_events")]
    pub event_count: Option<u64>,
    #[serde(default)]
    pub percent_of_total: Option<f64>,
    #[serde(flatten)]
    pub sizes: SizeSummary,
}

impl GatedStats {
    /// `event_count`, then the number of indices sent
    pub fn event_count(&self, request: &GatedAnalysisRequest) -> u64 {
        self.event_count.unwrap_or(request.indices.len() as u64)
    }
}

/// `GET /samples/{id}/axis-recommendation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisRecommendation {
    #[serde(alias = "x")]
    pub x_channel: String,
    #[serde(alias = "y")]
    pub y_channel: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_shapes() {
        let bare: SampleListing =
            serde_json::from_str(r#"[{"id": "S1", "name": "Plasma"}]"#).unwrap();
        let wrapped: SampleListing =
            serde_json::from_str(r#"{"samples": [{"sample_id": "S2", "has_fcs": true}]}"#).unwrap();

        let bare = bare.into_samples();
        assert_eq!(bare[0].display_name(), "Plasma");

        let wrapped = wrapped.into_samples();
        assert_eq!(wrapped[0].id, "S2");
        assert_eq!(wrapped[0].display_name(), "S2");
        assert_eq!(wrapped[0].has_fcs, Some(true));
    }

    #[test]
    fn test_median_fallback() {
        let d50: SizeSummary = serde_json::from_str(r#"{"d50": 101.0, "median_size": 99.0}"#).unwrap();
        assert_eq!(d50.median_size(), Some(101.0));

        let median: SizeSummary = serde_json::from_str(r#"{"median_size": 99.0}"#).unwrap();
        assert_eq!(median.median_size(), Some(99.0));
        assert_eq!(median.mean_size(), Some(99.0));

        let none: SizeSummary = serde_json::from_str("{}").unwrap();
        assert_eq!(none.median_size(), None);
    }

    #[test]
    fn test_fcs_results_flattened_sizes() {
        let json = r#"{
            "sample_id": "S1",
            "total_events": 12000,
            "channels": ["FSC-A", "SSC-A"],
            "mean_size": 110.5,
            "d50": 104.0
        }"#;
        let fcs: FcsResults = serde_json::from_str(json).unwrap();
        assert_eq!(fcs.event_count, Some(12000));
        assert_eq!(fcs.sizes.median_size(), Some(104.0));
        assert_eq!(fcs.channels.len(), 2);
    }

    #[test]
    fn test_nta_distribution() {
        let json = r#"{
            "sample_id": "S1",
            "size_distribution": [
                {"size": 150.0, "concentration": 2.0},
                {"size_nm": 50.0, "count": 1.0}
            ]
        }"#;
        let nta: NtaResults = serde_json::from_str(json).unwrap();
        let dist = nta.distribution().unwrap().unwrap();
        assert_eq!(dist.bins(), &[50.0, 150.0]);

        let empty: NtaResults = serde_json::from_str(r#"{"sample_id": "S1"}"#).unwrap();
        assert!(empty.distribution().is_none());
    }

    #[test]
    fn test_scatter_indices() {
        let json = r#"{"points": [{"x": 1.0, "y": 2.0}, {"x": 3.0, "y": 4.0, "index": 17}], "total_events": 900}"#;
        let scatter: ScatterResponse = serde_json::from_str(json).unwrap();
        assert_eq!(scatter.event_indices(), vec![0, 17]);
        assert_eq!(scatter.data_points()[1], DataPoint::new(3.0, 4.0));
        assert!(scatter.is_downsampled());
    }

    #[test]
    fn test_cross_validation_conversion() {
        let request = CrossValidateRequest {
            fcs_sample_id: "F1".into(),
            nta_sample_id: "N1".into(),
        };
        let json = r#"{
            "status": "ACCEPTABLE",
            "comparisons": [
                {"name": "d50", "fcs_value": 10.0, "nta_value": 12.0},
                {"metric": "mean", "fcs_value": 100.0, "nta_value": 104.0, "discrepancy": 3.9}
            ],
            "message": "within tolerance"
        }"#;
        let payload: CrossValidationPayload = serde_json::from_str(json).unwrap();
        let result = payload.into_result(&request).unwrap();

        assert_eq!(result.verdict, Verdict::Acceptable);
        assert!(result.matches("F1", "N1"));
        assert!((result.metric("d50").unwrap().discrepancy_percent - 18.1818).abs() < 1e-3);
        assert_eq!(result.metric("mean").unwrap().discrepancy_percent, 3.9);
        assert_eq!(result.summary.as_deref(), Some("within tolerance"));
    }

    #[test]
    fn test_missing_verdict_is_decode_error() {
        let request = CrossValidateRequest {
            fcs_sample_id: "F1".into(),
            nta_sample_id: "N1".into(),
        };
        let payload: CrossValidationPayload = serde_json::from_str(r#"{"metrics": []}"#).unwrap();
        assert!(matches!(
            payload.into_result(&request),
            Err(ClientError::Decode { .. })
        ));

        let payload: CrossValidationPayload =
            serde_json::from_str(r#"{"verdict": "unclear"}"#).unwrap();
        assert!(payload.into_result(&request).is_err());
    }

    #[test]
    fn test_shift_fallbacks() {
        let report = ShiftReport {
            p_value: Some(0.01),
            baseline_median: Some(100.0),
            sample_median: Some(120.0),
            ..Default::default()
        };
        assert!(report.detected(0.05));
        assert!(!report.detected(0.001));
        assert!((report.shift_percent().unwrap() - 18.1818).abs() < 1e-3);

        let explicit = ShiftReport {
            shift_detected: Some(false),
            p_value: Some(0.0001),
            ..Default::default()
        };
        assert!(!explicit.detected(0.05));
        assert!(!ShiftReport::default().detected(0.05));
    }

    #[test]
    fn test_gated_event_count_fallback() {
        let request = GatedAnalysisRequest {
            sample_id: "S1".into(),
            x_channel: "FSC-A".into(),
            y_channel: "SSC-A".into(),
            indices: vec![1, 2, 3],
        };
        let stats: GatedStats = serde_json::from_str(r#"{"d50": 95.0}"#).unwrap();
        assert_eq!(stats.event_count(&request), 3);
        assert_eq!(stats.sizes.median_size(), Some(95.0));
    }
}
