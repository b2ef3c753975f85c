//! FCS vs NTA distribution analysis
//!
//! [`DistributionAnalysis::compute`] does the full local comparison of one
//! sample pair. [`AnalysisCache`] keeps the last result and recomputes only
//! when the state revision or the selected pair changes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crossize_gating::GateSet;
use crossize_stats::{
    compare_samples, linear_regression, mean_discrepancy, normalize_pair, paired_discrepancies,
    ComparisonSuite, KdeCurve, LinearFit, PairDiscrepancy,
};

use crate::config::{AnalysisSettings, GatingSettings};
use crate::error::CrossizeResult;
use crate::sample::{Sample, SampleData, SizeStatistics};

/// Local comparison of one FCS/NTA pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionAnalysis {
    pub fcs_sample_id: String,
    pub nta_sample_id: String,
    /// Summary of the FCS sizes actually analysed (after gating)
    pub fcs_summary: SizeStatistics,
    pub nta_summary: SizeStatistics,
    /// KDE curves scaled by their shared maximum
    pub fcs_curve: KdeCurve,
    pub nta_curve: KdeCurve,
    pub tests: ComparisonSuite,
    /// Present when the two samples can be paired point by point
    pub regression: Option<LinearFit>,
    pub discrepancies: Vec<PairDiscrepancy>,
    /// Discrepancy of the two medians, in percent
    pub d50_discrepancy: Option<f64>,
    /// Number of FCS events kept by the active gates, when gating applied
    pub gated_events: Option<usize>,
}

impl DistributionAnalysis {
    /// Analyse a pair without gating
    pub fn compute(
        fcs: &Sample,
        nta: &Sample,
        settings: &AnalysisSettings,
    ) -> CrossizeResult<Self> {
        Self::compute_gated(fcs, nta, settings, None)
    }

    /// Analyse a pair, restricting FCS sizes to the active gates if given
    pub fn compute_gated(
        fcs: &Sample,
        nta: &Sample,
        settings: &AnalysisSettings,
        gating: Option<(&GateSet, &GatingSettings)>,
    ) -> CrossizeResult<Self> {
        let level = settings.significance()?;

        let gated = match gating {
            Some((gates, gating)) if gating.apply_to_analysis => {
                fcs.gated_size_values(gates, gating.combine)
            }
            _ => None,
        };
        let gated_events = gated.as_ref().map(Vec::len);
        let fcs_sizes = gated.unwrap_or_else(|| sample_sizes(fcs, settings));
        let nta_sizes = sample_sizes(nta, settings);

        let bandwidth = settings.bandwidth();
        let fcs_raw = KdeCurve::estimate(&fcs_sizes, bandwidth, settings.kde_points)?;
        let nta_raw = KdeCurve::estimate(&nta_sizes, bandwidth, settings.kde_points)?;
        let (fcs_curve, nta_curve) = normalize_pair(&fcs_raw, &nta_raw);

        let fcs_summary = match gated_events {
            Some(_) => SizeStatistics::from_sizes(&fcs_sizes),
            None => *fcs.statistics(),
        };
        let nta_summary = *nta.statistics();

        let tests = compare_samples(&fcs_sizes, &nta_sizes, level);

        let (regression, discrepancies) = match paired_values(fcs, nta) {
            Some((x, y)) => (
                Some(linear_regression(&x, &y)),
                paired_discrepancies(&x, &y),
            ),
            None => (None, Vec::new()),
        };

        let d50_discrepancy = match (fcs_summary.d50, nta_summary.d50) {
            (Some(a), Some(b)) => crossize_stats::discrepancy(a, b),
            _ => None,
        };

        tracing::debug!(
            fcs = fcs.id(),
            nta = nta.id(),
            fcs_n = fcs_sizes.len(),
            nta_n = nta_sizes.len(),
            paired = regression.is_some(),
            "Computed distribution analysis"
        );

        Ok(Self {
            fcs_sample_id: fcs.id().to_string(),
            nta_sample_id: nta.id().to_string(),
            fcs_summary,
            nta_summary,
            fcs_curve,
            nta_curve,
            tests,
            regression,
            discrepancies,
            d50_discrepancy,
            gated_events,
        })
    }

    /// Mean of the defined pairwise discrepancies
    pub fn mean_pair_discrepancy(&self) -> Option<f64> {
        mean_discrepancy(&self.discrepancies)
    }
}

fn sample_sizes(sample: &Sample, settings: &AnalysisSettings) -> Vec<f64> {
    match sample.data() {
        SampleData::Distribution(dist) => dist.expand(settings.expansion_size),
        SampleData::Events(_) => sample.size_values(),
    }
}

/// Point-by-point pairing of two samples
///
/// Only two distributions on identical bins pair, by their normalized
/// counts. Events from different instruments are independent draws and
/// have no correspondence by index.
pub fn paired_values(fcs: &Sample, nta: &Sample) -> Option<(Vec<f64>, Vec<f64>)> {
    match (fcs.data(), nta.data()) {
        (SampleData::Distribution(a), SampleData::Distribution(b)) if a.bins() == b.bins() => {
            Some((a.normalized_counts(), b.normalized_counts()))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    revision: u64,
    fcs: String,
    nta: String,
}

/// Last analysis, recomputed only when its inputs change
#[derive(Debug, Default)]
pub struct AnalysisCache {
    key: Option<CacheKey>,
    result: Option<Arc<DistributionAnalysis>>,
    computations: u64,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the cache up to date with `state`
    ///
    /// Returns `None` while either side of the pair is unselected.
    pub fn refresh(
        &mut self,
        state: &crate::state::AppState,
    ) -> CrossizeResult<Option<Arc<DistributionAnalysis>>> {
        let (Some(fcs), Some(nta)) = (state.selected_fcs(), state.selected_nta()) else {
            self.key = None;
            self.result = None;
            return Ok(None);
        };

        let key = CacheKey {
            revision: state.revision(),
            fcs: fcs.id().to_string(),
            nta: nta.id().to_string(),
        };
        if self.key.as_ref() == Some(&key) {
            return Ok(self.result.clone());
        }

        let settings = state.settings();
        let analysis = DistributionAnalysis::compute_gated(
            fcs,
            nta,
            &settings.analysis,
            Some((state.gates(), &settings.gating)),
        )?;
        self.computations += 1;
        self.key = Some(key);
        self.result = Some(Arc::new(analysis));
        Ok(self.result.clone())
    }

    /// Cached result without recomputing
    pub fn current(&self) -> Option<&Arc<DistributionAnalysis>> {
        self.result.as_ref()
    }

    /// Number of recomputations so far
    pub fn computations(&self) -> u64 {
        self.computations
    }

    pub fn invalidate(&mut self) {
        self.key = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::SizeDistribution;
    use crate::sample::Instrument;
    use crate::state::{reduce, reduce_all, Action, AppState};
    use crossize_gating::{Gate, GateShape};
    use crossize_io::EventTable;

    fn event_sample(id: &str, instrument: Instrument, sizes: Vec<f64>) -> Sample {
        let index: Vec<f64> = (0..sizes.len()).map(|i| i as f64).collect();
        let table = EventTable::new(
            vec!["index".into(), "size".into()],
            vec![index, sizes],
        )
        .unwrap();
        Sample::from_events(id, instrument, table, Some("size")).unwrap()
    }

    fn sizes(n: usize, lo: f64, hi: f64) -> Vec<f64> {
        (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
            .collect()
    }

    #[test]
    fn test_compute_same_distribution() {
        let fcs = event_sample("f", Instrument::Fcs, sizes(50, 80.0, 120.0));
        let nta = event_sample("n", Instrument::Nta, sizes(50, 80.0, 120.0));
        let analysis = DistributionAnalysis::compute(&fcs, &nta, &AnalysisSettings::default()).unwrap();

        assert!(!analysis.tests.any_significant());
        assert_eq!(analysis.d50_discrepancy, Some(0.0));

        let peak = analysis.fcs_curve.max_density().max(analysis.nta_curve.max_density());
        assert!((peak - 1.0).abs() < 1e-12);
        assert_eq!(analysis.fcs_curve.len(), AnalysisSettings::default().kde_points);
    }

    #[test]
    fn test_events_are_not_paired_by_index() {
        // Same sizes in opposite order: pairing by index would report a
        // perfect negative fit between unrelated particles
        let mut reversed = sizes(50, 80.0, 120.0);
        reversed.reverse();
        let fcs = event_sample("f", Instrument::Fcs, sizes(50, 80.0, 120.0));
        let nta = event_sample("n", Instrument::Nta, reversed);
        assert!(paired_values(&fcs, &nta).is_none());

        let analysis = DistributionAnalysis::compute(&fcs, &nta, &AnalysisSettings::default()).unwrap();
        assert!(analysis.regression.is_none());
        assert!(analysis.discrepancies.is_empty());
        assert_eq!(analysis.mean_pair_discrepancy(), None);
        assert!(!analysis.tests.any_significant());
    }

    #[test]
    fn test_distributions_on_same_bins_regress() {
        let bins = vec![60.0, 80.0, 100.0, 120.0, 140.0];
        let a = SizeDistribution::from_parallel(bins.clone(), vec![5.0, 20.0, 40.0, 20.0, 5.0]).unwrap();
        let b = SizeDistribution::from_parallel(bins, vec![10.0, 40.0, 80.0, 40.0, 10.0]).unwrap();
        let fcs = Sample::from_distribution("f", Instrument::Fcs, a);
        let nta = Sample::from_distribution("n", Instrument::Nta, b);

        let analysis = DistributionAnalysis::compute(&fcs, &nta, &AnalysisSettings::default()).unwrap();
        let fit = analysis.regression.unwrap();
        assert!((fit.slope - 1.0).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(analysis.discrepancies.len(), 5);
        assert_eq!(analysis.mean_pair_discrepancy(), Some(0.0));
    }

    #[test]
    fn test_fine_grained_distribution_is_analysed() {
        // 5000 bins of 10 counts: each bin is well under one draw
        let bins: Vec<f64> = (0..5000).map(|i| 50.0 + i as f64 * 0.02).collect();
        let dist = SizeDistribution::from_parallel(bins, vec![10.0; 5000]).unwrap();
        let nta = Sample::from_distribution("n", Instrument::Nta, dist);
        let fcs = event_sample("f", Instrument::Fcs, sizes(200, 50.0, 150.0));

        let settings = AnalysisSettings::default();
        let analysis = DistributionAnalysis::compute(&fcs, &nta, &settings).unwrap();
        assert!(!analysis.tests.ks.is_insufficient());
        assert!(!analysis.tests.mann_whitney.is_insufficient());
        assert!(analysis.nta_curve.max_density() > 0.0);
    }

    #[test]
    fn test_compute_shifted_distribution() {
        let fcs = event_sample("f", Instrument::Fcs, sizes(60, 80.0, 120.0));
        let nta = event_sample("n", Instrument::Nta, sizes(60, 180.0, 220.0));
        let analysis = DistributionAnalysis::compute(&fcs, &nta, &AnalysisSettings::default()).unwrap();
        assert!(analysis.tests.any_significant());
        assert!(analysis.d50_discrepancy.unwrap() > 50.0);
    }

    #[test]
    fn test_small_samples_get_sentinel() {
        let fcs = event_sample("f", Instrument::Fcs, vec![100.0, 101.0, 102.0]);
        let nta = event_sample("n", Instrument::Nta, vec![100.0, 101.0, 102.0]);
        let analysis = DistributionAnalysis::compute(&fcs, &nta, &AnalysisSettings::default()).unwrap();
        assert!(analysis.tests.ks.is_insufficient());
        assert!(analysis.tests.effect_size.is_insufficient());
    }

    #[test]
    fn test_event_vs_distribution_unpaired() {
        let fcs = event_sample("f", Instrument::Fcs, sizes(30, 80.0, 120.0));
        let dist = SizeDistribution::from_parallel(vec![90.0, 100.0, 110.0], vec![1.0, 3.0, 1.0]).unwrap();
        let nta = Sample::from_distribution("n", Instrument::Nta, dist);
        assert!(paired_values(&fcs, &nta).is_none());

        let analysis = DistributionAnalysis::compute(&fcs, &nta, &AnalysisSettings::default()).unwrap();
        assert!(analysis.regression.is_none());
        assert!(analysis.discrepancies.is_empty());
        assert_eq!(analysis.nta_summary.d50, Some(100.0));
    }

    #[test]
    fn test_distributions_on_same_bins_pair() {
        let a = SizeDistribution::from_parallel(vec![50.0, 100.0], vec![2.0, 4.0]).unwrap();
        let b = SizeDistribution::from_parallel(vec![50.0, 100.0], vec![1.0, 2.0]).unwrap();
        let fcs = Sample::from_distribution("f", Instrument::Fcs, a);
        let nta = Sample::from_distribution("n", Instrument::Nta, b);
        let (x, y) = paired_values(&fcs, &nta).unwrap();
        assert_eq!(x, vec![0.5, 1.0]);
        assert_eq!(x, y);
    }

    #[test]
    fn test_gating_restricts_fcs_sizes() {
        let fcs = event_sample("f", Instrument::Fcs, sizes(40, 80.0, 120.0));
        let nta = event_sample("n", Instrument::Nta, sizes(40, 80.0, 120.0));
        let mut gates = GateSet::new();
        // index 0..=19 only
        gates.add(Gate::new("half", GateShape::rectangle(-1.0, 19.5, 0.0, 1000.0), "index", "size").unwrap());

        let analysis = DistributionAnalysis::compute_gated(
            &fcs,
            &nta,
            &AnalysisSettings::default(),
            Some((&gates, &GatingSettings::default())),
        )
        .unwrap();
        assert_eq!(analysis.gated_events, Some(20));
        assert_eq!(analysis.fcs_summary.count, 20);
    }

    #[test]
    fn test_cache_recomputes_on_change_only() {
        let mut cache = AnalysisCache::new();
        let state = AppState::default();
        assert!(cache.refresh(&state).unwrap().is_none());

        let state = reduce_all(
            state,
            [
                Action::LoadSample(event_sample("f", Instrument::Fcs, sizes(30, 80.0, 120.0))),
                Action::LoadSample(event_sample("n", Instrument::Nta, sizes(30, 85.0, 125.0))),
            ],
        );
        let first = cache.refresh(&state).unwrap().unwrap();
        let again = cache.refresh(&state).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(cache.computations(), 1);

        // Non-analysis change keeps the cache
        let state = reduce(state, Action::RequestFailed("offline".into()));
        cache.refresh(&state).unwrap();
        assert_eq!(cache.computations(), 1);

        let state = reduce(state, Action::SetKdePoints(64));
        let updated = cache.refresh(&state).unwrap().unwrap();
        assert_eq!(cache.computations(), 2);
        assert_eq!(updated.fcs_curve.len(), 64);
    }
}
