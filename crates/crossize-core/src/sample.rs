//! Loaded measurement samples
//!
//! A [`Sample`] is immutable once built: state updates replace whole samples
//! rather than editing them in place.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crossize_gating::{DataPoint, GateCombine, GateSet};
use crossize_io::{find_column, EventTable, SIZE_COLUMN_CANDIDATES};
use crossize_stats::SummaryStats;

use crate::distribution::{SizeDistribution, DEFAULT_EXPANSION_SIZE};
use crate::error::{CrossizeError, CrossizeResult};

/// Measuring instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    /// Flow cytometry
    Fcs,
    /// Nanoparticle tracking analysis
    Nta,
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instrument::Fcs => write!(f, "FCS"),
            Instrument::Nta => write!(f, "NTA"),
        }
    }
}

/// Raw measurements behind a sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SampleData {
    /// Per-event channel columns
    Events(EventTable),
    /// Binned size histogram
    Distribution(SizeDistribution),
}

/// Size summary of a sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct SizeStatistics {
    /// Number of particles (total weight for distributions)
    pub count: u64,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub d10: Option<f64>,
    pub d50: Option<f64>,
    pub d90: Option<f64>,
}

impl SizeStatistics {
    /// Statistics of raw per-particle sizes; non-finite values are ignored
    pub fn from_sizes(sizes: &[f64]) -> Self {
        Self::from(&SummaryStats::from_data(sizes))
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Width of the 10-90 band relative to the median
    pub fn span(&self) -> Option<f64> {
        let d50 = self.d50?;
        if d50 == 0.0 {
            return None;
        }
        Some((self.d90? - self.d10?) / d50)
    }
}

impl From<&SummaryStats> for SizeStatistics {
    fn from(s: &SummaryStats) -> Self {
        let finite = |v: f64| v.is_finite().then_some(v);
        Self {
            count: s.count,
            mean: finite(s.mean),
            std_dev: finite(s.std_dev),
            d10: finite(s.d10),
            d50: finite(s.d50),
            d90: finite(s.d90),
        }
    }
}

/// One loaded FCS or NTA measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    id: String,
    name: String,
    instrument: Instrument,
    data: SampleData,
    size_channel: Option<String>,
    statistics: SizeStatistics,
    loaded_at: DateTime<Utc>,
}

impl Sample {
    /// Sample from a per-event table
    ///
    /// The size channel is `size_channel` if given, otherwise the first
    /// column whose header looks like a size. Without one the statistics
    /// stay empty.
    pub fn from_events(
        id: impl Into<String>,
        instrument: Instrument,
        table: EventTable,
        size_channel: Option<&str>,
    ) -> CrossizeResult<Self> {
        let size_channel = match size_channel {
            Some(name) => {
                let idx = table
                    .channel_index(name)
                    .ok_or_else(|| crossize_io::IoError::ChannelNotFound(name.to_string()))?;
                Some(table.channels[idx].clone())
            }
            None => find_column(&table.channels, SIZE_COLUMN_CANDIDATES)
                .map(|idx| table.channels[idx].clone()),
        };

        let statistics = match &size_channel {
            Some(channel) => SizeStatistics::from_sizes(table.channel(channel)?),
            None => SizeStatistics::default(),
        };

        let id = id.into();
        Ok(Self {
            name: id.clone(),
            id,
            instrument,
            data: SampleData::Events(table),
            size_channel,
            statistics,
            loaded_at: Utc::now(),
        })
    }

    /// Sample from a size histogram
    pub fn from_distribution(
        id: impl Into<String>,
        instrument: Instrument,
        distribution: SizeDistribution,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            instrument,
            statistics: distribution.statistics(),
            data: SampleData::Distribution(distribution),
            size_channel: None,
            loaded_at: Utc::now(),
        }
    }

    /// Import an FCS event table export; the id is the file stem
    pub fn import_events(path: impl AsRef<Path>, size_channel: Option<&str>) -> CrossizeResult<Self> {
        let path = path.as_ref();
        let table = crossize_io::read_event_table(path)?;
        let sample = Self::from_events(file_stem(path), Instrument::Fcs, table, size_channel)?;
        tracing::debug!(id = %sample.id, events = sample.len(), "Imported FCS sample");
        Ok(sample)
    }

    /// Import an NTA size distribution export; the id is the file stem
    pub fn import_distribution(path: impl AsRef<Path>) -> CrossizeResult<Self> {
        let path = path.as_ref();
        let table = crossize_io::read_size_distribution(path)?;
        let distribution = SizeDistribution::try_from(table)?;
        let sample = Self::from_distribution(file_stem(path), Instrument::Nta, distribution);
        tracing::debug!(id = %sample.id, bins = sample.len(), "Imported NTA sample");
        Ok(sample)
    }

    /// Replace the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn data(&self) -> &SampleData {
        &self.data
    }

    pub fn statistics(&self) -> &SizeStatistics {
        &self.statistics
    }

    pub fn size_channel(&self) -> Option<&str> {
        self.size_channel.as_deref()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Events, or bins for a distribution
    pub fn len(&self) -> usize {
        match &self.data {
            SampleData::Events(table) => table.num_events(),
            SampleData::Distribution(dist) => dist.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Channel names (empty for distributions)
    pub fn channels(&self) -> &[String] {
        match &self.data {
            SampleData::Events(table) => &table.channels,
            SampleData::Distribution(_) => &[],
        }
    }

    pub fn events(&self) -> Option<&EventTable> {
        match &self.data {
            SampleData::Events(table) => Some(table),
            SampleData::Distribution(_) => None,
        }
    }

    pub fn distribution(&self) -> Option<&SizeDistribution> {
        match &self.data {
            SampleData::Distribution(dist) => Some(dist),
            SampleData::Events(_) => None,
        }
    }

    /// Per-particle sizes
    ///
    /// Events yield the size channel; distributions are expanded into a
    /// weighted sample.
    pub fn size_values(&self) -> Vec<f64> {
        match &self.data {
            SampleData::Events(table) => self
                .size_channel
                .as_deref()
                .and_then(|c| table.channel(c).ok())
                .map(<[f64]>::to_vec)
                .unwrap_or_default(),
            SampleData::Distribution(dist) => dist.expand(DEFAULT_EXPANSION_SIZE),
        }
    }

    /// Scatter points for a pair of channels
    pub fn scatter(&self, x_channel: &str, y_channel: &str) -> CrossizeResult<Vec<DataPoint>> {
        let table = self
            .events()
            .ok_or_else(|| CrossizeError::NotEventData(self.id.clone()))?;
        Ok(table
            .scatter(x_channel, y_channel)?
            .into_iter()
            .map(DataPoint::from)
            .collect())
    }

    /// Membership mask of the active gates over this sample's events
    ///
    /// Gates whose channels the sample lacks are skipped. Returns `None`
    /// when no active gate applies.
    pub fn gate_mask(&self, gates: &GateSet, combine: GateCombine) -> Option<Vec<bool>> {
        self.events()?;
        let mut combined: Option<Vec<bool>> = None;

        for gate in gates.active() {
            let Ok(points) = self.scatter(&gate.x_channel, &gate.y_channel) else {
                tracing::debug!(gate = %gate.name, sample = %self.id, "Gate channels missing, skipped");
                continue;
            };
            let mask = gate.mask(&points);
            combined = Some(match combined {
                None => mask,
                Some(acc) => acc
                    .iter()
                    .zip(&mask)
                    .map(|(&a, &b)| match combine {
                        GateCombine::All => a && b,
                        GateCombine::Any => a || b,
                    })
                    .collect(),
            });
        }

        combined
    }

    /// Size values restricted to gated events
    ///
    /// `None` when no active gate applies to this sample.
    pub fn gated_size_values(&self, gates: &GateSet, combine: GateCombine) -> Option<Vec<f64>> {
        let mask = self.gate_mask(gates, combine)?;
        Some(
            self.size_values()
                .into_iter()
                .zip(mask)
                .filter_map(|(v, keep)| keep.then_some(v))
                .collect(),
        )
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sample")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossize_gating::{Gate, GateShape};

    fn events() -> EventTable {
        EventTable::new(
            vec!["FSC-A".into(), "SSC-A".into(), "Size_nm".into()],
            vec![
                vec![1.0, 2.0, 3.0, 4.0],
                vec![1.0, 2.0, 3.0, 4.0],
                vec![80.0, 100.0, 120.0, f64::NAN],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_size_channel_detected() {
        let sample = Sample::from_events("s1", Instrument::Fcs, events(), None).unwrap();
        assert_eq!(sample.size_channel(), Some("Size_nm"));
        assert_eq!(sample.statistics().count, 3);
        assert_eq!(sample.statistics().d50, Some(100.0));
        assert_eq!(sample.len(), 4);
    }

    #[test]
    fn test_explicit_missing_channel_errors() {
        let err = Sample::from_events("s1", Instrument::Fcs, events(), Some("FL9")).unwrap_err();
        assert!(matches!(err, CrossizeError::Import(_)));
    }

    #[test]
    fn test_distribution_sample() {
        let dist =
            SizeDistribution::from_parallel(vec![50.0, 100.0, 150.0], vec![1.0, 2.0, 1.0]).unwrap();
        let sample = Sample::from_distribution("nta1", Instrument::Nta, dist).with_name("NTA run 1");
        assert_eq!(sample.name(), "NTA run 1");
        assert_eq!(sample.statistics().d50, Some(100.0));
        assert!(sample.channels().is_empty());
        assert_eq!(sample.size_values().len(), DEFAULT_EXPANSION_SIZE);
        assert!(sample.scatter("a", "b").is_err());
    }

    #[test]
    fn test_gated_size_values() {
        let sample = Sample::from_events("s1", Instrument::Fcs, events(), None).unwrap();
        let mut gates = GateSet::new();
        gates.add(Gate::new("low", GateShape::rectangle(0.0, 2.5, 0.0, 2.5), "FSC-A", "SSC-A").unwrap());
        // Channels this sample doesn't have
        gates.add(Gate::new("other", GateShape::rectangle(0.0, 1.0, 0.0, 1.0), "FL1", "FL2").unwrap());

        assert_eq!(
            sample.gated_size_values(&gates, GateCombine::All),
            Some(vec![80.0, 100.0])
        );
    }

    #[test]
    fn test_no_active_gate_means_ungated() {
        let sample = Sample::from_events("s1", Instrument::Fcs, events(), None).unwrap();
        assert_eq!(sample.gated_size_values(&GateSet::new(), GateCombine::All), None);
    }

    #[test]
    fn test_size_statistics_span() {
        let stats = SizeStatistics {
            count: 10,
            d10: Some(50.0),
            d50: Some(100.0),
            d90: Some(150.0),
            ..Default::default()
        };
        assert_eq!(stats.span(), Some(1.0));
    }
}
