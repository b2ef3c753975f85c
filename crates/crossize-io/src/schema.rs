//! In-memory tables produced by the readers

use serde::{Deserialize, Serialize};

use crate::reader::{IoError, IoResult};

/// Header names accepted for the particle size column, lowercase
pub const SIZE_COLUMN_CANDIDATES: &[&str] = &[
    "size",
    "size_nm",
    "size (nm)",
    "size/nm",
    "bin_center",
    "bin centre (nm)",
    "bin center (nm)",
    "diameter",
    "diameter_nm",
    "diameter (nm)",
    "particle size",
];

/// Header names accepted for the count column, lowercase
pub const COUNT_COLUMN_CANDIDATES: &[&str] = &[
    "count",
    "counts",
    "number",
    "frequency",
    "concentration",
    "concentration (particles / ml)",
    "concentration (particles/ml)",
    "particles",
    "particles/ml",
];

/// Find the first header matching one of `candidates`, ignoring case and
/// surrounding whitespace
pub fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    candidates
        .iter()
        .find_map(|c| normalized.iter().position(|h| h == c))
}

/// Per-event channel measurements, stored column-wise
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTable {
    /// Channel names in file order
    pub channels: Vec<String>,

    /// One vector per channel, all of length `num_events`
    pub columns: Vec<Vec<f64>>,
}

impl EventTable {
    /// Build from channel names and columns of equal length
    pub fn new(channels: Vec<String>, columns: Vec<Vec<f64>>) -> IoResult<Self> {
        if channels.len() != columns.len() {
            return Err(IoError::InvalidFormat(format!(
                "{} channel names for {} columns",
                channels.len(),
                columns.len()
            )));
        }
        if let Some(first) = columns.first() {
            if columns.iter().any(|c| c.len() != first.len()) {
                return Err(IoError::InvalidFormat(
                    "channel columns differ in length".to_string(),
                ));
            }
        }
        Ok(Self { channels, columns })
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_events(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.num_events() == 0
    }

    /// Column index of a channel, matched case-insensitively
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name.trim()))
    }

    /// Values for one channel
    pub fn channel(&self, name: &str) -> IoResult<&[f64]> {
        self.channel_index(name)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| IoError::ChannelNotFound(name.to_string()))
    }

    /// (x, y) pairs for a scatter of two channels
    pub fn scatter(&self, x_channel: &str, y_channel: &str) -> IoResult<Vec<(f64, f64)>> {
        let xs = self.channel(x_channel)?;
        let ys = self.channel(y_channel)?;
        Ok(xs.iter().copied().zip(ys.iter().copied()).collect())
    }
}

/// Size distribution read from an NTA export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeTable {
    /// Header the sizes were read from
    pub size_column: String,

    /// Header the counts were read from
    pub count_column: String,

    /// Bin sizes in nm
    pub sizes: Vec<f64>,

    /// Counts or concentrations, same length as `sizes`
    pub counts: Vec<f64>,
}

impl SizeTable {
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_column_case_insensitive() {
        let h = headers(&["Sample", " Size (nm) ", "Concentration (particles / ml)"]);
        assert_eq!(find_column(&h, SIZE_COLUMN_CANDIDATES), Some(1));
        assert_eq!(find_column(&h, COUNT_COLUMN_CANDIDATES), Some(2));
        assert_eq!(find_column(&h, &["missing"]), None);
    }

    #[test]
    fn test_candidate_order_wins() {
        // "size" is listed before "diameter"
        let h = headers(&["Diameter", "Size"]);
        assert_eq!(find_column(&h, SIZE_COLUMN_CANDIDATES), Some(1));
    }

    #[test]
    fn test_event_table_channels() {
        let table = EventTable::new(
            headers(&["FSC-A", "SSC-A"]),
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        )
        .unwrap();
        assert_eq!(table.num_events(), 2);
        assert_eq!(table.channel("ssc-a").unwrap(), &[3.0, 4.0]);
        assert_eq!(table.scatter("FSC-A", "SSC-A").unwrap(), vec![(1.0, 3.0), (2.0, 4.0)]);
        assert!(matches!(
            table.channel("FL1-A"),
            Err(IoError::ChannelNotFound(_))
        ));
    }

    #[test]
    fn test_event_table_rejects_ragged_columns() {
        let result = EventTable::new(headers(&["a", "b"]), vec![vec![1.0], vec![1.0, 2.0]]);
        assert!(result.is_err());
    }
}
