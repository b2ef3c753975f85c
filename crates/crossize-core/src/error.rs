//! Error types for crossize-core
//!
//! Provides error handling for:
//! - Size distribution construction
//! - Sample import
//! - Export failures
//! - Settings loading and validation

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for crossize operations
#[derive(Error, Debug)]
pub enum CrossizeError {
    /// Size distribution errors
    #[error("Invalid size distribution: {0}")]
    Distribution(#[from] DistributionError),

    /// Export errors
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    /// Settings errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File import errors
    #[error("Import failed: {0}")]
    Import(#[from] crossize_io::IoError),

    /// Statistics errors
    #[error("Statistics error: {0}")]
    Stats(#[from] crossize_stats::StatsError),

    /// Gate errors
    #[error("Gate error: {0}")]
    Gate(#[from] crossize_gating::GateError),

    /// Operation needs per-event data but the sample is a distribution
    #[error("Sample {0} has no event data")]
    NotEventData(String),
}

/// Errors building a size distribution
#[derive(Error, Debug, PartialEq)]
pub enum DistributionError {
    #[error("bins and counts differ in length: {bins} bins, {counts} counts")]
    LengthMismatch { bins: usize, counts: usize },

    #[error("non-finite value at bin {index}")]
    NonFinite { index: usize },

    #[error("negative count {value} at bin {index}")]
    NegativeCount { index: usize, value: f64 },

    #[error("distribution has no bins")]
    Empty,
}

/// Errors related to export
#[derive(Error, Debug)]
pub enum ExportError {
    /// Could not create or write the output file
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding failed
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding failed
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O failure on an in-memory or already open writer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors loading or validating settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("No configuration directory on this platform")]
    NoConfigDir,

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

/// Result type alias for crossize operations
pub type CrossizeResult<T> = Result<T, CrossizeError>;

/// Result type alias for distribution construction
pub type DistributionResult<T> = Result<T, DistributionError>;

/// Result type alias for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type alias for settings
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_error_display() {
        let err = DistributionError::LengthMismatch { bins: 3, counts: 2 };
        assert_eq!(
            err.to_string(),
            "bins and counts differ in length: 3 bins, 2 counts"
        );
    }

    #[test]
    fn test_nested_error_display() {
        let err: CrossizeError = DistributionError::Empty.into();
        assert!(err.to_string().contains("no bins"));

        let err: CrossizeError = ConfigError::OutOfRange("alpha".into()).into();
        assert!(err.to_string().contains("alpha"));
    }

    #[test]
    fn test_io_error_converts() {
        let err: CrossizeError = crossize_io::IoError::FileNotFound("x.csv".into()).into();
        assert!(matches!(err, CrossizeError::Import(_)));
    }
}
