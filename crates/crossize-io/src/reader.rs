//! Common reader types
//!
//! Errors and format detection shared by the tabular readers.

use std::path::Path;
use thiserror::Error;

/// Errors that can occur during I/O operations
#[derive(Debug, Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to open file: {0}")]
    OpenFailed(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Column not found: none of [{}] present", .candidates.join(", "))]
    ColumnNotFound { candidates: Vec<String> },

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("File contains no data rows: {0}")]
    Empty(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Io(e.to_string())
    }
}

/// Result type for I/O operations
pub type IoResult<T> = Result<T, IoError>;

/// Delimited text flavour, detected from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
}

impl TableFormat {
    /// Detect from the extension; `.tsv` and `.tab` are tab separated,
    /// anything else is treated as CSV
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "tsv" | "tab" => TableFormat::Tsv,
            _ => TableFormat::Csv,
        }
    }

    pub fn delimiter(&self) -> u8 {
        match self {
            TableFormat::Csv => b',',
            TableFormat::Tsv => b'\t',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TableFormat::Csv => "CSV",
            TableFormat::Tsv => "TSV",
        }
    }
}

/// List supported file extensions
pub fn supported_extensions() -> Vec<&'static str> {
    let mut extensions = Vec::new();

    #[cfg(feature = "csv")]
    {
        extensions.push("csv");
        extensions.push("tsv");
        extensions.push("tab");
        extensions.push("txt");
    }

    extensions
}
