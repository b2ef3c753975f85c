//! Result export
//!
//! Supports exporting comparisons to:
//! - CSV: paired discrepancies and size distributions, with a `# key: value`
//!   metadata header
//! - JSON: a full snapshot of one analysis

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crossize_stats::PairDiscrepancy;

use crate::analysis::DistributionAnalysis;
use crate::comparison::ComparisonResult;
use crate::config::AnalysisSettings;
use crate::distribution::SizeDistribution;
use crate::error::{ExportError, ExportResult};

/// Export file format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// Get MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }

    /// Get suggested filename based on format
    pub fn suggested_filename(&self, base: &str) -> String {
        format!("{}.{}", base, self.extension())
    }
}

/// Comment lines written above a CSV table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportMetadata {
    entries: Vec<(String, String)>,
}

impl ExportMetadata {
    /// Metadata stamped with the generator and time
    pub fn new() -> Self {
        Self::default()
            .with("generator", format!("crossize {}", env!("CARGO_PKG_VERSION")))
            .with("exported_at", Utc::now().to_rfc3339())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.entries.push((key.into(), value.to_string()));
        self
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for (key, value) in &self.entries {
            // Keep each entry on one comment line
            let value = value.replace(['\r', '\n'], " ");
            writeln!(writer, "# {key}: {value}")?;
        }
        Ok(())
    }
}

/// Export tables to CSV
#[derive(Clone, Debug)]
pub struct CsvExporter {
    /// Column delimiter
    pub delimiter: u8,

    /// Lines written before the header row
    pub metadata: ExportMetadata,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            delimiter: b',',
            metadata: ExportMetadata::new(),
        }
    }
}

impl CsvExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_metadata(mut self, metadata: ExportMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    fn table<W: Write>(
        &self,
        mut writer: W,
        header: &[&str],
        rows: impl IntoIterator<Item = Vec<String>>,
    ) -> ExportResult<()> {
        self.metadata.write_to(&mut writer)?;
        let mut csv = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);
        csv.write_record(header)?;
        for row in rows {
            csv.write_record(&row)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write paired discrepancies; undefined discrepancies are left blank
    pub fn write_discrepancies<W: Write>(
        &self,
        writer: W,
        pairs: &[PairDiscrepancy],
    ) -> ExportResult<()> {
        self.table(
            writer,
            &["index", "fcs", "nta", "discrepancy_percent"],
            pairs.iter().map(|p| {
                vec![
                    p.index.to_string(),
                    p.fcs.to_string(),
                    p.nta.to_string(),
                    p.percent.map(|d| format!("{d:.4}")).unwrap_or_default(),
                ]
            }),
        )
    }

    /// Write a size distribution with its normalized counts
    pub fn write_distribution<W: Write>(
        &self,
        writer: W,
        distribution: &SizeDistribution,
    ) -> ExportResult<()> {
        let normalized = distribution.normalized_counts();
        self.table(
            writer,
            &["size_nm", "count", "normalized"],
            distribution
                .pairs()
                .zip(normalized)
                .map(|((size, count), norm)| {
                    vec![size.to_string(), count.to_string(), format!("{norm:.6}")]
                }),
        )
    }

    /// Write discrepancies to a file
    pub fn export_discrepancies(
        &self,
        path: impl AsRef<Path>,
        pairs: &[PairDiscrepancy],
    ) -> ExportResult<()> {
        let path = path.as_ref();
        self.write_discrepancies(create(path)?, pairs)?;
        tracing::debug!(path = %path.display(), rows = pairs.len(), "Exported discrepancies");
        Ok(())
    }

    /// Write a distribution to a file
    pub fn export_distribution(
        &self,
        path: impl AsRef<Path>,
        distribution: &SizeDistribution,
    ) -> ExportResult<()> {
        let path = path.as_ref();
        self.write_distribution(create(path)?, distribution)?;
        tracing::debug!(path = %path.display(), bins = distribution.len(), "Exported distribution");
        Ok(())
    }
}

fn create(path: &Path) -> ExportResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Everything needed to reproduce one comparison, for JSON export
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSnapshot {
    pub generated_at: DateTime<Utc>,
    pub software_version: String,
    pub settings: AnalysisSettings,
    pub analysis: DistributionAnalysis,
    /// Backend verdict for the same pair, if one was loaded
    pub backend: Option<ComparisonResult>,
}

impl ComparisonSnapshot {
    /// Snapshot an analysis; a backend result for a different pair is dropped
    pub fn new(
        analysis: DistributionAnalysis,
        settings: AnalysisSettings,
        backend: Option<ComparisonResult>,
    ) -> Self {
        let backend = backend
            .filter(|b| b.matches(&analysis.fcs_sample_id, &analysis.nta_sample_id));
        Self {
            generated_at: Utc::now(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            settings,
            analysis,
            backend,
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> ExportResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write pretty JSON to a file
    pub fn write_json(&self, path: impl AsRef<Path>) -> ExportResult<()> {
        let path = path.as_ref();
        let mut writer = create(path)?;
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        tracing::debug!(path = %path.display(), "Exported comparison snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossize_stats::paired_discrepancies;

    fn exporter() -> CsvExporter {
        CsvExporter::new().with_metadata(ExportMetadata::default().with("fcs_sample", "F-01"))
    }

    #[test]
    fn test_export_format() {
        assert_eq!(ExportFormat::Csv.suggested_filename("run"), "run.csv");
        assert_eq!(ExportFormat::Json.mime_type(), "application/json");
    }

    #[test]
    fn test_discrepancy_csv() {
        let pairs = paired_discrepancies(&[10.0, 20.0, 0.0], &[12.0, 22.0, 0.0]);
        let mut out = Vec::new();
        exporter().write_discrepancies(&mut out, &pairs).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "# fcs_sample: F-01");
        assert_eq!(lines[1], "index,fcs,nta,discrepancy_percent");
        assert_eq!(lines[2], "0,10,12,18.1818");
        assert_eq!(lines[3], "1,20,22,9.5238");
        assert_eq!(lines[4], "2,0,0,");
    }

    #[test]
    fn test_distribution_csv_tab_delimited() {
        let dist = SizeDistribution::from_parallel(vec![50.0, 100.0], vec![2.0, 4.0]).unwrap();
        let mut out = Vec::new();
        exporter()
            .with_delimiter(b'\t')
            .write_distribution(&mut out, &dist)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("size_nm\tcount\tnormalized\n"));
        assert!(text.contains("50\t2\t0.500000\n"));
        assert!(text.contains("100\t4\t1.000000\n"));
    }

    #[test]
    fn test_metadata_newlines_flattened() {
        let meta = ExportMetadata::default().with("note", "line one\nline two");
        let mut out = Vec::new();
        meta.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "# note: line one line two\n");
    }

    #[test]
    fn test_default_metadata_has_timestamp() {
        let meta = ExportMetadata::new();
        assert!(meta.entries().iter().any(|(k, _)| k == "exported_at"));
    }
}
