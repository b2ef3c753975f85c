//! Delimited-text reader for event tables and size distributions

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::reader::{IoError, IoResult, TableFormat};
use crate::schema::{
    find_column, EventTable, SizeTable, COUNT_COLUMN_CANDIDATES, SIZE_COLUMN_CANDIDATES,
};

/// CSV/TSV file reader
pub struct CsvReader {
    path: PathBuf,
    format: TableFormat,
}

impl CsvReader {
    /// Open a file, picking the delimiter from its extension
    pub fn open(path: impl AsRef<Path>) -> IoResult<Self> {
        let path = path.as_ref();
        Self::open_with_format(path, TableFormat::from_path(path))
    }

    /// Open a file with an explicit format
    pub fn open_with_format(path: impl AsRef<Path>, format: TableFormat) -> IoResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IoError::FileNotFound(path.display().to_string()));
        }
        Ok(Self {
            path: path.to_path_buf(),
            format,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    fn csv_reader(&self) -> IoResult<csv::Reader<BufReader<File>>> {
        let file = File::open(&self.path).map_err(|e| IoError::OpenFailed(e.to_string()))?;
        Ok(csv::ReaderBuilder::new()
            .delimiter(self.format.delimiter())
            .has_headers(true)
            .comment(Some(b'#'))
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file)))
    }

    fn read_rows(&self) -> IoResult<(Vec<String>, Vec<csv::StringRecord>)> {
        let mut reader = self.csv_reader()?;
        let headers = reader
            .headers()
            .map_err(|e| IoError::InvalidFormat(e.to_string()))?
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();

        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| IoError::InvalidFormat(e.to_string()))?;

        if rows.is_empty() {
            return Err(IoError::Empty(self.path.display().to_string()));
        }
        Ok((headers, rows))
    }

    /// Read every column as a numeric channel
    ///
    /// Cells that are empty or not numbers become NaN, as do cells missing
    /// from short rows.
    pub fn read_event_table(&self) -> IoResult<EventTable> {
        let (headers, rows) = self.read_rows()?;
        let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(rows.len()); headers.len()];
        let mut unparsed = 0usize;

        for record in &rows {
            for (j, column) in columns.iter_mut().enumerate() {
                let value = record.get(j).map_or(f64::NAN, parse_number);
                if value.is_nan() {
                    unparsed += 1;
                }
                column.push(value);
            }
        }

        if unparsed > 0 {
            tracing::warn!(
                path = %self.path.display(),
                cells = unparsed,
                "Non-numeric cells read as NaN"
            );
        }
        tracing::debug!(
            path = %self.path.display(),
            channels = headers.len(),
            events = rows.len(),
            "Read event table"
        );

        EventTable::new(headers, columns)
    }

    /// Read the size and count columns of an NTA export
    ///
    /// Rows where either value is missing or not finite are skipped.
    pub fn read_size_table(&self) -> IoResult<SizeTable> {
        let (headers, rows) = self.read_rows()?;
        let size_idx = find_column(&headers, SIZE_COLUMN_CANDIDATES).ok_or_else(|| {
            IoError::ColumnNotFound {
                candidates: SIZE_COLUMN_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            }
        })?;
        let count_idx = find_column(&headers, COUNT_COLUMN_CANDIDATES).ok_or_else(|| {
            IoError::ColumnNotFound {
                candidates: COUNT_COLUMN_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            }
        })?;

        let mut table = SizeTable {
            size_column: headers[size_idx].clone(),
            count_column: headers[count_idx].clone(),
            ..Default::default()
        };
        let mut skipped = 0usize;

        for record in &rows {
            let size = record.get(size_idx).map_or(f64::NAN, parse_number);
            let count = record.get(count_idx).map_or(f64::NAN, parse_number);
            if size.is_finite() && count.is_finite() {
                table.sizes.push(size);
                table.counts.push(count);
            } else {
                skipped += 1;
            }
        }

        if skipped > 0 {
            tracing::warn!(path = %self.path.display(), rows = skipped, "Skipped unparseable size rows");
        }
        if table.is_empty() {
            return Err(IoError::Empty(self.path.display().to_string()));
        }
        Ok(table)
    }
}

/// Read an FCS event table export
pub fn read_event_table(path: impl AsRef<Path>) -> IoResult<EventTable> {
    CsvReader::open(path)?.read_event_table()
}

/// Read an NTA size distribution export
pub fn read_size_distribution(path: impl AsRef<Path>) -> IoResult<SizeTable> {
    CsvReader::open(path)?.read_size_table()
}

fn parse_number(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}
