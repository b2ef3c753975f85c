//! crossize-io - Import of instrument exports
//!
//! Readers for the two tabular exports crossize compares:
//!
//! - **FCS event tables**: one row per event, one column per channel
//! - **NTA size distributions**: a size column and a count/concentration column
//!
//! # Design
//!
//! Both readers go through [`csv_reader::CsvReader`]; the delimiter is picked
//! from the file extension (`.tsv` is tab separated, everything else comma).
//! Lines starting with `#` are treated as comments so files written by the
//! crossize exporter can be read back.

pub mod reader;
pub mod schema;

#[cfg(feature = "csv")]
pub mod csv_reader;

pub use reader::*;
pub use schema::*;

#[cfg(feature = "csv")]
pub use csv_reader::{read_event_table, read_size_distribution, CsvReader};

// Setup UniFFI when the feature is enabled
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
