//! crossize-core - FCS / NTA particle-size cross-validation
//!
//! This crate ties the statistics, gating, and import crates together into
//! the model a host application drives:
//!
//! - **Sample**: imported FCS events or NTA size distributions with cached
//!   D10/D50/D90 statistics
//! - **State**: an explicit [`AppState`] changed only through [`reduce`]
//! - **Analysis**: the local two-sample comparison of the selected pair,
//!   memoized by [`AnalysisCache`]
//! - **Comparison**: the backend's cross-validation verdict
//! - **Settings**: TOML settings with environment overrides
//! - **Export**: CSV tables and JSON snapshots of a comparison
//!
//! # Data flow
//!
//! ```text
//! import -> Action::LoadSample -> reduce -> AppState
//!                                              |
//!                              AnalysisCache::refresh -> DistributionAnalysis -> export
//! ```
//!
//! The state revision only moves when an analysis input changes, so a host can
//! call [`AnalysisCache::refresh`] after every action without recomputing.

pub mod analysis;
pub mod comparison;
pub mod config;
pub mod distribution;
pub mod error;
pub mod export;
pub mod sample;
pub mod state;
pub mod telemetry;

pub use analysis::{paired_values, AnalysisCache, DistributionAnalysis};
pub use comparison::{ComparisonResult, MetricComparison, Verdict};
pub use config::{AnalysisSettings, BackendSettings, GatingSettings, Settings, BACKEND_URL_ENV};
pub use distribution::{SizeDistribution, DEFAULT_EXPANSION_SIZE};
pub use error::*;
pub use export::{ComparisonSnapshot, CsvExporter, ExportFormat, ExportMetadata};
pub use sample::{Instrument, Sample, SampleData, SizeStatistics};
pub use state::{reduce, reduce_all, Action, AppState, Notification, NotificationLevel};
pub use telemetry::init_tracing;

pub use crossize_gating as gating;
pub use crossize_io as io;
pub use crossize_stats as stats;

// Setup UniFFI when the feature is enabled
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
