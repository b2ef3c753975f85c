//! crossize-stats - Statistical functions for instrument cross-validation
//!
//! This crate provides the numeric core used to compare particle-size
//! measurements from two instruments (flow cytometry and NTA):
//!
//! - **Summary**: mean, standard deviation, median, percentiles, tie-averaged ranks
//! - **ECDF**: Empirical Cumulative Distribution Function
//! - **Regression**: least-squares fit with R² for paired readings
//! - **KDE**: Gaussian kernel density estimation with Silverman bandwidth
//! - **Two-sample tests**: Kolmogorov-Smirnov, Mann-Whitney U, Cohen's d
//! - **Discrepancy**: symmetric percentage difference between paired values
//!
//! # Design Philosophy
//!
//! Every routine is a pure function over slices. Inputs that are too small to
//! support a computation produce sentinel results instead of errors, so callers
//! never have to guard against NaN leaking into a chart.

pub mod discrepancy;
pub mod ecdf;
pub mod error;
pub mod kde;
pub mod normal;
pub mod regression;
pub mod summary;
pub mod two_sample;

pub use discrepancy::*;
pub use ecdf::*;
pub use error::*;
pub use kde::*;
pub use normal::*;
pub use regression::*;
pub use summary::*;
pub use two_sample::*;

// Setup UniFFI when the feature is enabled
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
