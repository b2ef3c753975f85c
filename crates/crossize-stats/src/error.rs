//! Error types for crossize-stats

use thiserror::Error;

/// Errors raised when statistical parameters are invalid
#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    #[error("Significance level must be in (0, 1), got {0}")]
    InvalidAlpha(f64),

    #[error("KDE needs at least 2 evaluation points, got {0}")]
    TooFewPoints(usize),
}

/// Result type for statistics operations
pub type StatsResult<T> = Result<T, StatsError>;
