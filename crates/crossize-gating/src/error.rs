//! Gating errors

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by gate management and shape construction
#[derive(Debug, Error, PartialEq)]
pub enum GateError {
    #[error("Gate not found: {0}")]
    NotFound(Uuid),

    #[error("Polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("Invalid shape geometry: {0}")]
    InvalidGeometry(String),

    #[error("Gate name must not be empty")]
    EmptyName,
}

/// Result type for gating operations
pub type GateResult<T> = Result<T, GateError>;
