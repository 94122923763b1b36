use thiserror::Error;

use crate::store::{EntityId, EntityKind};

/// Top-level error type for the wall joinery engine.
#[derive(Debug, Error)]
pub enum JoineryError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),

    #[error("entity not found: {0:?}")]
    NotFound(EntityId),

    #[error("entity {id:?} is a {actual}, expected a {expected}")]
    WrongKind {
        id: EntityId,
        expected: EntityKind,
        actual: EntityKind,
    },

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors raised when authored geometry fails validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("zero-length wall")]
    ZeroLength,

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} is not finite")]
    NonFinite { field: &'static str },
}

/// Errors related to store and engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("end_batch called without a matching begin_batch")]
    NoBatch,
}

/// Raised when corner trims compete for more length than a wall has.
///
/// This is a warning, not a failure: the wall is still updated with clamped
/// values and the rest of the scene resolves normally.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "degenerate joinery on wall {wall:?}: requested trims {requested_start} + {requested_end} \
     exceed authored length {authored_length}, clamped to {actual_length}"
)]
pub struct DegenerateJoinery {
    pub wall: EntityId,
    pub authored_length: f64,
    pub requested_start: f64,
    pub requested_end: f64,
    pub actual_length: f64,
}

/// Convenience type alias for results using [`JoineryError`].
pub type Result<T> = std::result::Result<T, JoineryError>;
