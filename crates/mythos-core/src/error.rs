//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
///
/// Crate-specific errors convert into this type at application boundaries
/// so the transport layer maps a single enum to status codes.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A session was not found.
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    /// The request is valid but not allowed in the current session state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// The narrative generator failed or timed out.
    #[error("narrator error: {0}")]
    Narrator(String),

    /// An infrastructure error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
