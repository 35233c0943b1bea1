//! Errors raised by domain records when input or a state change is rejected.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Rejection of user input or of a state change on a domain record.
///
/// Lookups, ownership and storage failures are reported by the layers that
/// perform them, not here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or out-of-range input (empty title, bad email, ...).
    #[error("{0}")]
    Validation(String),

    /// Input is well-formed but the record's current state forbids the change
    /// (self-ban, returning an unclaimed item, ...).
    #[error("{0}")]
    InvariantViolation(String),

    /// An identifier did not parse.
    #[error("invalid id: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
