//! Common error types for Avnu services

use thiserror::Error;

/// Common result type for Avnu operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error taxonomy across Avnu services
///
/// Notification delivery failure is deliberately not a variant here: delivery
/// is best-effort and reported through [`crate::retry::Delivery`] so callers
/// can tell an exhausted retry apart from a logic failure.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Acting user is not allowed to perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Backend unreachable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid user input, rejected before any database work
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Another mutually-exclusive operation is already in flight
    #[error("Busy: {0}")]
    Busy(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
