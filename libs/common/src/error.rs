//! Custom error types for the common library
//!
//! This module defines the errors raised by the managed infrastructure the
//! services talk to: the key-value store and the notification channel.

use thiserror::Error;

/// Custom error type for key-value store operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// A request to the store failed (network, throttling, missing table...)
    #[error("Database request error: {0}")]
    Request(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Custom error type for the notification channel
#[derive(Error, Debug)]
pub enum NotificationError {
    /// Configuration error
    #[error("Notification configuration error: {0}")]
    Configuration(String),

    /// Publishing a message failed
    #[error("Notification publish error: {0}")]
    Publish(String),
}
