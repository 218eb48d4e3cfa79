//! Error types for the multicopy stack

use thiserror::Error;

/// Errors related to host identity
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Host identity must not be empty")]
    Empty,

    #[error("Invalid host identity: {0:?}")]
    InvalidFormat(String),

    #[error("Unknown host: {0}")]
    UnknownHost(String),
}

/// Errors related to message construction
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Message id must not be empty")]
    EmptyId,

    #[error("Message {0} has no destinations")]
    NoDestinations(String),
}

/// Errors related to contacts
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("A host cannot be in contact with itself: {0}")]
    SelfContact(String),

    #[error("No contact between {a} and {b}")]
    NotFound { a: String, b: String },
}

/// Errors related to message stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Message not found: {0}")]
    MessageNotFound(String),
}
