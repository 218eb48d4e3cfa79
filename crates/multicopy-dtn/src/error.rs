//! Router-specific error types

use thiserror::Error;

use multicopy_core::{ContactError, MessageError};

/// Errors that can occur while running the copy allocator
///
/// Policy rejections (stale contact, too few copies) are not errors; they
/// are reported through [`ReceiveOutcome`](crate::ReceiveOutcome).
#[derive(Debug, Error)]
pub enum AllocatorError {
    /// A transfer arrived over a contact that does not exist
    #[error("No contact between {local} and {peer} for this transfer")]
    NoContact { local: String, peer: String },

    /// A transfer arrived over a contact that is currently down
    #[error("Contact between {local} and {peer} is down")]
    ContactDown { local: String, peer: String },

    /// Contact registry errors
    #[error("Contact error: {0}")]
    Contact(#[from] ContactError),

    /// Message construction errors
    #[error("Message error: {0}")]
    Message(#[from] MessageError),
}

impl AllocatorError {
    /// Whether this error signals a simulation consistency bug
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            AllocatorError::NoContact { .. } | AllocatorError::ContactDown { .. }
        )
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting could not be parsed
    #[error("Invalid value for setting {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    /// The configuration failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for allocator operations
pub type AllocatorResult<T> = Result<T, AllocatorError>;
