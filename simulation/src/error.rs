//! Simulation error types

use thiserror::Error;

use multicopy_core::{ContactError, IdentityError, MessageError, StoreError};
use multicopy_dtn::{AllocatorError, ConfigError};

/// Errors raised while driving a simulation
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Router error: {0}")]
    Allocator(#[from] AllocatorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("Contact error: {0}")]
    Contact(#[from] ContactError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Message {id} already exists at {host}")]
    DuplicateMessage { id: String, host: String },

    #[error("Invalid trace: {0}")]
    InvalidTrace(String),

    #[error("Trace error: {0}")]
    Trace(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for simulation operations
pub type SimResult<T> = Result<T, SimError>;
