//! Error types for heapstore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using HeapError
pub type Result<T> = std::result::Result<T, HeapError>;

/// Unified error type for heapstore operations
#[derive(Debug, Error)]
pub enum HeapError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Schema Errors
    // -------------------------------------------------------------------------
    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Expected {expected} field values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("Field '{field}' is {len} bytes long (max {max})")]
    FieldTooLong { field: String, len: usize, max: usize },

    #[error("Field '{field}' value {value} does not fit in a 32-bit integer")]
    FieldOverflow { field: String, value: String },

    #[error("Field '{field}' expects a value of type {expected}")]
    TypeMismatch { field: String, expected: String },

    #[error("Primary key {0} already exists")]
    DuplicateKey(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Allocator invariant violated: {0}")]
    AllocatorInvariantViolation(String),

    #[error("Corrupted storage: {0}")]
    Corrupted(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error("Command error: {0}")]
    Command(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Timed out waiting for lock on table '{0}'")]
    LockTimeout(String),
}

impl From<bincode::Error> for HeapError {
    fn from(err: bincode::Error) -> Self {
        HeapError::Serialization(err.to_string())
    }
}
