//! Core error types for timekeep-core.
//!
//! This module defines the error hierarchy used across the library,
//! built on thiserror. The taxonomy mirrors how failures are handled:
//! owner errors are transient or rejections, persistence failure on
//! completion is surfaced but never fatal, side-effect failures are
//! logged by the engine and never reach this layer.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for timekeep-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Errors talking to the session owner
    #[error("Session owner error: {0}")]
    Owner(#[from] OwnerError),

    /// Failed to persist a completed session record.
    ///
    /// The engine still settles in `Idle` after this -- the record is
    /// lost (at-most-once), not retried.
    #[error("Failed to record completed session: {0}")]
    Persistence(#[source] OwnerError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the session owner (the remote authority holding timer state).
#[derive(Error, Debug)]
pub enum OwnerError {
    /// The owner could not be reached; retried on the next poll cycle.
    #[error("owner unreachable: {0}")]
    Unreachable(String),

    /// The owner rejected the request (e.g. start while already running).
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The owner answered with something we could not decode.
    #[error("unexpected owner response: {0}")]
    Protocol(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Config directory could not be resolved or created
    #[error("Failed to resolve data directory: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Value outside its allowed range
    #[error("Value {value} for '{field}' out of range ({min}..={max})")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
