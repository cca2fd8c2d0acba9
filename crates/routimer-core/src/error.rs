//! Core error types for routimer-core.
//!
//! Nothing in the engine is fatal to the process: engine operations return
//! these errors after logging them, and best-effort IO paths swallow them.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for routimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Timer engine errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Key-value store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

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

/// Errors returned by timer engine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Start or recovery targeted a group id that is not in the catalog.
    #[error("No group with id '{group_id}'")]
    InvalidGroupReference { group_id: String },

    /// The group exists but has nothing to run.
    #[error("Group '{group_id}' has no tasks")]
    EmptyGroup { group_id: String },

    /// A stored checkpoint does not match the catalog.
    #[error("Checkpoint discarded: {reason}")]
    CorruptCheckpoint { reason: String },

    /// Pause or skip was requested with no routine running.
    #[error("No routine is running")]
    NoActiveRun,
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// Data directory could not be prepared
    #[error("Data directory unavailable: {0}")]
    DataDir(#[from] std::io::Error),
}

/// Errors reported by the platform bridge. The engine logs and ignores them.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The platform has no such capability
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    /// The platform call failed
    #[error("Platform call failed: {0}")]
    Failed(String),
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors raised by the group builder contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Too many items
    #[error("{collection} holds {len} items (maximum {max})")]
    TooMany {
        collection: String,
        len: usize,
        max: usize,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg)
                if inner.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StoreError::Locked
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    fn require_run(active: bool) -> Result<()> {
        if !active {
            return Err(EngineError::NoActiveRun.into());
        }
        Ok(())
    }

    #[test]
    fn domain_errors_convert_into_core_error() {
        let err = require_run(false).unwrap_err();
        assert!(matches!(err, CoreError::Engine(EngineError::NoActiveRun)));
        assert_eq!(err.to_string(), "Engine error: No routine is running");
        assert!(require_run(true).is_ok());
    }

    #[test]
    fn locked_database_maps_to_store_locked() {
        let sqlite = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            None,
        );
        let err: CoreError = StoreError::from(sqlite).into();
        assert!(matches!(err, CoreError::Store(StoreError::Locked)));
    }
}
