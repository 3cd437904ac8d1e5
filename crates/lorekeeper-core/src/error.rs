//! Core error types for lorekeeper-core.
//!
//! [`InsightError`] covers everything the insight pipeline can raise:
//! collaborator fetch failures, unparseable dates, unknown layer names,
//! and hierarchy records that break their own invariants. [`CoreError`]
//! wraps it together with the configuration and IO failures seen by the
//! CLI surface.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for lorekeeper-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Insight pipeline errors
    #[error("Insight error: {0}")]
    Insight(#[from] InsightError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Errors raised while computing a timeline insight.
#[derive(Error, Debug)]
pub enum InsightError {
    /// A collaborator store was unreachable or returned a malformed response.
    #[error("Data fetch failed during '{operation}': {message}")]
    DataFetch {
        operation: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A date string could not be parsed.
    #[error("Unparseable date: '{value}'")]
    DateParse { value: String },

    /// A layer name that is not part of the hierarchy.
    #[error("Unknown timeline layer: '{value}'")]
    UnknownLayer { value: String },

    /// A hierarchy record contradicts its own invariants.
    #[error("Invariant violated for node '{node_id}': {message}")]
    InvariantViolation { node_id: String, message: String },
}

impl InsightError {
    /// Build a [`InsightError::DataFetch`] without an underlying source.
    pub fn data_fetch(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataFetch {
            operation: operation.into(),
            message: message.into(),
            source: None,
        }
    }
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

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for InsightError {
    fn from(err: rusqlite::Error) -> Self {
        InsightError::DataFetch {
            operation: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Insight(err.into())
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
