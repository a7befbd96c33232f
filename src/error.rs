//! Error types for Helpdesk Assist.
//!
//! Validation and not-found conditions of the onboarding operations are
//! ordinary result data (see `onboarding::report`). Only the failures below
//! travel on the error channel.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Persistence errors. Any of these means the effect of the operation is
/// unconfirmed.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Knowledge file errors.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("Failed to read {file}: {source}")]
    Read {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Tool execution errors.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool {name} not found")]
    NotFound { name: String },

    #[error("Invalid parameters for tool {name}: {reason}")]
    InvalidParameters { name: String, reason: String },

    #[error("Tool {name} execution failed: {reason}")]
    ExecutionFailed { name: String, reason: String },

    #[error("Storage failure: {0}")]
    Storage(#[from] DatabaseError),

    #[error("Knowledge lookup failure: {0}")]
    Knowledge(#[from] KnowledgeError),
}
