//! Error types for the relevance search compiler.
//!
//! Every failure surfaced here is a synchronous compile-time error: the
//! compiler performs no I/O while building a query, so nothing is retried.
//! Configuration problems are separated from the search operation itself so
//! that callers can validate configuration once at startup.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for search compilation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// Invalid matcher, model or loader configuration.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The requested row limit cannot produce any rows.
    #[error("search limit must be greater than zero")]
    InvalidLimit,

    /// The threshold cannot be rendered as an SQL number.
    #[error("search threshold must be a finite number, got {threshold}")]
    InvalidThreshold { threshold: f64 },
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A configured matcher name does not exist in the matcher library.
    #[error("unknown matcher: {name}")]
    UnknownMatcher { name: String },

    /// Matcher and column weights must be non-negative.
    #[error("negative weight {weight} for '{name}'")]
    NegativeWeight { name: String, weight: f64 },

    /// A join is missing its key pair or carries an unusable refinement.
    #[error("invalid join spec for table '{table}': {message}")]
    InvalidJoin { table: String, message: String },

    /// A searchable column name cannot be rendered as an identifier.
    #[error("invalid column: '{column}'")]
    InvalidColumn { column: String },

    /// A mutation is not a plain SQL function name.
    #[error("invalid mutation '{function}' for column '{column}'")]
    InvalidMutation { column: String, function: String },

    /// The token cap must allow at least one token.
    #[error("maxWords must be greater than zero")]
    InvalidMaxWords,

    /// The configuration document could not be parsed.
    #[error("failed to parse configuration: {message}")]
    Parse { message: String },

    /// The configuration file could not be read.
    #[error("failed to read configuration from {path}: {message}")]
    Io { path: String, message: String },
}

/// Result type alias for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// Result type alias for configuration loading and validation.
pub type ConfigResult<T> = Result<T, ConfigurationError>;

impl From<serde_json::Error> for ConfigurationError {
    fn from(err: serde_json::Error) -> Self {
        ConfigurationError::Parse {
            message: err.to_string(),
        }
    }
}
