//! Error types for the fitxp_core library.
//!
//! The scoring engine itself never fails: malformed input degrades to a
//! zero contribution. These errors come from the file-backed stores,
//! configuration and catalog loading.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fitxp_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Profile state error
    #[error("State error: {0}")]
    State(String),

    /// Referenced exercise or food is missing from the catalog
    #[error("Unknown {kind} id: {id}")]
    UnknownId { kind: &'static str, id: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}
