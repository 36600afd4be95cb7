//! Error types for the sauna_core library.

use crate::session::TimerStatus;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for sauna_core operations
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

    /// A protocol that cannot be run (no stages, zero cycles, ...)
    #[error("Invalid protocol: {0}")]
    InvalidProtocol(String),

    /// Session timer action attempted from a state that does not allow it
    #[error("Cannot {action} while timer is {status:?}")]
    InvalidTransition {
        action: &'static str,
        status: TimerStatus,
    },

    /// Navigation attempted from the wrong screen
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// Suggestion provider failed or returned an unusable suggestion
    #[error("Suggestion error: {0}")]
    Suggestion(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
