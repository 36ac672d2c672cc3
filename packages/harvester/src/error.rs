//! Error types for the harvester.
//!
//! The label ordering core never fails; everything that touches the network
//! or the file system reports through `HarvesterError`.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to download a card record.
    #[error("Failed to download card {id}: {source}")]
    Download {
        id: String,
        #[source]
        source: reqwest::Error,
    },

    /// Retryable failures persisted through every attempt.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required input file or directory does not exist.
    #[error("Missing input: {}", .0.display())]
    MissingInput(PathBuf),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The download worker pool could not be started.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl HarvesterError {
    /// Whether a later run may succeed where this one failed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RetriesExhausted { .. } => true,
            Self::Http(e) | Self::Download { source: e, .. } => {
                e.is_connect() || e.is_timeout() || e.status().is_some_and(|s| s.is_server_error())
            }
            _ => false,
        }
    }
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
