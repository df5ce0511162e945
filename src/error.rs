// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Result type used across the crate.
pub type Result<T, E = DitongError> = std::result::Result<T, E>;

/// Everything that can fail in a build run.
///
/// Words that fail normalization or fall outside the configured length range
/// are not errors; they are counted and dropped by the ingestors and builders.
#[derive(Debug, Error)]
pub enum DitongError {
    /// Bad lengths, empty or unsafe names, unsupported language for an adapter.
    /// Raised before any output is written.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown ingestor '{name}'. Available: {available}")]
    UnknownIngestor { name: String, available: String },

    #[error("Unknown transcriber '{name}'. Available: {available}")]
    UnknownTranscriber { name: String, available: String },

    /// A persisted file that loads as JSON but breaks a model invariant.
    #[error("Invalid format in {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Bincode(#[from] bincode::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl DitongError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv { path: path.into(), source }
    }

    pub(crate) fn invalid_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat { path: path.into(), reason: reason.into() }
    }
}
