//! Error types for FounderWiki.
//!
//! Library crates use [`FounderWikiError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all FounderWiki operations.
#[derive(Debug, thiserror::Error)]
pub enum FounderWikiError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to the Wikipedia API.
    #[error("network error: {0}")]
    Network(String),

    /// The requested Wikipedia page does not exist.
    #[error("page not found: {title}")]
    PageNotFound { title: String },

    /// The title resolves to a disambiguation page listing multiple subjects.
    #[error("disambiguation page: {title}")]
    Disambiguation { title: String },

    /// LLM call error (transport, API, or missing completion content).
    #[error("llm error: {0}")]
    Llm(String),

    /// Tracker or result-store persistence error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Structured-output parsing error (malformed extraction JSON, bad CSV row).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Data validation error (empty input set, invalid URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FounderWikiError>;

impl FounderWikiError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
