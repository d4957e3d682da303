//! Error types for Summarist.

use thiserror::Error;

/// Library-level error type for Summarist operations.
#[derive(Error, Debug)]
pub enum SummaristError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Archive failed: {0}")]
    Archive(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("External tool timed out after {0} seconds")]
    Timeout(u64),
}

impl SummaristError {
    /// Whether this error should stop the whole run rather than a single item.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(self, SummaristError::Config(_))
    }
}

/// Result type alias for Summarist operations.
pub type Result<T> = std::result::Result<T, SummaristError>;
