//! Error types for the explorer

use thiserror::Error;

/// Errors surfaced by collections, objects and the transport
#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Index {index} out of range for collection of length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("Pagination stopped at {buffered} documents before reaching index {index}")]
    Integrity { index: usize, buffered: usize },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sumo returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Cannot aggregate an empty collection")]
    EmptyAggregation,

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ExplorerError {
    /// Get the error type as a string for metrics labeling
    pub fn error_type(&self) -> &'static str {
        match self {
            ExplorerError::Config(_) => "config",
            ExplorerError::OutOfRange { .. } => "out_of_range",
            ExplorerError::Integrity { .. } => "integrity",
            ExplorerError::Upstream(_) => "upstream",
            ExplorerError::Http(_) => "http",
            ExplorerError::Status { .. } => "status",
            ExplorerError::MalformedResponse(_) => "malformed_response",
            ExplorerError::Decode(_) => "decode",
            ExplorerError::EmptyAggregation => "empty_aggregation",
            ExplorerError::NotFound(_) => "not_found",
        }
    }

    /// Indexing failures: past the known length, or the cursor ran dry early.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            ExplorerError::OutOfRange { .. } | ExplorerError::Integrity { .. }
        )
    }

    /// Failures originating in the transport or the remote service.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ExplorerError::Upstream(_)
                | ExplorerError::Http(_)
                | ExplorerError::Status { .. }
                | ExplorerError::MalformedResponse(_)
        )
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        ExplorerError::MalformedResponse(err.to_string())
    }
}

impl From<toml::de::Error> for ExplorerError {
    fn from(err: toml::de::Error) -> Self {
        ExplorerError::Config(err.to_string())
    }
}

impl From<zip::result::ZipError> for ExplorerError {
    fn from(err: zip::result::ZipError) -> Self {
        ExplorerError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
