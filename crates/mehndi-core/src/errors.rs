//! Error types for catalog retrieval and configuration
//!
//! Failures are split by how far they travel. A [`Rejection`] concerns a single
//! source row and never leaves the normalizer's caller. A [`FetchError`] fails a
//! whole retrieval and is surfaced to the view through the `error` phase, so it
//! is `Clone` and carries a human-readable cause. [`CatalogError`] is the
//! umbrella type for setup paths (configuration, client construction).

use thiserror::Error;

/// A retrieval attempt that produced no usable record list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Malformed payload: {0}")]
    Payload(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// HTTP status carried by the failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Why a raw row could not be turned into a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("malformed URL in '{field}': {value}")]
    MalformedUrl { field: &'static str, value: String },
}

#[derive(Error, Debug, Clone)]
pub enum CatalogError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err.to_string())
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(err: serde_yaml::Error) -> Self {
        CatalogError::Config(format!("Failed to parse YAML config: {}", err))
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        CatalogError::Fetch(FetchError::Transport {
            url,
            message: err.to_string(),
        })
    }
}
