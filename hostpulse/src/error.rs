//! Error types for the metrics client.
//!
//! None of these are fatal to the process: transport failures turn into a
//! status flag, malformed frames are dropped, and retrieval failures are shown
//! to the operator while the last good series stays on screen.

use thiserror::Error;

/// A single push payload (or retrieval body) that could not be decoded.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("malformed metrics payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unparseable timestamp {0:?}")]
    Timestamp(String),
}

/// Historical or current-snapshot retrieval failed.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Decode(#[from] SampleError),
}

/// Endpoint configuration could not be resolved.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid url {url:?}: {source}")]
    Url {
        url: String,
        source: url::ParseError,
    },
    #[error("unsupported scheme {0:?} (expected ws/wss for push, http/https for api)")]
    Scheme(String),
}
