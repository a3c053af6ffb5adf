//! Error types for Chatstore

use axum::http::StatusCode;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// API error
    #[error("API error: {0}")]
    Api(String),

    /// Store persistence error
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for Core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Failures that end a single request early.
///
/// Nothing here outlives the request that produced it; each variant maps to
/// exactly one status code and an empty body.
#[derive(Error, Debug)]
pub enum RequestError {
    /// Path does not contain the messages route
    #[error("no route for {0}")]
    RouteNotFound(String),

    /// POST body is not a JSON object
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The store could not persist the append
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] CoreError),
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            RequestError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            RequestError::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
