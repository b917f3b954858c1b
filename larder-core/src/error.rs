//! Error types shared across the core library.

use thiserror::Error;

/// Errors surfaced by the backend API, push channel, and assistant ports.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("server returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("push channel error: {0}")]
    Channel(String),

    #[error("assistant error: {0}")]
    Assistant(String),

    #[error("{0}")]
    Invalid(String),
}

impl ApiError {
    /// Wrap a reqwest transport failure.
    pub fn request(e: reqwest::Error) -> Self {
        ApiError::Request(e.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
