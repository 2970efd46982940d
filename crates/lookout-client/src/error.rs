//! Error types for lookout-client.

use thiserror::Error;

/// Errors that can occur while configuring the HTTP transport.
///
/// Failures of individual remote calls are reported as
/// [`ApiError`](lookout_channels::ApiError) instead, so the reconciler can
/// handle them uniformly across transports.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The base URL could not be parsed.
    #[error("invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for lookout-client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
