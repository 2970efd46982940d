//! The remote control-plane boundary.
//!
//! [`AlertChannelApi`] is everything the reconciler needs from the remote
//! service. Implementations own transport concerns (connection pooling,
//! timeouts, authentication) and must be safe to share between concurrent
//! callers.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::kind::ChannelKind;
use crate::types::{ChannelPayload, ResponseEnvelope};

/// A remote call made by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiOperation {
    /// Create an integration.
    Create,
    /// Replace an integration.
    Update,
    /// Fetch an integration listing.
    Get,
    /// Delete an integration.
    Delete,
    /// Send a test notification through an integration.
    Test,
}

impl ApiOperation {
    /// Returns the operation as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Get => "get",
            Self::Delete => "delete",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failed remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The call that failed.
    pub operation: ApiOperation,
    /// HTTP status code, if the service answered.
    pub status: Option<u16>,
    /// Error description.
    pub message: String,
}

impl ApiError {
    /// Creates an error for `operation`.
    #[must_use]
    pub fn new(operation: ApiOperation, message: impl Into<String>) -> Self {
        Self {
            operation,
            status: None,
            message: message.into(),
        }
    }

    /// Sets the HTTP status code.
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns true if the service answered 404.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status, Some(404))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(
                f,
                "{} request failed (HTTP {status}): {}",
                self.operation, self.message
            ),
            None => write!(f, "{} request failed: {}", self.operation, self.message),
        }
    }
}

impl std::error::Error for ApiError {}

/// Result type for remote calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// The remote alert channel service.
pub trait AlertChannelApi: Send + Sync {
    /// Creates an integration and returns the server's response envelope.
    fn create<K: ChannelKind>(
        &self,
        payload: &ChannelPayload<K::Data>,
    ) -> impl Future<Output = ApiResult<ResponseEnvelope<K::Data>>> + Send;

    /// Replaces the integration `id` with `payload`.
    fn update<K: ChannelKind>(
        &self,
        id: &str,
        payload: &ChannelPayload<K::Data>,
    ) -> impl Future<Output = ApiResult<ResponseEnvelope<K::Data>>> + Send;

    /// Fetches the integration `id`.
    ///
    /// The envelope may hold any number of records, including a full
    /// listing of the channel type; callers scan it for `id`.
    fn get<K: ChannelKind>(
        &self,
        id: &str,
    ) -> impl Future<Output = ApiResult<ResponseEnvelope<K::Data>>> + Send;

    /// Deletes the integration `id`.
    fn delete(&self, id: &str) -> impl Future<Output = ApiResult<()>> + Send;

    /// Sends a test notification through the integration `id`.
    fn test(&self, id: &str) -> impl Future<Output = ApiResult<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_without_status() {
        let err = ApiError::new(ApiOperation::Create, "connection reset");
        assert_eq!(err.to_string(), "create request failed: connection reset");
        assert!(!err.is_not_found());
    }

    #[test]
    fn api_error_display_with_status() {
        let err = ApiError::new(ApiOperation::Get, "no such integration").with_status(404);
        assert_eq!(
            err.to_string(),
            "get request failed (HTTP 404): no such integration"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn operation_names() {
        let names: Vec<&str> = [
            ApiOperation::Create,
            ApiOperation::Update,
            ApiOperation::Get,
            ApiOperation::Delete,
            ApiOperation::Test,
        ]
        .iter()
        .map(ApiOperation::as_str)
        .collect();
        assert_eq!(names, ["create", "update", "get", "delete", "test"]);
    }
}
