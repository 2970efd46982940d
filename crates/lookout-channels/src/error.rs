//! Error types for the lookout-channels crate.

use thiserror::Error;

use crate::api::ApiError;
use crate::rollback::RollbackOutcome;
use crate::types::ChannelType;
use crate::validator::EnvelopeViolation;

/// Errors that can occur while reconciling an alert channel integration.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// A declared enumerated field holds a value outside its allow-list.
    ///
    /// Raised by the payload translator, before any remote call is made.
    #[error("{field}: can only be either {allowed}, got '{value}'")]
    Validation {
        /// The offending field.
        field: String,
        /// The rejected value.
        value: String,
        /// Human-readable rendering of the allowed set.
        allowed: String,
    },

    /// The remote service or the network failed a create, update, read or
    /// delete call.
    #[error("transport error: {0}")]
    Transport(#[from] ApiError),

    /// A create or update response did not carry exactly one integration.
    #[error("{violation}")]
    ProtocolInvariant {
        /// What was wrong with the response envelope.
        violation: EnvelopeViolation,
    },

    /// The post-mutation delivery test failed.
    ///
    /// The primary failure is always the test error; `rollback` records what
    /// happened to the integration afterwards.
    #[error("{channel} integration {id} ({name}) failed its delivery test: {source}; {rollback}")]
    TestFailed {
        /// The channel type under test.
        channel: ChannelType,
        /// The integration identifier that was tested.
        id: String,
        /// The integration name.
        name: String,
        /// The test failure reported by the remote service.
        source: ApiError,
        /// Outcome of the rollback delete.
        rollback: RollbackOutcome,
    },

    /// The operation needs a tracked identifier but the resource has none.
    #[error("{operation} requires a tracked integration identifier, but none is set")]
    MissingIdentity {
        /// The lifecycle operation that was attempted.
        operation: &'static str,
    },

    /// Create was invoked on a resource that is already registered.
    #[error("integration is already registered with id {id}")]
    AlreadyRegistered {
        /// The identifier currently tracked.
        id: String,
    },

    /// An identifier supplied for import does not resolve remotely.
    #[error("{channel} integration not found: {id}")]
    NotFound {
        /// The channel type that was searched.
        channel: ChannelType,
        /// The identifier that was not found.
        id: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ChannelError {
    /// Returns true if the caller can fix this error by editing the declared
    /// configuration alone.
    #[must_use]
    pub const fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns true if this error left the integration deleted by rollback.
    #[must_use]
    pub const fn was_rolled_back(&self) -> bool {
        matches!(
            self,
            Self::TestFailed {
                rollback: RollbackOutcome::Deleted,
                ..
            }
        )
    }
}

impl From<serde_json::Error> for ChannelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;
