//! Post-mutation delivery test with rollback.
//!
//! After a create or update, the reconciler can ask the remote service to
//! send a test notification through the integration. If that test fails the
//! integration is deleted, so a broken integration is never left registered.
//! There is no value-level undo: a failed test after update deletes the
//! integration outright.

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::api::AlertChannelApi;
use crate::error::{ChannelError, Result};
use crate::kind::ChannelKind;

/// What the delivery-test step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    /// No test ran, either because it was not requested or the channel type
    /// does not support one.
    Skipped,
    /// The test notification was delivered.
    Passed,
}

impl TestOutcome {
    /// Returns the outcome as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Passed => "passed",
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened to an integration whose delivery test failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// The integration was deleted.
    Deleted,
    /// The rollback delete failed too; the integration may still exist.
    DeleteFailed(String),
}

impl fmt::Display for RollbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted => write!(f, "the integration was deleted (rolled back)"),
            Self::DeleteFailed(reason) => write!(
                f,
                "rollback delete also failed, the integration may still be registered: {reason}"
            ),
        }
    }
}

/// Runs the delivery test for `id` and rolls the integration back on
/// failure.
///
/// A no-op when `requested` is false or `K` has no delivery test.
///
/// # Errors
///
/// Returns `ChannelError::TestFailed` carrying the original test failure and
/// the [`RollbackOutcome`]. A failing rollback delete is logged and recorded
/// but never replaces the test failure as the primary error.
pub async fn verify_or_rollback<K, A>(
    api: &A,
    id: &str,
    name: &str,
    requested: bool,
) -> Result<TestOutcome>
where
    K: ChannelKind,
    A: AlertChannelApi,
{
    let channel = K::CHANNEL_TYPE;

    if !requested || !K::SUPPORTS_TEST {
        debug!(channel = %channel, id = %id, "skipping integration test");
        return Ok(TestOutcome::Skipped);
    }

    info!(channel = %channel, id = %id, "testing integration");
    let test_error = match api.test(id).await {
        Ok(()) => {
            info!(channel = %channel, id = %id, "tested integration successfully");
            return Ok(TestOutcome::Passed);
        }
        Err(err) => err,
    };

    warn!(
        channel = %channel,
        id = %id,
        name = %name,
        error = %test_error,
        "integration test failed, rolling back"
    );

    let rollback = match api.delete(id).await {
        Ok(()) => {
            info!(channel = %channel, id = %id, "rolled back integration");
            RollbackOutcome::Deleted
        }
        Err(delete_error) => {
            error!(
                channel = %channel,
                id = %id,
                name = %name,
                error = %delete_error,
                "failed to roll back integration"
            );
            RollbackOutcome::DeleteFailed(delete_error.to_string())
        }
    };

    Err(ChannelError::TestFailed {
        channel,
        id: id.to_string(),
        name: name.to_string(),
        source: test_error,
        rollback,
    })
}
