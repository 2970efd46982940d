//! Refresh command implementation.
//!
//! Re-reads every tracked integration so local state reflects the server,
//! and stops tracking integrations that were deleted outside this tool.

use std::io::Write;

use lookout_channels::{
    AlertChannelApi, ChannelResource, Datadog, NewRelic, ReadOutcome, Reconciler,
};
use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::output::{OutputFormat, TableDisplay, truncate};
use crate::state::{StateKind, StateStore, StoredResource};

/// Handler for the refresh command.
pub struct RefreshCommand<'a, A> {
    reconciler: &'a Reconciler<A>,
}

impl<'a, A: AlertChannelApi> RefreshCommand<'a, A> {
    /// Creates a new refresh command handler.
    #[must_use]
    pub const fn new(reconciler: &'a Reconciler<A>) -> Self {
        Self { reconciler }
    }

    /// Executes the refresh command.
    ///
    /// # Errors
    ///
    /// Returns the first read, state or output error. Resources refreshed
    /// before the failure are saved.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        store: &mut StateStore,
    ) -> Result<()> {
        let mut report = RefreshReport::default();

        for key in store.keys() {
            let Some(stored) = store.remove(&key) else {
                continue;
            };
            let outcome = match stored {
                StoredResource::Datadog(resource) => {
                    self.refresh_one::<Datadog>(&key, resource, store).await?
                }
                StoredResource::Newrelic(resource) => {
                    self.refresh_one::<NewRelic>(&key, resource, store).await?
                }
            };
            report.results.push(RefreshResult {
                key,
                status: outcome.into(),
            });
        }

        format.write(out, &report)
    }

    async fn refresh_one<K: StateKind>(
        &self,
        key: &str,
        mut resource: ChannelResource<K::Settings>,
        store: &mut StateStore,
    ) -> Result<ReadOutcome> {
        let result = self.reconciler.read::<K>(&mut resource).await;

        if resource.is_registered() {
            store.insert(key, K::wrap(resource));
        } else {
            warn!(key = %key, "integration was deleted remotely, dropping it from state");
        }
        store.save()?;

        Ok(result?)
    }
}

// Output types

/// Result of refreshing one integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    /// State was refreshed from the server.
    Refreshed,
    /// The integration no longer exists and was dropped.
    Dropped,
}

impl RefreshStatus {
    /// Returns the status as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Refreshed => "refreshed",
            Self::Dropped => "dropped",
        }
    }
}

impl From<ReadOutcome> for RefreshStatus {
    fn from(outcome: ReadOutcome) -> Self {
        match outcome {
            ReadOutcome::Found => Self::Refreshed,
            ReadOutcome::Gone => Self::Dropped,
        }
    }
}

/// One refreshed key.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResult {
    /// State key.
    pub key: String,
    /// What happened to it.
    pub status: RefreshStatus,
}

/// Refresh results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshReport {
    /// One entry per tracked key.
    pub results: Vec<RefreshResult>,
}

impl TableDisplay for RefreshReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.results.is_empty() {
            writeln!(writer, "No tracked integrations")?;
            return Ok(());
        }

        writeln!(writer, "{:<40}  {:<10}", "KEY", "STATUS")?;
        writeln!(writer, "{}", "─".repeat(52))?;
        for result in &self.results {
            writeln!(
                writer,
                "{:<40}  {:<10}",
                truncate(&result.key, 40),
                result.status.as_str()
            )?;
        }
        Ok(())
    }
}
