//! Destroy command implementation.

use std::io::Write;

use lookout_channels::{AlertChannelApi, ChannelResource, Datadog, NewRelic, Reconciler};
use serde::Serialize;

use crate::error::{CliError, Result};
use crate::output::{OutputFormat, TableDisplay};
use crate::state::{StateKind, StateStore, StoredResource};

/// Handler for the destroy command.
pub struct DestroyCommand<'a, A> {
    reconciler: &'a Reconciler<A>,
}

impl<'a, A: AlertChannelApi> DestroyCommand<'a, A> {
    /// Creates a new destroy command handler.
    #[must_use]
    pub const fn new(reconciler: &'a Reconciler<A>) -> Self {
        Self { reconciler }
    }

    /// Deletes the integration tracked under `key` and stops tracking it.
    ///
    /// # Errors
    ///
    /// Returns `CliError::UnknownResource` if `key` is not tracked, or the
    /// delete error; a failed delete leaves the key tracked.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        store: &mut StateStore,
        key: &str,
    ) -> Result<()> {
        let stored = store
            .remove(key)
            .ok_or_else(|| CliError::UnknownResource(key.to_string()))?;

        let id = match stored {
            StoredResource::Datadog(resource) => {
                self.destroy_one::<Datadog>(key, resource, store).await?
            }
            StoredResource::Newrelic(resource) => {
                self.destroy_one::<NewRelic>(key, resource, store).await?
            }
        };

        let response = DestroyResponse {
            key: key.to_string(),
            id,
        };
        format.write(out, &response)
    }

    async fn destroy_one<K: StateKind>(
        &self,
        key: &str,
        mut resource: ChannelResource<K::Settings>,
        store: &mut StateStore,
    ) -> Result<String> {
        let id = resource.id().unwrap_or_default().to_string();
        let result = self.reconciler.delete::<K>(&mut resource).await;

        if resource.is_registered() {
            store.insert(key, K::wrap(resource));
        }
        store.save()?;

        result?;
        Ok(id)
    }
}

// Output types

/// Destroy response.
#[derive(Debug, Clone, Serialize)]
pub struct DestroyResponse {
    /// State key that was destroyed.
    pub key: String,
    /// Identifier of the deleted integration.
    pub id: String,
}

impl TableDisplay for DestroyResponse {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "Destroyed {} ({})", self.key, self.id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use lookout_channels::{ApiOperation, DeclaredChannel, InMemoryApi, NewRelicSettings};
    use tempfile::TempDir;

    async fn seeded() -> (TempDir, StateStore, Reconciler<InMemoryApi>, String) {
        let dir = TempDir::new().unwrap();
        let mut store = StateStore::open(dir.path().join("state.json")).unwrap();
        let reconciler = Reconciler::new(InMemoryApi::new());

        let mut resource = ChannelResource::new(DeclaredChannel::new(
            "insights",
            NewRelicSettings::new(1, "key"),
        ));
        reconciler.create::<NewRelic>(&mut resource).await.unwrap();
        let id = resource.id().unwrap().to_string();
        store.insert("newrelic.insights", NewRelic::wrap(resource));

        (dir, store, reconciler, id)
    }

    #[tokio::test]
    async fn destroy_deletes_and_untracks() {
        let (_dir, mut store, reconciler, id) = seeded().await;
        let mut out = Vec::new();

        DestroyCommand::new(&reconciler)
            .execute(
                &mut out,
                &OutputFormat::new(Format::Table),
                &mut store,
                "newrelic.insights",
            )
            .await
            .unwrap();

        assert!(store.is_empty());
        assert!(!reconciler.api().contains(&id));
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, format!("Destroyed newrelic.insights ({id})\n"));
    }

    #[tokio::test]
    async fn destroy_unknown_key() {
        let (_dir, mut store, reconciler, _id) = seeded().await;
        let err = DestroyCommand::new(&reconciler)
            .execute(
                &mut Vec::new(),
                &OutputFormat::default(),
                &mut store,
                "datadog.nope",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::UnknownResource(ref k) if k == "datadog.nope"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn failed_delete_keeps_tracking() {
        let (_dir, mut store, reconciler, id) = seeded().await;
        reconciler.api().fail_next(ApiOperation::Delete, "forbidden");

        let result = DestroyCommand::new(&reconciler)
            .execute(
                &mut Vec::new(),
                &OutputFormat::default(),
                &mut store,
                "newrelic.insights",
            )
            .await;

        assert!(result.is_err());
        assert_eq!(store.get("newrelic.insights").unwrap().id(), Some(id.as_str()));
        assert!(reconciler.api().contains(&id));
    }
}
