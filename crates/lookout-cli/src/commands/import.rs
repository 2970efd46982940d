//! Import command implementation.
//!
//! Adopts an integration created outside this tool. Credentials the server
//! masks stay empty in state until the next apply supplies them.

use std::io::Write;

use lookout_channels::{AlertChannelApi, ChannelType, Datadog, NewRelic, Reconciler};
use serde::Serialize;
use tracing::info;

use crate::error::{CliError, Result};
use crate::output::{OutputFormat, TableDisplay};
use crate::state::{StateKind, StateStore, state_key};

/// Handler for the import command.
pub struct ImportCommand<'a, A> {
    reconciler: &'a Reconciler<A>,
}

impl<'a, A: AlertChannelApi> ImportCommand<'a, A> {
    /// Creates a new import command handler.
    #[must_use]
    pub const fn new(reconciler: &'a Reconciler<A>) -> Self {
        Self { reconciler }
    }

    /// Imports integration `id` of type `channel`.
    ///
    /// # Errors
    ///
    /// Returns `CliError::DuplicateResource` if the derived key is already
    /// tracked, or the import error.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        store: &mut StateStore,
        channel: ChannelType,
        id: &str,
    ) -> Result<()> {
        let response = match channel {
            ChannelType::Datadog => self.import_one::<Datadog>(store, id).await?,
            ChannelType::NewRelic => self.import_one::<NewRelic>(store, id).await?,
        };
        format.write(out, &response)
    }

    async fn import_one<K: StateKind>(
        &self,
        store: &mut StateStore,
        id: &str,
    ) -> Result<ImportResponse> {
        let resource = self.reconciler.import::<K>(id).await?;
        let key = state_key(K::CHANNEL_TYPE, &resource.declared.name);

        if store.contains(&key) {
            return Err(CliError::DuplicateResource(key));
        }

        let name = resource.declared.name.clone();
        store.insert(key.clone(), K::wrap(resource));
        store.save()?;
        info!(key = %key, id = %id, "imported integration");

        Ok(ImportResponse {
            key,
            id: id.to_string(),
            name,
        })
    }
}

// Output types

/// Import response.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    /// State key the integration is tracked under.
    pub key: String,
    /// Integration identifier.
    pub id: String,
    /// Integration name reported by the server.
    pub name: String,
}

impl TableDisplay for ImportResponse {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "Imported {} as {}", self.id, self.key)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use crate::state::StoredResource;
    use lookout_channels::{
        ChannelError, ChannelResource, DatadogSettings, DeclaredChannel, InMemoryApi,
    };
    use tempfile::TempDir;

    async fn remote_datadog(reconciler: &Reconciler<InMemoryApi>) -> String {
        let mut resource = ChannelResource::new(DeclaredChannel::new(
            "created-elsewhere",
            DatadogSettings::new("dd-key").site("eu"),
        ));
        reconciler.create::<Datadog>(&mut resource).await.unwrap();
        resource.id().unwrap().to_string()
    }

    #[tokio::test]
    async fn import_tracks_remote_integration() {
        let dir = TempDir::new().unwrap();
        let mut store = StateStore::open(dir.path().join("state.json")).unwrap();
        let reconciler = Reconciler::new(InMemoryApi::new());
        let id = remote_datadog(&reconciler).await;

        let mut out = Vec::new();
        ImportCommand::new(&reconciler)
            .execute(
                &mut out,
                &OutputFormat::new(Format::Json),
                &mut store,
                ChannelType::Datadog,
                &id,
            )
            .await
            .unwrap();

        let key = "datadog.created-elsewhere";
        match store.get(key).unwrap() {
            StoredResource::Datadog(resource) => {
                assert_eq!(resource.id(), Some(id.as_str()));
                assert_eq!(resource.declared.settings.datadog_site, "eu");
                assert!(resource.declared.settings.api_key.is_empty());
            }
            other => panic!("unexpected resource {other:?}"),
        }
        let response: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(response["key"], key);
        assert!(StateStore::open(store.path()).unwrap().contains(key));
    }

    #[tokio::test]
    async fn import_rejects_tracked_key() {
        let dir = TempDir::new().unwrap();
        let mut store = StateStore::open(dir.path().join("state.json")).unwrap();
        let reconciler = Reconciler::new(InMemoryApi::new());
        let id = remote_datadog(&reconciler).await;
        let command = ImportCommand::new(&reconciler);
        let format = OutputFormat::default();

        command
            .execute(&mut Vec::new(), &format, &mut store, ChannelType::Datadog, &id)
            .await
            .unwrap();
        let err = command
            .execute(&mut Vec::new(), &format, &mut store, ChannelType::Datadog, &id)
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::DuplicateResource(_)));
    }

    #[tokio::test]
    async fn import_unknown_id() {
        let dir = TempDir::new().unwrap();
        let mut store = StateStore::open(dir.path().join("state.json")).unwrap();
        let reconciler = Reconciler::new(InMemoryApi::new());

        let err = ImportCommand::new(&reconciler)
            .execute(
                &mut Vec::new(),
                &OutputFormat::default(),
                &mut store,
                ChannelType::NewRelic,
                "NEW_RELIC_INSIGHTS_MISSING",
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CliError::Channel(ChannelError::NotFound { .. })
        ));
        assert!(store.is_empty());
    }
}
