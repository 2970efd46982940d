//! Integration reconciler.
//!
//! This module provides the [`Reconciler`], the entry point the declarative
//! configuration engine drives. It orchestrates translation, the remote
//! call, response validation, state projection and the delivery test with
//! rollback into create, read, update, delete and import.
//!
//! Lifecycle per resource:
//!
//! ```text
//! Unmanaged --create--> Registered --update--> Registered --delete--> Unmanaged
//! ```
//!
//! A failed create leaves the resource unmanaged. A failed update leaves it
//! matching the remote side: unchanged if the submission failed, unmanaged
//! if the post-update test failed and the integration was deleted.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::AlertChannelApi;
use crate::error::{ChannelError, Result};
use crate::kind::ChannelKind;
use crate::projector::{Projection, project};
use crate::rollback::{TestOutcome, verify_or_rollback};
use crate::translator::translate;
use crate::types::{ChannelResource, DeclaredChannel};
use crate::validator::validate_response;

/// The result of a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The integration exists and state was refreshed.
    Found,
    /// The integration no longer exists remotely; the tracked identity was
    /// cleared.
    Gone,
}

/// Drives alert channel integrations towards their declared state.
///
/// The transport is injected at construction and shared by clones, so one
/// reconciler can serve concurrent operations on different resources.
#[derive(Debug)]
pub struct Reconciler<A> {
    api: Arc<A>,
}

impl<A> Clone for Reconciler<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: AlertChannelApi> Reconciler<A> {
    /// Creates a reconciler over `api`.
    #[must_use]
    pub fn new(api: A) -> Self {
        Self { api: Arc::new(api) }
    }

    /// Creates a reconciler over an already shared `api`.
    #[must_use]
    pub const fn from_shared(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Returns the transport.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Creates the remote integration for an unmanaged resource.
    ///
    /// On success the resource is registered under the server-assigned
    /// identifier. If the delivery test fails the integration is deleted
    /// again and the resource is left unmanaged.
    ///
    /// # Errors
    ///
    /// - `ChannelError::AlreadyRegistered` if the resource tracks an identifier
    /// - `ChannelError::Validation` before any remote call
    /// - `ChannelError::Transport` if the create call fails
    /// - `ChannelError::ProtocolInvariant` if the response is not a single record
    /// - `ChannelError::TestFailed` if the delivery test fails
    pub async fn create<K: ChannelKind>(
        &self,
        resource: &mut ChannelResource<K::Settings>,
    ) -> Result<TestOutcome> {
        if let Some(id) = resource.id() {
            return Err(ChannelError::AlreadyRegistered { id: id.to_string() });
        }

        let channel = K::CHANNEL_TYPE;
        let payload = translate::<K>(&resource.declared, None)?;

        info!(channel = %channel, name = %payload.name, "creating integration");
        debug!(payload = ?payload, "integration payload");
        let envelope = self.api.create::<K>(&payload).await?;

        debug!(channel = %channel, "verifying server response data");
        let record = validate_response(envelope)?;
        project::<K>(&record, resource, Projection::Create);

        let outcome = self.verify::<K>(resource).await?;
        info!(channel = %channel, id = %record.intg_guid, "created integration");
        Ok(outcome)
    }

    /// Refreshes a registered resource from the server.
    ///
    /// If the tracked identifier is absent from the server's answer, the
    /// identity is cleared and [`ReadOutcome::Gone`] is returned rather than
    /// an error.
    ///
    /// # Errors
    ///
    /// - `ChannelError::MissingIdentity` if the resource is unmanaged
    /// - `ChannelError::Transport` if the get call fails
    pub async fn read<K: ChannelKind>(
        &self,
        resource: &mut ChannelResource<K::Settings>,
    ) -> Result<ReadOutcome> {
        let channel = K::CHANNEL_TYPE;
        let id = resource
            .id()
            .map(str::to_string)
            .ok_or(ChannelError::MissingIdentity { operation: "read" })?;

        info!(channel = %channel, id = %id, "reading integration");
        let envelope = self.api.get::<K>(&id).await?;

        match envelope.data.iter().find(|record| record.intg_guid == id) {
            Some(record) => {
                project::<K>(record, resource, Projection::Read);
                info!(channel = %channel, id = %id, "read integration");
                Ok(ReadOutcome::Found)
            }
            None => {
                warn!(
                    channel = %channel,
                    id = %id,
                    "integration no longer exists remotely, clearing tracked identity"
                );
                resource.clear_identity();
                Ok(ReadOutcome::Gone)
            }
        }
    }

    /// Replaces the remote integration with the full declared configuration.
    ///
    /// There is no field-level diff and no value-level undo: if the delivery
    /// test fails after the update, the integration is deleted and the
    /// resource is left unmanaged.
    ///
    /// # Errors
    ///
    /// - `ChannelError::MissingIdentity` if the resource is unmanaged
    /// - `ChannelError::Validation` before any remote call
    /// - `ChannelError::Transport` if the update call fails
    /// - `ChannelError::ProtocolInvariant` if the response is not a single record
    /// - `ChannelError::TestFailed` if the delivery test fails
    pub async fn update<K: ChannelKind>(
        &self,
        resource: &mut ChannelResource<K::Settings>,
    ) -> Result<TestOutcome> {
        let channel = K::CHANNEL_TYPE;
        let id = resource
            .id()
            .map(str::to_string)
            .ok_or(ChannelError::MissingIdentity { operation: "update" })?;
        let payload = translate::<K>(&resource.declared, Some(&id))?;

        info!(channel = %channel, id = %id, name = %payload.name, "updating integration");
        debug!(payload = ?payload, "integration payload");
        let envelope = self.api.update::<K>(&id, &payload).await?;

        debug!(channel = %channel, "verifying server response data");
        let record = validate_response(envelope)?;
        project::<K>(&record, resource, Projection::Update);

        let outcome = self.verify::<K>(resource).await?;
        info!(channel = %channel, id = %id, "updated integration");
        Ok(outcome)
    }

    /// Deletes the remote integration and clears the tracked identity.
    ///
    /// # Errors
    ///
    /// - `ChannelError::MissingIdentity` if the resource is unmanaged
    /// - `ChannelError::Transport` if the delete call fails; the identity is
    ///   kept so the delete can be retried
    pub async fn delete<K: ChannelKind>(
        &self,
        resource: &mut ChannelResource<K::Settings>,
    ) -> Result<()> {
        let channel = K::CHANNEL_TYPE;
        let id = resource
            .id()
            .map(str::to_string)
            .ok_or(ChannelError::MissingIdentity { operation: "delete" })?;

        info!(channel = %channel, id = %id, "deleting integration");
        self.api.delete(&id).await?;
        resource.clear_identity();

        info!(channel = %channel, id = %id, "deleted integration");
        Ok(())
    }

    /// Adopts an existing remote integration by identifier.
    ///
    /// Equivalent to a read starting from default settings. Credentials the
    /// server does not echo stay empty until the declaration supplies them.
    ///
    /// # Errors
    ///
    /// - `ChannelError::NotFound` if the identifier does not resolve
    /// - `ChannelError::Transport` if the get call fails
    pub async fn import<K: ChannelKind>(&self, id: &str) -> Result<ChannelResource<K::Settings>> {
        let channel = K::CHANNEL_TYPE;
        info!(channel = %channel, id = %id, "importing integration");

        let declared = DeclaredChannel::new(String::new(), K::Settings::default());
        let mut resource = ChannelResource::tracking(id, declared);

        match self.read::<K>(&mut resource).await? {
            ReadOutcome::Found => Ok(resource),
            ReadOutcome::Gone => Err(ChannelError::NotFound {
                channel,
                id: id.to_string(),
            }),
        }
    }

    async fn verify<K: ChannelKind>(
        &self,
        resource: &mut ChannelResource<K::Settings>,
    ) -> Result<TestOutcome> {
        let id = resource
            .id()
            .map(str::to_string)
            .ok_or(ChannelError::MissingIdentity { operation: "test" })?;

        let result = verify_or_rollback::<K, A>(
            self.api.as_ref(),
            &id,
            &resource.declared.name,
            resource.declared.test_integration,
        )
        .await;

        if result.as_ref().is_err_and(ChannelError::was_rolled_back) {
            resource.clear_identity();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiOperation;
    use crate::datadog::{Datadog, DatadogSettings};
    use crate::memory::{ApiCall, InMemoryApi};
    use crate::newrelic::{NewRelic, NewRelicSettings};
    use crate::types::Lifecycle;

    fn reconciler() -> Reconciler<InMemoryApi> {
        Reconciler::new(InMemoryApi::new())
    }

    fn datadog(name: &str) -> ChannelResource<DatadogSettings> {
        ChannelResource::new(DeclaredChannel::new(
            name,
            DatadogSettings::new("dd-key").site("eu").service("summary"),
        ))
    }

    fn newrelic(name: &str) -> ChannelResource<NewRelicSettings> {
        ChannelResource::new(DeclaredChannel::new(
            name,
            NewRelicSettings::new(2_338_053, "NRII-key"),
        ))
    }

    mod create_tests {
        use super::*;

        #[tokio::test]
        async fn create_registers_and_tests() {
            let reconciler = reconciler();
            let mut resource = datadog("logs");

            let outcome = reconciler.create::<Datadog>(&mut resource).await.unwrap();

            assert_eq!(outcome, TestOutcome::Passed);
            assert_eq!(resource.lifecycle(), Lifecycle::Registered);
            let id = resource.id().unwrap().to_string();
            assert_eq!(resource.computed.intg_guid, id);
            assert!(reconciler.api().contains(&id));
            assert_eq!(
                reconciler.api().calls(),
                vec![
                    ApiCall::Create {
                        name: "logs".to_string()
                    },
                    ApiCall::Test { id }
                ]
            );
        }

        #[tokio::test]
        async fn create_without_test() {
            let reconciler = reconciler();
            let mut resource = newrelic("metrics");
            resource.declared.test_integration = false;

            let outcome = reconciler.create::<NewRelic>(&mut resource).await.unwrap();

            assert_eq!(outcome, TestOutcome::Skipped);
            assert_eq!(reconciler.api().call_count(), 1);
        }

        #[tokio::test]
        async fn create_disabled_reports_disabled() {
            let reconciler = reconciler();
            let mut resource = newrelic("metrics");
            resource.declared.enabled = false;

            reconciler.create::<NewRelic>(&mut resource).await.unwrap();

            assert!(!resource.declared.enabled);
            let record = reconciler.api().record(resource.id().unwrap()).unwrap();
            assert_eq!(record.enabled, 0);
        }

        #[tokio::test]
        async fn create_rejects_registered_resource() {
            let reconciler = reconciler();
            let mut resource = datadog("logs");
            resource.id = Some("EXISTING".to_string());

            let err = reconciler.create::<Datadog>(&mut resource).await.unwrap_err();

            assert!(matches!(err, ChannelError::AlreadyRegistered { .. }));
            assert_eq!(reconciler.api().call_count(), 0);
        }

        #[tokio::test]
        async fn create_transport_failure_leaves_unmanaged() {
            let reconciler = reconciler();
            reconciler
                .api()
                .fail_next(ApiOperation::Create, "service unavailable");
            let mut resource = datadog("logs");

            let err = reconciler.create::<Datadog>(&mut resource).await.unwrap_err();

            assert!(matches!(err, ChannelError::Transport(_)));
            assert_eq!(resource.lifecycle(), Lifecycle::Unmanaged);
            assert!(reconciler.api().is_empty());
        }

        #[tokio::test]
        async fn create_empty_response_is_protocol_violation() {
            let reconciler = reconciler();
            reconciler.api().respond_next_with(Vec::new());
            let mut resource = datadog("logs");

            let err = reconciler.create::<Datadog>(&mut resource).await.unwrap_err();

            assert!(matches!(err, ChannelError::ProtocolInvariant { .. }));
            assert!(!resource.is_registered());
        }

        #[tokio::test]
        async fn create_failed_rollback_keeps_identity() {
            let reconciler = reconciler();
            reconciler.api().fail_tests("rejected");
            reconciler
                .api()
                .fail_next(ApiOperation::Delete, "service unavailable");
            let mut resource = datadog("logs");

            let err = reconciler.create::<Datadog>(&mut resource).await.unwrap_err();

            assert!(matches!(err, ChannelError::TestFailed { .. }));
            assert!(!err.was_rolled_back());
            let id = resource.id().unwrap();
            assert!(reconciler.api().contains(id));
        }
    }

    mod read_tests {
        use super::*;

        #[tokio::test]
        async fn read_echoes_remote_changes() {
            let reconciler = reconciler();
            let mut resource = datadog("logs");
            reconciler.create::<Datadog>(&mut resource).await.unwrap();

            let id = resource.id().unwrap().to_string();
            let mut changed = reconciler.api().record(&id).unwrap();
            changed.data["DATADOG_SITE"] = serde_json::json!("com");
            changed.name = "renamed".to_string();
            reconciler.api().insert(changed);

            let outcome = reconciler.read::<Datadog>(&mut resource).await.unwrap();

            assert_eq!(outcome, ReadOutcome::Found);
            assert_eq!(resource.declared.name, "renamed");
            assert_eq!(resource.declared.settings.datadog_site, "com");
            assert_eq!(resource.declared.settings.api_key.expose(), "dd-key");
        }

        #[tokio::test]
        async fn read_unmanaged_is_missing_identity() {
            let reconciler = reconciler();
            let mut resource = datadog("logs");
            let err = reconciler.read::<Datadog>(&mut resource).await.unwrap_err();
            assert!(matches!(
                err,
                ChannelError::MissingIdentity { operation: "read" }
            ));
        }

        #[tokio::test]
        async fn read_transport_failure_keeps_identity() {
            let reconciler = reconciler();
            let mut resource = datadog("logs");
            reconciler.create::<Datadog>(&mut resource).await.unwrap();
            reconciler.api().fail_next(ApiOperation::Get, "timeout");

            let err = reconciler.read::<Datadog>(&mut resource).await.unwrap_err();

            assert!(matches!(err, ChannelError::Transport(_)));
            assert!(resource.is_registered());
        }
    }

    mod update_tests {
        use super::*;

        #[tokio::test]
        async fn update_replaces_remote_payload() {
            let reconciler = reconciler();
            let mut resource = newrelic("metrics");
            reconciler.create::<NewRelic>(&mut resource).await.unwrap();
            let id = resource.id().unwrap().to_string();

            resource.declared.settings = NewRelicSettings::new(7, "rotated");
            resource.declared.name = "metrics-v2".to_string();
            let outcome = reconciler.update::<NewRelic>(&mut resource).await.unwrap();

            assert_eq!(outcome, TestOutcome::Passed);
            assert_eq!(resource.id(), Some(id.as_str()));
            let record = reconciler.api().record(&id).unwrap();
            assert_eq!(record.name, "metrics-v2");
            assert_eq!(record.data["ACCOUNT_ID"], 7);
            assert_eq!(record.data["INSERT_KEY"], "rotated");
        }

        #[tokio::test]
        async fn update_invalid_enum_makes_no_call() {
            let reconciler = reconciler();
            let mut resource = datadog("logs");
            reconciler.create::<Datadog>(&mut resource).await.unwrap();
            reconciler.api().clear_calls();

            resource.declared.settings.datadog_service = "verbose".to_string();
            let err = reconciler.update::<Datadog>(&mut resource).await.unwrap_err();

            assert!(matches!(err, ChannelError::Validation { .. }));
            assert_eq!(reconciler.api().call_count(), 0);
            assert!(resource.is_registered());
        }

        #[tokio::test]
        async fn update_test_failure_deletes_integration() {
            let reconciler = reconciler();
            let mut resource = datadog("logs");
            reconciler.create::<Datadog>(&mut resource).await.unwrap();
            let id = resource.id().unwrap().to_string();
            reconciler.api().fail_tests("invalid api key");

            let err = reconciler.update::<Datadog>(&mut resource).await.unwrap_err();

            assert!(err.was_rolled_back());
            assert!(!resource.is_registered());
            assert!(!reconciler.api().contains(&id));
        }

        #[tokio::test]
        async fn update_transport_failure_keeps_identity() {
            let reconciler = reconciler();
            let mut resource = datadog("logs");
            reconciler.create::<Datadog>(&mut resource).await.unwrap();
            reconciler.api().fail_next(ApiOperation::Update, "conflict");

            let err = reconciler.update::<Datadog>(&mut resource).await.unwrap_err();

            assert!(matches!(err, ChannelError::Transport(_)));
            assert!(resource.is_registered());
        }

        #[tokio::test]
        async fn update_unmanaged_is_missing_identity() {
            let reconciler = reconciler();
            let mut resource = datadog("logs");
            let err = reconciler.update::<Datadog>(&mut resource).await.unwrap_err();
            assert!(matches!(err, ChannelError::MissingIdentity { .. }));
            assert_eq!(reconciler.api().call_count(), 0);
        }
    }

    mod delete_tests {
        use super::*;

        #[tokio::test]
        async fn delete_unregisters() {
            let reconciler = reconciler();
            let mut resource = datadog("logs");
            reconciler.create::<Datadog>(&mut resource).await.unwrap();
            let id = resource.id().unwrap().to_string();

            reconciler.delete::<Datadog>(&mut resource).await.unwrap();

            assert_eq!(resource.lifecycle(), Lifecycle::Unmanaged);
            assert!(!reconciler.api().contains(&id));
        }

        #[tokio::test]
        async fn delete_failure_is_surfaced_and_keeps_identity() {
            let reconciler = reconciler();
            let mut resource = datadog("logs");
            reconciler.create::<Datadog>(&mut resource).await.unwrap();
            reconciler.api().fail_next(ApiOperation::Delete, "forbidden");

            let err = reconciler.delete::<Datadog>(&mut resource).await.unwrap_err();

            assert!(err.to_string().contains("forbidden"));
            assert!(resource.is_registered());
        }
    }

    mod import_tests {
        use super::*;

        #[tokio::test]
        async fn import_hydrates_state() {
            let reconciler = reconciler();
            let mut original = newrelic("metrics");
            reconciler.create::<NewRelic>(&mut original).await.unwrap();
            let id = original.id().unwrap().to_string();

            let imported = reconciler.import::<NewRelic>(&id).await.unwrap();

            assert_eq!(imported.id(), Some(id.as_str()));
            assert_eq!(imported.declared.name, "metrics");
            assert_eq!(imported.declared.settings, original.declared.settings);
            assert_eq!(imported.computed, original.computed);
        }

        #[tokio::test]
        async fn import_unknown_is_not_found() {
            let reconciler = reconciler();
            let err = reconciler.import::<Datadog>("NOPE").await.unwrap_err();
            assert!(matches!(err, ChannelError::NotFound { ref id, .. } if id == "NOPE"));
        }
    }

    #[tokio::test]
    async fn clones_share_transport() {
        let reconciler = reconciler();
        let clone = reconciler.clone();
        let mut resource = datadog("logs");
        clone.create::<Datadog>(&mut resource).await.unwrap();
        assert_eq!(reconciler.api().len(), 1);
    }
}
