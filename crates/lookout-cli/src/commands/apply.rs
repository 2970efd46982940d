//! Apply command implementation.
//!
//! Drives every declared channel to its declared configuration: untracked
//! channels are created, tracked ones are replaced in full.

use std::collections::HashSet;
use std::io::Write;

use lookout_channels::{
    AlertChannelApi, ChannelResource, ChannelType, Datadog, DeclaredChannel, NewRelic, Reconciler,
    TestOutcome,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{CliError, Result};
use crate::manifest::Manifest;
use crate::output::{OutputFormat, TableDisplay, truncate};
use crate::state::{StateKind, StateStore, state_key};

/// Handler for the apply command.
pub struct ApplyCommand<'a, A> {
    reconciler: &'a Reconciler<A>,
}

impl<'a, A: AlertChannelApi> ApplyCommand<'a, A> {
    /// Creates a new apply command handler.
    #[must_use]
    pub const fn new(reconciler: &'a Reconciler<A>) -> Self {
        Self { reconciler }
    }

    /// Executes the apply command.
    ///
    /// State is saved after every channel. The first failure stops the run;
    /// channels applied before it are reported and kept in state.
    ///
    /// # Errors
    ///
    /// Returns the first reconciliation, state or output error.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        manifest: &Manifest,
        store: &mut StateStore,
    ) -> Result<()> {
        let mut report = ApplyReport::default();
        let result = self.apply_all(manifest, store, &mut report).await;

        if result.is_ok() || !report.results.is_empty() {
            format.write(out, &report)?;
        }
        result?;

        warn_undeclared(manifest, store);
        Ok(())
    }

    async fn apply_all(
        &self,
        manifest: &Manifest,
        store: &mut StateStore,
        report: &mut ApplyReport,
    ) -> Result<()> {
        for declared in &manifest.datadog {
            report.results.push(self.apply_one::<Datadog>(declared, store).await?);
        }
        for declared in &manifest.newrelic {
            report.results.push(self.apply_one::<NewRelic>(declared, store).await?);
        }
        Ok(())
    }

    async fn apply_one<K: StateKind>(
        &self,
        declared: &DeclaredChannel<K::Settings>,
        store: &mut StateStore,
    ) -> Result<ApplyResult> {
        let key = state_key(K::CHANNEL_TYPE, &declared.name);

        let (action, mut resource) = match store.take::<K>(&key) {
            Some(mut tracked) if tracked.is_registered() => {
                tracked.declared = declared.clone();
                (ApplyAction::Updated, tracked)
            }
            _ => (ApplyAction::Created, ChannelResource::new(declared.clone())),
        };

        let result = match action {
            ApplyAction::Created => self.reconciler.create::<K>(&mut resource).await,
            ApplyAction::Updated => self.reconciler.update::<K>(&mut resource).await,
        };

        let id = resource.id().map(str::to_string);
        if resource.is_registered() {
            store.insert(key.clone(), K::wrap(resource));
        } else if action == ApplyAction::Updated {
            warn!(key = %key, "integration was rolled back, dropping it from state");
        }
        store.save()?;

        let test = result?;
        let id = id.ok_or_else(|| CliError::State(format!("'{key}' has no identifier")))?;
        info!(key = %key, id = %id, action = action.as_str(), "applied integration");

        Ok(ApplyResult {
            key,
            id,
            action,
            test,
        })
    }
}

fn warn_undeclared(manifest: &Manifest, store: &StateStore) {
    let declared: HashSet<String> = manifest
        .datadog
        .iter()
        .map(|c| state_key(ChannelType::Datadog, &c.name))
        .chain(
            manifest
                .newrelic
                .iter()
                .map(|c| state_key(ChannelType::NewRelic, &c.name)),
        )
        .collect();

    for key in store.keys() {
        if !declared.contains(&key) {
            warn!(key = %key, "tracked integration is not declared in the manifest; destroy it to remove it");
        }
    }
}

// Output types

/// What apply did to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyAction {
    /// A new integration was created.
    Created,
    /// The tracked integration was replaced.
    Updated,
}

impl ApplyAction {
    /// Returns the action as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

/// The result of applying one channel.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyResult {
    /// State key.
    pub key: String,
    /// Integration identifier.
    pub id: String,
    /// What was done.
    pub action: ApplyAction,
    /// Delivery test outcome.
    #[serde(serialize_with = "serialize_outcome")]
    pub test: TestOutcome,
}

fn serialize_outcome<S: serde::Serializer>(
    outcome: &TestOutcome,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(outcome.as_str())
}

/// Apply results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    /// One entry per applied channel, in manifest order.
    pub results: Vec<ApplyResult>,
}

impl TableDisplay for ApplyReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.results.is_empty() {
            writeln!(writer, "No channels declared")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<32}  {:<44}  {:<8}  {:<7}",
            "KEY", "ID", "ACTION", "TEST"
        )?;
        writeln!(writer, "{}", "─".repeat(97))?;

        for result in &self.results {
            writeln!(
                writer,
                "{:<32}  {:<44}  {:<8}  {:<7}",
                truncate(&result.key, 32),
                result.id,
                result.action.as_str(),
                result.test.as_str()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use lookout_channels::{ApiCall, ApiOperation, ChannelError, InMemoryApi};
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
        [[datadog]]
        name = "security-logs"
        datadog_site = "eu"
        datadog_service = "summary"
        api_key = "dd-key"

        [[newrelic]]
        name = "insights"
        account_id = 2338053
        insert_key = "NRII-key"
    "#;

    fn setup() -> (TempDir, StateStore, Reconciler<InMemoryApi>) {
        let dir = TempDir::new().unwrap();
        let store = StateStore::open(dir.path().join("state.json")).unwrap();
        (dir, store, Reconciler::new(InMemoryApi::new()))
    }

    async fn apply(
        reconciler: &Reconciler<InMemoryApi>,
        manifest: &Manifest,
        store: &mut StateStore,
    ) -> (Result<()>, String) {
        let mut out = Vec::new();
        let format = OutputFormat::new(Format::Json);
        let result = ApplyCommand::new(reconciler)
            .execute(&mut out, &format, manifest, store)
            .await;
        (result, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn first_apply_creates_everything() {
        let (_dir, mut store, reconciler) = setup();
        let manifest = Manifest::from_toml(MANIFEST).unwrap();

        let (result, out) = apply(&reconciler, &manifest, &mut store).await;
        result.unwrap();

        assert_eq!(store.keys(), ["datadog.security-logs", "newrelic.insights"]);
        assert_eq!(reconciler.api().len(), 2);
        let report: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(report["results"][0]["action"], "created");
        assert_eq!(report["results"][0]["test"], "passed");

        let reopened = StateStore::open(store.path()).unwrap();
        assert_eq!(reopened.len(), 2);
    }

    #[tokio::test]
    async fn second_apply_updates_in_place() {
        let (_dir, mut store, reconciler) = setup();
        let manifest = Manifest::from_toml(MANIFEST).unwrap();
        apply(&reconciler, &manifest, &mut store).await.0.unwrap();
        let id = store.get("newrelic.insights").unwrap().id().unwrap().to_string();
        reconciler.api().clear_calls();

        let (result, out) = apply(&reconciler, &manifest, &mut store).await;
        result.unwrap();

        assert!(out.contains("\"updated\""));
        assert_eq!(store.get("newrelic.insights").unwrap().id(), Some(id.as_str()));
        assert!(reconciler.api().calls().contains(&ApiCall::Update { id }));
        assert_eq!(reconciler.api().len(), 2);
    }

    #[tokio::test]
    async fn invalid_site_stops_before_any_call() {
        let (_dir, mut store, reconciler) = setup();
        let manifest = Manifest::from_toml(
            r#"
            [[datadog]]
            name = "logs"
            datadog_site = "invalid-region"
            api_key = "k"
            "#,
        )
        .unwrap();

        let (result, out) = apply(&reconciler, &manifest, &mut store).await;

        assert!(matches!(
            result,
            Err(CliError::Channel(ChannelError::Validation { .. }))
        ));
        assert!(out.is_empty());
        assert_eq!(reconciler.api().call_count(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn failed_test_on_update_drops_state() {
        let (_dir, mut store, reconciler) = setup();
        let manifest = Manifest::from_toml(MANIFEST).unwrap();
        apply(&reconciler, &manifest, &mut store).await.0.unwrap();

        reconciler.api().fail_tests("intake rejected the key");
        let (result, _) = apply(&reconciler, &manifest, &mut store).await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("intake rejected the key"));
        assert!(!store.contains("datadog.security-logs"));
        assert!(store.contains("newrelic.insights"));

        let reopened = StateStore::open(store.path()).unwrap();
        assert!(!reopened.contains("datadog.security-logs"));
    }

    #[tokio::test]
    async fn earlier_results_survive_a_later_failure() {
        let (_dir, mut store, reconciler) = setup();
        let datadog_only = Manifest {
            newrelic: Vec::new(),
            ..Manifest::from_toml(MANIFEST).unwrap()
        };
        apply(&reconciler, &datadog_only, &mut store).await.0.unwrap();

        reconciler.api().fail_next(ApiOperation::Create, "quota exceeded");
        let manifest = Manifest::from_toml(MANIFEST).unwrap();
        let (result, out) = apply(&reconciler, &manifest, &mut store).await;

        assert!(result.unwrap_err().to_string().contains("quota exceeded"));
        assert!(out.contains("datadog.security-logs"));
        assert!(!out.contains("newrelic.insights"));
        assert_eq!(store.keys(), ["datadog.security-logs"]);
    }

    #[test]
    fn table_output() {
        let report = ApplyReport {
            results: vec![ApplyResult {
                key: "datadog.logs".into(),
                id: "DATADOG_1".into(),
                action: ApplyAction::Created,
                test: TestOutcome::Skipped,
            }],
        };

        let out = OutputFormat::new(Format::Table).to_string(&report).unwrap();
        assert!(out.contains("KEY"));
        assert!(out.contains("datadog.logs"));
        assert!(out.contains("created"));
        assert!(out.contains("skipped"));
    }
}
