//! Show command implementation.

use std::collections::BTreeMap;
use std::io::Write;

use lookout_channels::{ChannelResource, Datadog, NewRelic};
use serde::Serialize;

use crate::error::Result;
use crate::output::{OutputFormat, TableDisplay, truncate};
use crate::state::{StateKind, StateStore, StoredResource};

/// Handler for the show command.
pub struct ShowCommand;

impl ShowCommand {
    /// Creates a new show command handler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Prints every tracked integration, secrets redacted.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the output fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        store: &StateStore,
    ) -> Result<()> {
        let resources = store
            .file()
            .resources
            .iter()
            .map(|(key, stored)| match stored {
                StoredResource::Datadog(resource) => view::<Datadog>(key, resource),
                StoredResource::Newrelic(resource) => view::<NewRelic>(key, resource),
            })
            .collect();

        format.write(out, &ShowReport { resources })
    }
}

impl Default for ShowCommand {
    fn default() -> Self {
        Self::new()
    }
}

fn view<K: StateKind>(key: &str, resource: &ChannelResource<K::Settings>) -> ResourceView {
    ResourceView {
        key: key.to_string(),
        kind: K::CHANNEL_TYPE.label().to_string(),
        id: resource.id().unwrap_or_default().to_string(),
        name: resource.declared.name.clone(),
        enabled: resource.declared.enabled,
        test_integration: resource.declared.test_integration,
        type_name: resource.computed.type_name.clone(),
        updated_at: resource.computed.created_or_updated_time.clone(),
        updated_by: resource.computed.created_or_updated_by.clone(),
        settings: K::describe(&resource.declared.settings)
            .into_iter()
            .map(|(field, value)| (field.to_string(), value))
            .collect(),
    }
}

// Output types

/// A tracked integration as displayed.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceView {
    /// State key.
    pub key: String,
    /// Channel kind label.
    pub kind: String,
    /// Integration identifier.
    pub id: String,
    /// Integration name.
    pub name: String,
    /// Whether the integration is enabled.
    pub enabled: bool,
    /// Whether applies run a delivery test.
    pub test_integration: bool,
    /// Server-computed type name.
    pub type_name: String,
    /// Last create or update time reported by the server.
    pub updated_at: String,
    /// Principal of the last create or update.
    pub updated_by: String,
    /// Channel settings, secrets redacted.
    pub settings: BTreeMap<String, String>,
}

/// Show output.
#[derive(Debug, Clone, Serialize)]
pub struct ShowReport {
    /// Tracked integrations in key order.
    pub resources: Vec<ResourceView>,
}

impl TableDisplay for ShowReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.resources.is_empty() {
            writeln!(writer, "No tracked integrations")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<32}  {:<44}  {:<8}  {:<24}",
            "KEY", "ID", "ENABLED", "UPDATED"
        )?;
        writeln!(writer, "{}", "─".repeat(114))?;

        for resource in &self.resources {
            writeln!(
                writer,
                "{:<32}  {:<44}  {:<8}  {:<24}",
                truncate(&resource.key, 32),
                resource.id,
                if resource.enabled { "yes" } else { "no" },
                resource.updated_at
            )?;
            for (field, value) in &resource.settings {
                writeln!(writer, "    {field}: {value}")?;
            }
        }
        Ok(())
    }
}
