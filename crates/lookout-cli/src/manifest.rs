//! Channel manifest.
//!
//! The manifest declares the desired alert channels, one TOML table array
//! per channel kind:
//!
//! ```toml
//! [[datadog]]
//! name = "security-logs"
//! datadog_site = "eu"
//! datadog_service = "summary"
//! api_key = "..."
//!
//! [[newrelic]]
//! name = "insights"
//! test_integration = false
//! account_id = 2338053
//! insert_key = "..."
//! ```

use std::collections::HashSet;
use std::path::Path;

use lookout_channels::{DatadogSettings, DeclaredChannel, NewRelicSettings, SecretKey};
use serde::Deserialize;

use crate::error::{CliError, Result};

/// Declared alert channels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    /// Declared Datadog channels.
    pub datadog: Vec<DeclaredChannel<DatadogSettings>>,
    /// Declared New Relic Insights channels.
    pub newrelic: Vec<DeclaredChannel<NewRelicSettings>>,
}

// On-disk layout. Every table denies unknown keys so a misspelled setting
// fails instead of falling back to its default.

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    datadog: Vec<DatadogEntry>,
    #[serde(default)]
    newrelic: Vec<NewRelicEntry>,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatadogEntry {
    name: String,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_true")]
    test_integration: bool,
    datadog_site: Option<String>,
    datadog_service: Option<String>,
    api_key: SecretKey,
}

impl From<DatadogEntry> for DeclaredChannel<DatadogSettings> {
    fn from(entry: DatadogEntry) -> Self {
        let mut settings = DatadogSettings::new(entry.api_key);
        if let Some(site) = entry.datadog_site {
            settings = settings.site(site);
        }
        if let Some(service) = entry.datadog_service {
            settings = settings.service(service);
        }
        DeclaredChannel::new(entry.name, settings)
            .enabled(entry.enabled)
            .test_integration(entry.test_integration)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NewRelicEntry {
    name: String,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_true")]
    test_integration: bool,
    account_id: i64,
    insert_key: SecretKey,
}

impl From<NewRelicEntry> for DeclaredChannel<NewRelicSettings> {
    fn from(entry: NewRelicEntry) -> Self {
        DeclaredChannel::new(
            entry.name,
            NewRelicSettings::new(entry.account_id, entry.insert_key),
        )
        .enabled(entry.enabled)
        .test_integration(entry.test_integration)
    }
}

impl From<ManifestFile> for Manifest {
    fn from(file: ManifestFile) -> Self {
        Self {
            datadog: file.datadog.into_iter().map(Into::into).collect(),
            newrelic: file.newrelic.into_iter().map(Into::into).collect(),
        }
    }
}

impl Manifest {
    /// Load a manifest from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Manifest(format!("failed to read '{}': {e}", path.display()))
        })?;

        Self::from_toml(&content)
    }

    /// Parse a manifest from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ManifestFile =
            toml::from_str(content).map_err(|e| CliError::Manifest(format!("invalid TOML: {e}")))?;
        let manifest = Self::from(file);

        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate the manifest.
    ///
    /// Names must be non-empty and unique per kind, since they form the
    /// state key. Credentials must be present. Enumerated settings are not
    /// checked here; the reconciler rejects them before contacting the
    /// service.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid entry.
    pub fn validate(&self) -> Result<()> {
        check_names("datadog", self.datadog.iter().map(|c| c.name.as_str()))?;
        check_names("newrelic", self.newrelic.iter().map(|c| c.name.as_str()))?;

        for channel in &self.datadog {
            if channel.settings.api_key.expose().trim().is_empty() {
                return Err(missing_setting("datadog", &channel.name, "api_key"));
            }
        }
        for channel in &self.newrelic {
            if channel.settings.account_id <= 0 {
                return Err(CliError::Manifest(format!(
                    "newrelic channel '{}': account_id must be positive",
                    channel.name
                )));
            }
            if channel.settings.insert_key.expose().trim().is_empty() {
                return Err(missing_setting("newrelic", &channel.name, "insert_key"));
            }
        }
        Ok(())
    }

    /// Returns the number of declared channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.datadog.len() + self.newrelic.len()
    }

    /// Returns true if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn missing_setting(kind: &str, name: &str, field: &str) -> CliError {
    CliError::Manifest(format!("{kind} channel '{name}': {field} cannot be empty"))
}

fn check_names<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(CliError::Manifest(format!(
                "{kind} channel name cannot be empty"
            )));
        }
        if !seen.insert(name) {
            return Err(CliError::Manifest(format!(
                "duplicate {kind} channel name '{name}'"
            )));
        }
    }
    Ok(())
}
