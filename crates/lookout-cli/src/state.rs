//! Local state file.
//!
//! Tracks every managed integration under a `<kind>.<name>` key, persisting
//! the tracked identifier, the declared fields and the server-computed
//! fields as JSON. Saves go through a temporary file and a rename so an
//! interrupted write never truncates the previous state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lookout_channels::{
    ChannelKind, ChannelResource, ChannelType, Datadog, DatadogSettings, NewRelic,
    NewRelicSettings,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CliError, Result};

/// Current state file format version.
pub const STATE_VERSION: u32 = 1;

/// Returns the state key of a channel.
#[must_use]
pub fn state_key(channel: ChannelType, name: &str) -> String {
    format!("{}.{name}", channel.label())
}

/// A tracked integration of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoredResource {
    /// A Datadog integration.
    Datadog(ChannelResource<DatadogSettings>),
    /// A New Relic Insights integration.
    Newrelic(ChannelResource<NewRelicSettings>),
}

impl StoredResource {
    /// Returns the channel type.
    #[must_use]
    pub const fn channel_type(&self) -> ChannelType {
        match self {
            Self::Datadog(_) => ChannelType::Datadog,
            Self::Newrelic(_) => ChannelType::NewRelic,
        }
    }

    /// Returns the tracked identifier.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Datadog(resource) => resource.id(),
            Self::Newrelic(resource) => resource.id(),
        }
    }

    /// Returns the integration name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Datadog(resource) => &resource.declared.name,
            Self::Newrelic(resource) => &resource.declared.name,
        }
    }

    /// Returns the state key derived from kind and name.
    #[must_use]
    pub fn key(&self) -> String {
        state_key(self.channel_type(), self.name())
    }
}

/// A channel kind that can be stored in the state file.
pub trait StateKind: ChannelKind {
    /// Wraps a resource for storage.
    fn wrap(resource: ChannelResource<Self::Settings>) -> StoredResource;

    /// Unwraps a stored resource of this kind.
    fn from_stored(stored: StoredResource) -> Option<ChannelResource<Self::Settings>>;

    /// Renders settings for display, secrets redacted.
    fn describe(settings: &Self::Settings) -> Vec<(&'static str, String)>;
}

impl StateKind for Datadog {
    fn wrap(resource: ChannelResource<DatadogSettings>) -> StoredResource {
        StoredResource::Datadog(resource)
    }

    fn from_stored(stored: StoredResource) -> Option<ChannelResource<DatadogSettings>> {
        match stored {
            StoredResource::Datadog(resource) => Some(resource),
            StoredResource::Newrelic(_) => None,
        }
    }

    fn describe(settings: &DatadogSettings) -> Vec<(&'static str, String)> {
        vec![
            ("datadog_site", settings.datadog_site.clone()),
            ("datadog_service", settings.datadog_service.clone()),
            ("api_key", settings.api_key.to_string()),
        ]
    }
}

impl StateKind for NewRelic {
    fn wrap(resource: ChannelResource<NewRelicSettings>) -> StoredResource {
        StoredResource::Newrelic(resource)
    }

    fn from_stored(stored: StoredResource) -> Option<ChannelResource<NewRelicSettings>> {
        match stored {
            StoredResource::Newrelic(resource) => Some(resource),
            StoredResource::Datadog(_) => None,
        }
    }

    fn describe(settings: &NewRelicSettings) -> Vec<(&'static str, String)> {
        vec![
            ("account_id", settings.account_id.to_string()),
            ("insert_key", settings.insert_key.to_string()),
        ]
    }
}

/// Serialized state file contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    /// Format version.
    pub version: u32,
    /// When the state was last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Tracked integrations by key.
    #[serde(default)]
    pub resources: BTreeMap<String, StoredResource>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: None,
            resources: BTreeMap::new(),
        }
    }
}

/// The state file bound to its path.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    file: StateFile,
}

impl StateStore {
    /// Opens the state at `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// was written by a newer version.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = match fs::read_to_string(&path) {
            Ok(content) => parse(&path, &content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no state file, starting empty");
                StateFile::default()
            }
            Err(e) => {
                return Err(CliError::State(format!(
                    "failed to read '{}': {e}",
                    path.display()
                )));
            }
        };

        Ok(Self { path, file })
    }

    /// Returns the state file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the state contents.
    #[must_use]
    pub const fn file(&self) -> &StateFile {
        &self.file
    }

    /// Writes the state to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save(&mut self) -> Result<()> {
        self.file.updated_at = Some(Utc::now());
        let json = serde_json::to_string_pretty(&self.file)
            .map_err(|e| CliError::State(format!("failed to serialize state: {e}")))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).map_err(|e| {
            CliError::State(format!("failed to write '{}': {e}", tmp.display()))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            CliError::State(format!("failed to replace '{}': {e}", self.path.display()))
        })?;

        debug!(path = %self.path.display(), resources = self.file.resources.len(), "saved state");
        Ok(())
    }

    /// Returns the tracked keys in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.file.resources.keys().cloned().collect()
    }

    /// Returns true if `key` is tracked.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.file.resources.contains_key(key)
    }

    /// Returns the resource tracked under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StoredResource> {
        self.file.resources.get(key)
    }

    /// Tracks `resource` under `key`, replacing any previous entry.
    pub fn insert(&mut self, key: impl Into<String>, resource: StoredResource) {
        self.file.resources.insert(key.into(), resource);
    }

    /// Stops tracking `key`.
    pub fn remove(&mut self, key: &str) -> Option<StoredResource> {
        self.file.resources.remove(key)
    }

    /// Takes the resource of kind `K` tracked under `key`.
    ///
    /// A resource of another kind stays in place.
    pub fn take<K: StateKind>(&mut self, key: &str) -> Option<ChannelResource<K::Settings>> {
        let stored = self.file.resources.remove(key)?;
        if stored.channel_type() == K::CHANNEL_TYPE {
            K::from_stored(stored)
        } else {
            self.file.resources.insert(key.to_string(), stored);
            None
        }
    }

    /// Returns the number of tracked resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.file.resources.len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file.resources.is_empty()
    }
}

fn parse(path: &Path, content: &str) -> Result<StateFile> {
    let file: StateFile = serde_json::from_str(content)
        .map_err(|e| CliError::State(format!("invalid state file '{}': {e}", path.display())))?;

    if file.version > STATE_VERSION {
        return Err(CliError::State(format!(
            "state file '{}' has version {}, this build supports up to {STATE_VERSION}",
            path.display(),
            file.version
        )));
    }
    Ok(file)
}
