//! Datadog alert channel.
//!
//! Ships logs or events to Datadog. The destination site and the level of
//! detail are enumerated; the API key is opaque.

use serde::{Deserialize, Serialize};

use crate::allowlist::AllowList;
use crate::error::Result;
use crate::kind::ChannelKind;
use crate::types::{ChannelType, SecretKey};

/// Where Datadog stores the shipped data.
pub const DATADOG_SITES: AllowList = AllowList::new("datadog_site", &[("com", "com"), ("eu", "eu")]);

/// The level of detail shipped to Datadog.
pub const DATADOG_SERVICES: AllowList = AllowList::new(
    "datadog_service",
    &[
        ("details", "Logs Details"),
        ("summary", "Logs Summary"),
        ("events_summary", "Events Summary"),
    ],
);

fn default_site() -> String {
    "com".to_string()
}

fn default_service() -> String {
    "details".to_string()
}

/// Declared Datadog settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatadogSettings {
    /// Destination site, one of [`DATADOG_SITES`].
    #[serde(default = "default_site")]
    pub datadog_site: String,
    /// Detail level, one of [`DATADOG_SERVICES`].
    #[serde(default = "default_service")]
    pub datadog_service: String,
    /// The Datadog API key.
    pub api_key: SecretKey,
}

impl DatadogSettings {
    /// Creates settings for the default site and detail level.
    #[must_use]
    pub fn new(api_key: impl Into<SecretKey>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Sets the destination site.
    #[must_use]
    pub fn site(mut self, site: impl Into<String>) -> Self {
        self.datadog_site = site.into();
        self
    }

    /// Sets the detail level.
    #[must_use]
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.datadog_service = service.into();
        self
    }
}

impl Default for DatadogSettings {
    fn default() -> Self {
        Self {
            datadog_site: default_site(),
            datadog_service: default_service(),
            api_key: SecretKey::default(),
        }
    }
}

/// Datadog data as exchanged with the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DatadogData {
    /// Destination site.
    pub datadog_site: String,
    /// Detail level, in wire form.
    #[serde(rename = "DATADOG_TYPE")]
    pub datadog_service: String,
    /// The Datadog API key.
    #[serde(default)]
    pub api_key: SecretKey,
}

/// The Datadog channel kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct Datadog;

impl ChannelKind for Datadog {
    type Settings = DatadogSettings;
    type Data = DatadogData;

    const CHANNEL_TYPE: ChannelType = ChannelType::Datadog;

    fn translate(settings: &DatadogSettings) -> Result<DatadogData> {
        let site = DATADOG_SITES.resolve(&settings.datadog_site)?;
        let service = DATADOG_SERVICES.resolve(&settings.datadog_service)?;

        Ok(DatadogData {
            datadog_site: site.to_string(),
            datadog_service: service.to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    fn echo(data: &DatadogData, settings: &mut DatadogSettings) {
        // The server masks the key, so only the enumerated fields are echoed.
        settings.datadog_site = DATADOG_SITES
            .declared_for(&data.datadog_site)
            .map_or_else(|| data.datadog_site.clone(), str::to_string);
        settings.datadog_service = DATADOG_SERVICES
            .declared_for(&data.datadog_service)
            .map_or_else(|| data.datadog_service.clone(), str::to_string);
    }
}
