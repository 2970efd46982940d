//! Core types for alert channel integrations.
//!
//! This module provides the data model shared by every channel kind:
//! - [`ChannelType`]: The remote type tag of an integration
//! - [`SecretKey`]: A credential that never prints in cleartext
//! - [`DeclaredChannel`]: User-authored intent for one integration
//! - [`ChannelPayload`]: The request body submitted on create and update
//! - [`IntegrationRecord`]: The server's canonical representation
//! - [`ResponseEnvelope`]: The wrapper returned by create, update and get
//! - [`ChannelResource`]: The local state mirror tracked between operations

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The remote type tag of an alert channel integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChannelType {
    /// Datadog log and event shipping.
    #[serde(rename = "DATADOG")]
    Datadog,
    /// New Relic Insights metrics.
    #[serde(rename = "NEW_RELIC_INSIGHTS")]
    NewRelic,
}

impl ChannelType {
    /// All known channel types.
    pub const ALL: [Self; 2] = [Self::Datadog, Self::NewRelic];

    /// Returns the wire name of this type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Datadog => "DATADOG",
            Self::NewRelic => "NEW_RELIC_INSIGHTS",
        }
    }

    /// Returns the short lowercase label used in manifests and state keys.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Datadog => "datadog",
            Self::NewRelic => "newrelic",
        }
    }

    /// Returns the human-readable type name the server reports.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Datadog => "Datadog",
            Self::NewRelic => "New Relic Insights",
        }
    }

    /// Parses a short label back into a channel type.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Encodes the declared enabled flag into the server's tri-state integer.
#[must_use]
pub const fn encode_enabled(enabled: bool) -> i32 {
    if enabled { 1 } else { 0 }
}

/// Collapses the server's tri-state enabled integer into a boolean.
///
/// Any nonzero value counts as enabled.
#[must_use]
pub const fn decode_enabled(flag: i32) -> bool {
    flag != 0
}

/// A channel credential.
///
/// The inner string is zeroized on drop, and `Debug`/`Display` never
/// reveal it. Serialization is transparent so the credential can be
/// submitted to the remote service and persisted in local state.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecretKey(String);

impl SecretKey {
    /// Wraps a credential.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the cleartext credential.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if no credential is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<&str> for SecretKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SecretKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

const fn default_true() -> bool {
    true
}

/// User-authored intent for one alert channel integration.
///
/// `S` holds the channel-specific settings of a [`ChannelKind`](crate::ChannelKind).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredChannel<S> {
    /// The integration name.
    pub name: String,
    /// Whether the integration should be enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether to run a delivery test after create and update.
    #[serde(default = "default_true")]
    pub test_integration: bool,
    /// Channel-specific settings.
    #[serde(flatten)]
    pub settings: S,
}

impl<S> DeclaredChannel<S> {
    /// Creates a declaration that is enabled and tested by default.
    #[must_use]
    pub fn new(name: impl Into<String>, settings: S) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            test_integration: true,
            settings,
        }
    }

    /// Sets whether the integration is enabled.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets whether the delivery test runs after create and update.
    #[must_use]
    pub fn test_integration(mut self, test: bool) -> Self {
        self.test_integration = test;
        self
    }
}

/// The request body submitted on create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ChannelPayload<D> {
    /// The identifier being replaced, set on update only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intg_guid: Option<String>,
    /// The integration name.
    pub name: String,
    /// The channel type tag.
    #[serde(rename = "TYPE")]
    pub channel_type: ChannelType,
    /// Tri-state enabled flag (`1` enabled, `0` disabled).
    pub enabled: i32,
    /// Channel-specific data.
    pub data: D,
}

/// The server's canonical representation of an integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct IntegrationRecord<D> {
    /// Globally unique identifier assigned by the server.
    pub intg_guid: String,
    /// The integration name.
    pub name: String,
    /// When the record was created or last updated.
    #[serde(default)]
    pub created_or_updated_time: String,
    /// The principal that created or last updated the record.
    #[serde(default)]
    pub created_or_updated_by: String,
    /// Server-computed type name.
    #[serde(default)]
    pub type_name: String,
    /// The channel type tag.
    #[serde(rename = "TYPE")]
    pub channel_type: ChannelType,
    /// Tri-state enabled flag.
    pub enabled: i32,
    /// Organization-level flag.
    #[serde(default)]
    pub is_org: i32,
    /// Channel-specific data stored by the server.
    pub data: D,
}

impl<D> IntegrationRecord<D> {
    /// Returns the effective enabled state.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        decode_enabled(self.enabled)
    }

    /// Returns true if the integration is defined at organization level.
    #[must_use]
    pub const fn is_org_level(&self) -> bool {
        self.is_org == 1
    }

    /// Converts the channel-specific data, keeping every other field.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`.
    pub fn try_map_data<T, E>(
        self,
        f: impl FnOnce(D) -> std::result::Result<T, E>,
    ) -> std::result::Result<IntegrationRecord<T>, E> {
        Ok(IntegrationRecord {
            data: f(self.data)?,
            intg_guid: self.intg_guid,
            name: self.name,
            created_or_updated_time: self.created_or_updated_time,
            created_or_updated_by: self.created_or_updated_by,
            type_name: self.type_name,
            channel_type: self.channel_type,
            enabled: self.enabled,
            is_org: self.is_org,
        })
    }
}

/// A response carrying zero or more integration records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<D> {
    /// Whether the server reported success.
    #[serde(default)]
    pub ok: bool,
    /// Server-side status message.
    #[serde(default)]
    pub message: String,
    /// The integration records.
    #[serde(default = "Vec::new")]
    pub data: Vec<IntegrationRecord<D>>,
}

impl<D> ResponseEnvelope<D> {
    /// Creates an envelope around the given records.
    #[must_use]
    pub fn from_records(data: Vec<IntegrationRecord<D>>) -> Self {
        Self {
            ok: true,
            message: "SUCCESS".to_string(),
            data,
        }
    }

    /// Creates an envelope carrying exactly one record.
    #[must_use]
    pub fn single(record: IntegrationRecord<D>) -> Self {
        Self::from_records(vec![record])
    }

    /// Creates an envelope with no records.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_records(Vec::new())
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Server-computed fields copied into local state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedFields {
    /// The identifier as echoed by the server.
    pub intg_guid: String,
    /// When the record was created or last updated.
    pub created_or_updated_time: String,
    /// The principal that created or last updated the record.
    pub created_or_updated_by: String,
    /// Server-computed type name.
    pub type_name: String,
    /// Organization-level flag.
    pub org_level: bool,
}

/// Lifecycle of a tracked resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// No remote integration is tracked.
    Unmanaged,
    /// A remote integration is tracked by identifier.
    Registered,
}

impl Lifecycle {
    /// Returns the lifecycle as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unmanaged => "unmanaged",
            Self::Registered => "registered",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The local state mirror of one integration.
///
/// Pairs the declared configuration with the tracked identity and the
/// fields the server computed on the last successful create, read or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelResource<S> {
    /// The tracked identifier, `None` while unmanaged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The declared configuration.
    pub declared: DeclaredChannel<S>,
    /// Server-computed fields.
    #[serde(default)]
    pub computed: ComputedFields,
}

impl<S> ChannelResource<S> {
    /// Creates an unmanaged resource for a declaration.
    #[must_use]
    pub fn new(declared: DeclaredChannel<S>) -> Self {
        Self {
            id: None,
            declared,
            computed: ComputedFields::default(),
        }
    }

    /// Creates a resource tracking an existing identifier.
    #[must_use]
    pub fn tracking(id: impl Into<String>, declared: DeclaredChannel<S>) -> Self {
        Self {
            id: Some(id.into()),
            declared,
            computed: ComputedFields::default(),
        }
    }

    /// Returns the tracked identifier.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the lifecycle of this resource.
    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        if self.id.is_some() {
            Lifecycle::Registered
        } else {
            Lifecycle::Unmanaged
        }
    }

    /// Returns true if a remote integration is tracked.
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        self.id.is_some()
    }

    /// Forgets the tracked identity and the computed fields.
    pub fn clear_identity(&mut self) {
        self.id = None;
        self.computed = ComputedFields::default();
    }
}
