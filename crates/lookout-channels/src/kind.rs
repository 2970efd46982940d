//! Channel kind capabilities.
//!
//! A [`ChannelKind`] is the small capability set the generic reconciler
//! needs from each channel type: how to translate declared settings into a
//! wire payload, how to copy echoed wire data back into settings, and
//! whether a delivery test is available.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::types::ChannelType;

/// Capabilities of one alert channel type.
pub trait ChannelKind: Send + Sync + 'static {
    /// Declared channel-specific settings.
    type Settings: Clone
        + Default
        + PartialEq
        + fmt::Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync;

    /// Channel-specific data as exchanged with the remote service.
    type Data: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync;

    /// The remote type tag.
    const CHANNEL_TYPE: ChannelType;

    /// Whether the remote service can run a delivery test for this type.
    const SUPPORTS_TEST: bool = true;

    /// Translates declared settings into wire data.
    ///
    /// Must be pure: no network or state access.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Validation` if an enumerated setting is
    /// outside its allow-list.
    fn translate(settings: &Self::Settings) -> Result<Self::Data>;

    /// Copies the data the server stored back into declared settings, so a
    /// read exposes drift.
    fn echo(data: &Self::Data, settings: &mut Self::Settings);
}
