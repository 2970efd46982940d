//! Channel payload translation.
//!
//! Turns a [`DeclaredChannel`] into the [`ChannelPayload`] submitted on
//! create and update. Pure: nothing here touches the network or local state,
//! so an invalid declaration fails before any remote call.

use crate::error::Result;
use crate::kind::ChannelKind;
use crate::types::{ChannelPayload, DeclaredChannel, encode_enabled};

/// Translates a declaration into a request payload.
///
/// `intg_guid` is set on update to tag the full-replacement payload with the
/// tracked identifier, and left `None` on create.
///
/// # Errors
///
/// Returns `ChannelError::Validation` if an enumerated setting is outside
/// its allow-list.
pub fn translate<K: ChannelKind>(
    declared: &DeclaredChannel<K::Settings>,
    intg_guid: Option<&str>,
) -> Result<ChannelPayload<K::Data>> {
    let data = K::translate(&declared.settings)?;

    Ok(ChannelPayload {
        intg_guid: intg_guid.map(str::to_string),
        name: declared.name.clone(),
        channel_type: K::CHANNEL_TYPE,
        enabled: encode_enabled(declared.enabled),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datadog::{Datadog, DatadogSettings};
    use crate::error::ChannelError;
    use crate::newrelic::{NewRelic, NewRelicSettings};
    use crate::types::ChannelType;

    #[test]
    fn translate_create_payload() {
        let declared = DeclaredChannel::new(
            "prod-logs",
            DatadogSettings::new("key").site("eu").service("summary"),
        );
        let payload = translate::<Datadog>(&declared, None).unwrap();

        assert_eq!(payload.intg_guid, None);
        assert_eq!(payload.name, "prod-logs");
        assert_eq!(payload.channel_type, ChannelType::Datadog);
        assert_eq!(payload.enabled, 1);
        assert_eq!(payload.data.datadog_site, "eu");
        assert_eq!(payload.data.datadog_service, "Logs Summary");
    }

    #[test]
    fn translate_update_payload_carries_guid() {
        let declared = DeclaredChannel::new("metrics", NewRelicSettings::new(1, "k"));
        let payload = translate::<NewRelic>(&declared, Some("NR_1")).unwrap();
        assert_eq!(payload.intg_guid.as_deref(), Some("NR_1"));
    }

    #[test]
    fn translate_disabled() {
        let declared =
            DeclaredChannel::new("metrics", NewRelicSettings::new(1, "k")).enabled(false);
        let payload = translate::<NewRelic>(&declared, None).unwrap();
        assert_eq!(payload.enabled, 0);
    }

    #[test]
    fn translate_rejects_invalid_enum() {
        let declared = DeclaredChannel::new("x", DatadogSettings::new("k").site("mars"));
        let err = translate::<Datadog>(&declared, None).unwrap_err();
        assert!(matches!(err, ChannelError::Validation { .. }));
    }

    #[test]
    fn payload_debug_never_contains_secret() {
        let declared = DeclaredChannel::new("x", NewRelicSettings::new(1, "NRII-top-secret"));
        let payload = translate::<NewRelic>(&declared, None).unwrap();
        assert!(!format!("{payload:?}").contains("NRII-top-secret"));
    }
}
