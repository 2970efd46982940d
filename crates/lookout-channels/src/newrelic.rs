//! New Relic Insights alert channel.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::kind::ChannelKind;
use crate::types::{ChannelType, SecretKey};

/// Declared New Relic settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewRelicSettings {
    /// The New Relic account identifier.
    pub account_id: i64,
    /// The Insights insert key.
    pub insert_key: SecretKey,
}

impl NewRelicSettings {
    /// Creates settings for an account.
    #[must_use]
    pub fn new(account_id: i64, insert_key: impl Into<SecretKey>) -> Self {
        Self {
            account_id,
            insert_key: insert_key.into(),
        }
    }
}

/// New Relic data as exchanged with the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct NewRelicData {
    /// The New Relic account identifier.
    pub account_id: i64,
    /// The Insights insert key.
    pub insert_key: SecretKey,
}

/// The New Relic Insights channel kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewRelic;

impl ChannelKind for NewRelic {
    type Settings = NewRelicSettings;
    type Data = NewRelicData;

    const CHANNEL_TYPE: ChannelType = ChannelType::NewRelic;

    fn translate(settings: &NewRelicSettings) -> Result<NewRelicData> {
        Ok(NewRelicData {
            account_id: settings.account_id,
            insert_key: settings.insert_key.clone(),
        })
    }

    fn echo(data: &NewRelicData, settings: &mut NewRelicSettings) {
        settings.account_id = data.account_id;
        settings.insert_key = data.insert_key.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_passes_fields_through() {
        let data = NewRelic::translate(&NewRelicSettings::new(2_338_053, "NRII-key")).unwrap();
        assert_eq!(data.account_id, 2_338_053);
        assert_eq!(data.insert_key.expose(), "NRII-key");
    }

    #[test]
    fn echo_overwrites_settings() {
        let mut settings = NewRelicSettings::new(1, "old");
        let data = NewRelicData {
            account_id: 42,
            insert_key: SecretKey::new("new"),
        };
        NewRelic::echo(&data, &mut settings);
        assert_eq!(settings, NewRelicSettings::new(42, "new"));
    }

    #[test]
    fn data_wire_shape() {
        let data = NewRelic::translate(&NewRelicSettings::new(7, "k")).unwrap();
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["ACCOUNT_ID"], 7);
        assert_eq!(json["INSERT_KEY"], "k");
    }

    #[test]
    fn settings_deserialize_from_manifest_shape() {
        let settings: NewRelicSettings =
            serde_json::from_str(r#"{"account_id": 99, "insert_key": "abc"}"#).unwrap();
        assert_eq!(settings.account_id, 99);
        assert_eq!(settings.insert_key.expose(), "abc");
    }

    #[test]
    fn settings_require_credentials() {
        assert!(serde_json::from_str::<NewRelicSettings>(r#"{"account_id": 99}"#).is_err());
        assert!(serde_json::from_str::<NewRelicSettings>(r#"{"insert_key": "abc"}"#).is_err());
    }
}
