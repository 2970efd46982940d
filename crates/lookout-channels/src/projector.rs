//! State projection.
//!
//! Copies the fields the server confirmed into the local state mirror after
//! a successful create, read or update. No validation happens here: records
//! come either from a validated envelope or straight from a server listing.

use crate::kind::ChannelKind;
use crate::types::{ChannelResource, ComputedFields, IntegrationRecord};

/// Which lifecycle step produced the record being projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// After create: the record's identifier becomes the tracked identity.
    Create,
    /// After update: the tracked identity is left as is.
    Update,
    /// After read: channel-specific data is echoed into the settings too.
    Read,
}

/// Projects `record` into `resource`.
pub fn project<K: ChannelKind>(
    record: &IntegrationRecord<K::Data>,
    resource: &mut ChannelResource<K::Settings>,
    projection: Projection,
) {
    if projection == Projection::Create {
        resource.id = Some(record.intg_guid.clone());
    }

    resource.declared.name.clone_from(&record.name);
    resource.declared.enabled = record.is_enabled();
    resource.computed = ComputedFields {
        intg_guid: record.intg_guid.clone(),
        created_or_updated_time: record.created_or_updated_time.clone(),
        created_or_updated_by: record.created_or_updated_by.clone(),
        type_name: record.type_name.clone(),
        org_level: record.is_org_level(),
    };

    if projection == Projection::Read {
        K::echo(&record.data, &mut resource.declared.settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datadog::{Datadog, DatadogData, DatadogSettings};
    use crate::types::{ChannelType, DeclaredChannel, SecretKey};

    fn record(enabled: i32) -> IntegrationRecord<DatadogData> {
        IntegrationRecord {
            intg_guid: "DD_1".to_string(),
            name: "server-name".to_string(),
            created_or_updated_time: "2024-01-22T10:30:00.000Z".to_string(),
            created_or_updated_by: "ops@example.com".to_string(),
            type_name: "Datadog".to_string(),
            channel_type: ChannelType::Datadog,
            enabled,
            is_org: 1,
            data: DatadogData {
                datadog_site: "eu".to_string(),
                datadog_service: "Logs Summary".to_string(),
                api_key: SecretKey::new("****"),
            },
        }
    }

    fn resource() -> ChannelResource<DatadogSettings> {
        ChannelResource::new(DeclaredChannel::new("local-name", DatadogSettings::new("key")))
    }

    #[test]
    fn create_assigns_identity() {
        let mut resource = resource();
        project::<Datadog>(&record(1), &mut resource, Projection::Create);

        assert_eq!(resource.id(), Some("DD_1"));
        assert_eq!(resource.declared.name, "server-name");
        assert!(resource.declared.enabled);
        assert_eq!(resource.computed.intg_guid, "DD_1");
        assert_eq!(resource.computed.created_or_updated_by, "ops@example.com");
        assert_eq!(resource.computed.type_name, "Datadog");
        assert!(resource.computed.org_level);
    }

    #[test]
    fn create_does_not_echo_data() {
        let mut resource = resource();
        project::<Datadog>(&record(1), &mut resource, Projection::Create);
        assert_eq!(resource.declared.settings.datadog_site, "com");
    }

    #[test]
    fn update_keeps_identity() {
        let mut resource = resource();
        resource.id = Some("ORIGINAL".to_string());
        project::<Datadog>(&record(0), &mut resource, Projection::Update);

        assert_eq!(resource.id(), Some("ORIGINAL"));
        assert!(!resource.declared.enabled);
    }

    #[test]
    fn read_echoes_data() {
        let mut resource = resource();
        resource.id = Some("DD_1".to_string());
        project::<Datadog>(&record(1), &mut resource, Projection::Read);

        assert_eq!(resource.declared.settings.datadog_site, "eu");
        assert_eq!(resource.declared.settings.datadog_service, "summary");
        assert_eq!(resource.declared.settings.api_key.expose(), "key");
    }

    #[test]
    fn nonzero_enabled_collapses_to_true() {
        let mut resource = resource();
        project::<Datadog>(&record(2), &mut resource, Projection::Create);
        assert!(resource.declared.enabled);
    }
}
