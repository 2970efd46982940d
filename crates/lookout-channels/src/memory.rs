//! In-memory control plane.
//!
//! [`InMemoryApi`] implements [`AlertChannelApi`] over a local map of
//! integration records. It journals every call and can inject failures, so
//! the reconciler's failure paths can be exercised without a network.

use std::collections::{BTreeMap, HashMap};

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::api::{AlertChannelApi, ApiError, ApiOperation, ApiResult};
use crate::kind::ChannelKind;
use crate::types::{ChannelPayload, ChannelType, IntegrationRecord, ResponseEnvelope};

/// A call received by [`InMemoryApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// `create` with the submitted name.
    Create {
        /// The integration name.
        name: String,
    },
    /// `update` of an identifier.
    Update {
        /// The integration identifier.
        id: String,
    },
    /// `get` of an identifier.
    Get {
        /// The integration identifier.
        id: String,
    },
    /// `delete` of an identifier.
    Delete {
        /// The integration identifier.
        id: String,
    },
    /// `test` of an identifier.
    Test {
        /// The integration identifier.
        id: String,
    },
}

impl ApiCall {
    /// Returns the operation of this call.
    #[must_use]
    pub const fn operation(&self) -> ApiOperation {
        match self {
            Self::Create { .. } => ApiOperation::Create,
            Self::Update { .. } => ApiOperation::Update,
            Self::Get { .. } => ApiOperation::Get,
            Self::Delete { .. } => ApiOperation::Delete,
            Self::Test { .. } => ApiOperation::Test,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<String, IntegrationRecord<Value>>,
    calls: Vec<ApiCall>,
    fail_next: HashMap<ApiOperation, String>,
    failing_tests: Option<String>,
    next_response: Option<Vec<IntegrationRecord<Value>>>,
}

/// An in-memory alert channel service.
#[derive(Debug)]
pub struct InMemoryApi {
    principal: String,
    inner: Mutex<Inner>,
}

impl Default for InMemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryApi {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::with_principal("lookout@localhost")
    }

    /// Creates an empty service that stamps records with `principal`.
    #[must_use]
    pub fn with_principal(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    // ============ Failure Injection ============

    /// Makes the next call of `operation` fail with `message`.
    pub fn fail_next(&self, operation: ApiOperation, message: impl Into<String>) {
        self.inner.lock().fail_next.insert(operation, message.into());
    }

    /// Makes every delivery test fail with `message` until cleared.
    pub fn fail_tests(&self, message: impl Into<String>) {
        self.inner.lock().failing_tests = Some(message.into());
    }

    /// Lets delivery tests pass again.
    pub fn pass_tests(&self) {
        self.inner.lock().failing_tests = None;
    }

    /// Replaces the records of the next create, update or get response.
    ///
    /// The call still takes effect on the stored records; only the
    /// envelope the caller sees is replaced.
    pub fn respond_next_with(&self, records: Vec<IntegrationRecord<Value>>) {
        self.inner.lock().next_response = Some(records);
    }

    // ============ Inspection ============

    /// Returns every call received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.inner.lock().calls.clone()
    }

    /// Returns the number of calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner.lock().calls.len()
    }

    /// Forgets the call journal.
    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Returns true if an integration with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().records.contains_key(id)
    }

    /// Returns the stored record for `id`.
    #[must_use]
    pub fn record(&self, id: &str) -> Option<IntegrationRecord<Value>> {
        self.inner.lock().records.get(id).cloned()
    }

    /// Returns the number of stored integrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// Returns true if no integrations are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    // ============ Out-of-band Changes ============

    /// Stores a record directly, bypassing the journal.
    pub fn insert(&self, record: IntegrationRecord<Value>) {
        self.inner
            .lock()
            .records
            .insert(record.intg_guid.clone(), record);
    }

    /// Removes a record directly, as if deleted outside this client.
    pub fn remove(&self, id: &str) -> Option<IntegrationRecord<Value>> {
        self.inner.lock().records.remove(id)
    }

    // ============ Internals ============

    fn begin(inner: &mut Inner, call: ApiCall) -> ApiResult<()> {
        let operation = call.operation();
        inner.calls.push(call);
        match inner.fail_next.remove(&operation) {
            Some(message) => Err(ApiError::new(operation, message).with_status(500)),
            None => Ok(()),
        }
    }

    fn stamp(&self, record: &mut IntegrationRecord<Value>) {
        record.created_or_updated_time = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        record.created_or_updated_by.clone_from(&self.principal);
    }

    fn store<D: Serialize>(
        &self,
        operation: ApiOperation,
        id: String,
        payload: &ChannelPayload<D>,
    ) -> ApiResult<IntegrationRecord<Value>> {
        let data = serde_json::to_value(&payload.data)
            .map_err(|e| ApiError::new(operation, format!("invalid payload: {e}")).with_status(400))?;

        let mut record = IntegrationRecord {
            intg_guid: id,
            name: payload.name.clone(),
            created_or_updated_time: String::new(),
            created_or_updated_by: String::new(),
            type_name: payload.channel_type.display_name().to_string(),
            channel_type: payload.channel_type,
            enabled: payload.enabled,
            is_org: 0,
            data,
        };
        self.stamp(&mut record);
        Ok(record)
    }

    fn respond<D: DeserializeOwned>(
        operation: ApiOperation,
        inner: &mut Inner,
        records: Vec<IntegrationRecord<Value>>,
    ) -> ApiResult<ResponseEnvelope<D>> {
        let records = inner.next_response.take().unwrap_or(records);
        let data = records
            .into_iter()
            .map(|record| decode(operation, record))
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(ResponseEnvelope::from_records(data))
    }

    fn listing(inner: &Inner, channel: ChannelType) -> Vec<IntegrationRecord<Value>> {
        inner
            .records
            .values()
            .filter(|record| record.channel_type == channel)
            .cloned()
            .collect()
    }
}

fn decode<D: DeserializeOwned>(
    operation: ApiOperation,
    record: IntegrationRecord<Value>,
) -> ApiResult<IntegrationRecord<D>> {
    record.try_map_data(|data| {
        serde_json::from_value(data)
            .map_err(|e| ApiError::new(operation, format!("malformed record data: {e}")))
    })
}

fn new_guid(channel: ChannelType) -> String {
    format!(
        "{}_{}",
        channel.as_str(),
        Uuid::new_v4().simple().to_string().to_uppercase()
    )
}

impl AlertChannelApi for InMemoryApi {
    async fn create<K: ChannelKind>(
        &self,
        payload: &ChannelPayload<K::Data>,
    ) -> ApiResult<ResponseEnvelope<K::Data>> {
        let mut inner = self.inner.lock();
        Self::begin(
            &mut inner,
            ApiCall::Create {
                name: payload.name.clone(),
            },
        )?;

        let record = self.store(ApiOperation::Create, new_guid(K::CHANNEL_TYPE), payload)?;
        debug!(id = %record.intg_guid, name = %record.name, "stored integration");
        inner
            .records
            .insert(record.intg_guid.clone(), record.clone());

        Self::respond(ApiOperation::Create, &mut inner, vec![record])
    }

    async fn update<K: ChannelKind>(
        &self,
        id: &str,
        payload: &ChannelPayload<K::Data>,
    ) -> ApiResult<ResponseEnvelope<K::Data>> {
        let mut inner = self.inner.lock();
        Self::begin(&mut inner, ApiCall::Update { id: id.to_string() })?;

        let Some(existing) = inner.records.get(id) else {
            return Err(
                ApiError::new(ApiOperation::Update, format!("integration {id} not found"))
                    .with_status(404),
            );
        };
        let is_org = existing.is_org;

        let mut record = self.store(ApiOperation::Update, id.to_string(), payload)?;
        record.is_org = is_org;
        inner.records.insert(id.to_string(), record.clone());

        Self::respond(ApiOperation::Update, &mut inner, vec![record])
    }

    async fn get<K: ChannelKind>(&self, id: &str) -> ApiResult<ResponseEnvelope<K::Data>> {
        let mut inner = self.inner.lock();
        Self::begin(&mut inner, ApiCall::Get { id: id.to_string() })?;

        let listing = Self::listing(&inner, K::CHANNEL_TYPE);
        Self::respond(ApiOperation::Get, &mut inner, listing)
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        let mut inner = self.inner.lock();
        Self::begin(&mut inner, ApiCall::Delete { id: id.to_string() })?;

        match inner.records.remove(id) {
            Some(_) => Ok(()),
            None => Err(
                ApiError::new(ApiOperation::Delete, format!("integration {id} not found"))
                    .with_status(404),
            ),
        }
    }

    async fn test(&self, id: &str) -> ApiResult<()> {
        let mut inner = self.inner.lock();
        Self::begin(&mut inner, ApiCall::Test { id: id.to_string() })?;

        if !inner.records.contains_key(id) {
            return Err(
                ApiError::new(ApiOperation::Test, format!("integration {id} not found"))
                    .with_status(404),
            );
        }
        match &inner.failing_tests {
            Some(message) => Err(ApiError::new(ApiOperation::Test, message.clone()).with_status(400)),
            None => Ok(()),
        }
    }
}
