//! HTTP transport for the alert channel API.

use std::fmt;

use lookout_channels::{
    AlertChannelApi, ApiError, ApiOperation, ApiResult, ChannelKind, ChannelPayload,
    ResponseEnvelope, SecretKey,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::Result;

const INTEGRATIONS_PATH: &str = "api/v1/external/integrations";
const ALERT_CHANNELS_PATH: &str = "api/v2/AlertChannels";

/// [`AlertChannelApi`] over HTTPS with bearer token authentication.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
    token: SecretKey,
}

impl HttpApi {
    /// Builds a transport from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("lookout/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url()?,
            token: config.api_token.clone(),
        })
    }

    /// Returns the base URL requests are sent under.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, operation: ApiOperation, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::new(operation, format!("invalid endpoint '{path}': {e}")))
    }

    fn integration_path(id: &str) -> String {
        format!("{INTEGRATIONS_PATH}/{id}")
    }

    fn request(&self, operation: ApiOperation, method: Method, url: Url) -> RequestBuilder {
        debug!(operation = %operation, method = %method, url = %url, "sending request");
        self.client
            .request(method, url)
            .bearer_auth(self.token.expose())
            .header("Accept", "application/json")
    }

    async fn send(operation: ApiOperation, request: RequestBuilder) -> ApiResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::new(operation, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await;
        Err(ApiError::new(operation, error_message(status, body)).with_status(status.as_u16()))
    }

    async fn decode<T: DeserializeOwned>(operation: ApiOperation, response: Response) -> ApiResult<T> {
        response
            .json()
            .await
            .map_err(|e| ApiError::new(operation, format!("failed to parse response: {e}")))
    }
}

fn error_message<E: fmt::Display>(
    status: StatusCode,
    body: std::result::Result<String, E>,
) -> String {
    let reason = status.canonical_reason().unwrap_or("unexpected status");
    match body {
        Ok(body) if body.trim().is_empty() => reason.to_string(),
        Ok(body) => body,
        Err(e) => format!("{reason} (failed to read response body: {e})"),
    }
}

/// Keeps only records of `K`'s channel type and decodes their data.
///
/// An identifier of another channel type reads as absent.
fn select_kind<K: ChannelKind>(
    operation: ApiOperation,
    envelope: ResponseEnvelope<Value>,
) -> ApiResult<ResponseEnvelope<K::Data>> {
    let mut data = Vec::with_capacity(envelope.data.len());
    for record in envelope.data {
        if record.channel_type != K::CHANNEL_TYPE {
            debug!(
                id = %record.intg_guid,
                channel = %record.channel_type,
                expected = %K::CHANNEL_TYPE,
                "skipping record of another channel type"
            );
            continue;
        }
        data.push(record.try_map_data(|data| {
            serde_json::from_value(data)
                .map_err(|e| ApiError::new(operation, format!("malformed record data: {e}")))
        })?);
    }

    Ok(ResponseEnvelope {
        ok: envelope.ok,
        message: envelope.message,
        data,
    })
}

impl AlertChannelApi for HttpApi {
    async fn create<K: ChannelKind>(
        &self,
        payload: &ChannelPayload<K::Data>,
    ) -> ApiResult<ResponseEnvelope<K::Data>> {
        let operation = ApiOperation::Create;
        let url = self.endpoint(operation, INTEGRATIONS_PATH)?;

        let request = self.request(operation, Method::POST, url).json(payload);
        let response = Self::send(operation, request).await?;
        Self::decode(operation, response).await
    }

    async fn update<K: ChannelKind>(
        &self,
        id: &str,
        payload: &ChannelPayload<K::Data>,
    ) -> ApiResult<ResponseEnvelope<K::Data>> {
        let operation = ApiOperation::Update;
        let url = self.endpoint(operation, &Self::integration_path(id))?;

        let request = self.request(operation, Method::PATCH, url).json(payload);
        let response = Self::send(operation, request).await?;
        Self::decode(operation, response).await
    }

    async fn get<K: ChannelKind>(&self, id: &str) -> ApiResult<ResponseEnvelope<K::Data>> {
        let operation = ApiOperation::Get;
        let url = self.endpoint(operation, &Self::integration_path(id))?;

        let request = self.request(operation, Method::GET, url);
        match Self::send(operation, request).await {
            Ok(response) => {
                let envelope = Self::decode(operation, response).await?;
                select_kind::<K>(operation, envelope)
            }
            Err(err) if err.is_not_found() => {
                debug!(id = %id, "integration not found");
                Ok(ResponseEnvelope::empty())
            }
            Err(err) => Err(err),
        }
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        let operation = ApiOperation::Delete;
        let url = self.endpoint(operation, &Self::integration_path(id))?;

        let request = self.request(operation, Method::DELETE, url);
        Self::send(operation, request).await?;
        Ok(())
    }

    async fn test(&self, id: &str) -> ApiResult<()> {
        let operation = ApiOperation::Test;
        let url = self.endpoint(operation, &format!("{ALERT_CHANNELS_PATH}/{id}/test"))?;

        let request = self.request(operation, Method::POST, url);
        Self::send(operation, request).await?;
        Ok(())
    }
}
