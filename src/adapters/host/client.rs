//! HTTP client for the host platform's app API.
//!
//! One client serves all three collaborators: app data (interaction
//! snapshots), app settings (builder documents) and the chatbot endpoint.
//!
//! # Endpoints
//!
//! ```text
//! GET    {base}/app-items/{item}/app-data?type=...
//! POST   {base}/app-items/{item}/app-data
//! PATCH  {base}/app-items/{item}/app-data/{id}
//! DELETE {base}/app-items/{item}/app-data/{id}
//! GET    {base}/app-items/{item}/app-settings
//! POST   {base}/app-items/{item}/app-settings
//! PATCH  {base}/app-items/{item}/app-settings/{id}
//! POST   {base}/app-items/{item}/chat-bot
//! ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::{ConfigError, HostConfig, ValidationError};
use crate::domain::exchange::PromptEntry;
use crate::domain::foundation::{ParticipantId, RecordId};
use crate::ports::{
    AppDataFilter, AppDataRecord, AppDataStore, AppSettingRecord, AppSettingsStore, Completion,
    CompletionError, CompletionService, NewAppData, StoreError,
};

/// Host API client.
#[derive(Debug, Clone)]
pub struct HostApiClient {
    client: Client,
    base_url: String,
    item_id: String,
    token: Secret<String>,
    timeout: Duration,
}

impl HostApiClient {
    pub fn new(
        base_url: impl Into<String>,
        item_id: impl Into<String>,
        token: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            item_id: item_id.into(),
            token,
            timeout,
        })
    }

    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// `MissingRequired` when the host section is incomplete, `HttpClient`
    /// when the HTTP client cannot be built with the configured timeout.
    pub fn from_config(config: &HostConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let base_url = config
            .base_url
            .clone()
            .ok_or(ValidationError::MissingRequired("HOST__BASE_URL"))?;
        let item_id = config
            .item_id
            .clone()
            .ok_or(ValidationError::MissingRequired("HOST__ITEM_ID"))?;
        let token = config
            .token
            .clone()
            .ok_or(ValidationError::MissingRequired("HOST__TOKEN"))?;
        Self::new(base_url, item_id, token, config.timeout())
    }

    fn item_url(&self, path: &str) -> String {
        format!("{}/app-items/{}/{}", self.base_url, self.item_id, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.token.expose_secret())
    }

    async fn send_store(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => StoreError::NotFound(body),
            s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
                StoreError::Unavailable(format!("{}: {}", s, body))
            }
            s => StoreError::Rejected(format!("{}: {}", s, body)),
        })
    }

    async fn decode<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, StoreError> {
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Wire types
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct HostMember {
    id: String,
}

#[derive(Debug, Deserialize)]
struct HostAppData {
    id: String,
    #[serde(rename = "type")]
    data_type: String,
    data: Value,
    member: HostMember,
}

impl TryFrom<HostAppData> for AppDataRecord {
    type Error = StoreError;

    fn try_from(raw: HostAppData) -> Result<Self, Self::Error> {
        let owner = ParticipantId::new(raw.member.id)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(AppDataRecord {
            id: RecordId::new(raw.id),
            owner,
            data_type: raw.data_type,
            data: raw.data,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAppDataBody<'a> {
    data: &'a Value,
    #[serde(rename = "type")]
    data_type: &'a str,
    member_id: &'a str,
}

#[derive(Debug, Serialize)]
struct PatchBody<'a> {
    data: &'a Value,
}

#[derive(Debug, Serialize)]
struct CreateSettingBody<'a> {
    name: &'a str,
    data: &'a Value,
}

#[derive(Debug, Deserialize)]
struct HostAppSetting {
    id: String,
    name: String,
    data: Value,
}

impl From<HostAppSetting> for AppSettingRecord {
    fn from(raw: HostAppSetting) -> Self {
        AppSettingRecord {
            id: RecordId::new(raw.id),
            name: raw.name,
            data: raw.data,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Ports
// ════════════════════════════════════════════════════════════════════════════

#[async_trait]
impl AppDataStore for HostApiClient {
    async fn create(&self, owner: &ParticipantId, record: NewAppData) -> Result<AppDataRecord, StoreError> {
        let body = CreateAppDataBody {
            data: &record.data,
            data_type: &record.data_type,
            member_id: owner.as_str(),
        };
        let response = self
            .send_store(self.client.post(self.item_url("app-data")).json(&body))
            .await?;
        let created: HostAppData = Self::decode(response).await?;
        debug!(record_id = %created.id, "Created app data");
        created.try_into()
    }

    async fn patch(&self, id: &RecordId, data: Value) -> Result<AppDataRecord, StoreError> {
        let url = self.item_url(&format!("app-data/{}", id));
        let response = self
            .send_store(self.client.patch(url).json(&PatchBody { data: &data }))
            .await?;
        let patched: HostAppData = Self::decode(response).await?;
        patched.try_into()
    }

    async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        let url = self.item_url(&format!("app-data/{}", id));
        self.send_store(self.client.delete(url)).await?;
        Ok(())
    }

    async fn list(&self, filter: &AppDataFilter) -> Result<Vec<AppDataRecord>, StoreError> {
        let mut request = self.client.get(self.item_url("app-data"));
        if let Some(data_type) = &filter.data_type {
            request = request.query(&[("type", data_type.as_str())]);
        }
        let response = self.send_store(request).await?;
        let raw: Vec<HostAppData> = Self::decode(response).await?;

        let mut records = Vec::with_capacity(raw.len());
        for item in raw {
            let record = AppDataRecord::try_from(item)?;
            if filter.matches(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl AppSettingsStore for HostApiClient {
    async fn list(&self) -> Result<Vec<AppSettingRecord>, StoreError> {
        let response = self.send_store(self.client.get(self.item_url("app-settings"))).await?;
        let raw: Vec<HostAppSetting> = Self::decode(response).await?;
        Ok(raw.into_iter().map(Into::into).collect())
    }

    async fn create(&self, name: &str, data: Value) -> Result<AppSettingRecord, StoreError> {
        let body = CreateSettingBody { name, data: &data };
        let response = self
            .send_store(self.client.post(self.item_url("app-settings")).json(&body))
            .await?;
        let created: HostAppSetting = Self::decode(response).await?;
        Ok(created.into())
    }

    async fn patch(&self, id: &RecordId, data: Value) -> Result<AppSettingRecord, StoreError> {
        let url = self.item_url(&format!("app-settings/{}", id));
        let response = self
            .send_store(self.client.patch(url).json(&PatchBody { data: &data }))
            .await?;
        let patched: HostAppSetting = Self::decode(response).await?;
        Ok(patched.into())
    }
}

#[async_trait]
impl CompletionService for HostApiClient {
    async fn complete(&self, prompt: &[PromptEntry]) -> Result<Completion, CompletionError> {
        let request = self.client.post(self.item_url("chat-bot")).json(prompt);
        let response = self.authorized(request).send().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                }
            } else if e.is_connect() {
                CompletionError::network(format!("Connection failed: {}", e))
            } else {
                CompletionError::network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(completion_error(status, body));
        }

        response
            .json::<Completion>()
            .await
            .map_err(|e| CompletionError::parse(format!("Failed to parse completion: {}", e)))
    }
}

fn completion_error(status: StatusCode, body: String) -> CompletionError {
    match status.as_u16() {
        401 | 403 => CompletionError::AuthenticationFailed,
        429 => CompletionError::RateLimited { retry_after_secs: 30 },
        400 | 413 | 422 => CompletionError::InvalidRequest(body),
        500..=599 => CompletionError::unavailable(format!("Server error {}: {}", status, body)),
        _ => CompletionError::network(format!("Unexpected status {}: {}", status, body)),
    }
}
