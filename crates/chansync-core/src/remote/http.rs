//! `ChannelApi` over the channel-management server's HTTP API.
//!
//! - `GET  /api/channel/fetch_models/{id}` → `{success, message, data: [..]}`
//! - `PUT  /api/channel/` with `{id, models: "a,b"}` → `{success, message}`
//!
//! A `success: false` envelope is a failure even on HTTP 200.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::HttpClient;
use super::ChannelApi;
use crate::config::{ApiSettings, NetworkConfig};
use crate::models::{join_models, ChannelId};
use crate::{ChansyncError, Result};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_result(self, fallback: &str) -> Result<Option<T>> {
        if self.success {
            Ok(self.data)
        } else {
            let message = if self.message.is_empty() {
                fallback.to_string()
            } else {
                self.message
            };
            Err(ChansyncError::Api {
                message,
                status_code: None,
            })
        }
    }
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    id: ChannelId,
    models: &'a str,
}

/// HTTP implementation of [`ChannelApi`].
pub struct HttpChannelApi {
    settings: ApiSettings,
    client: HttpClient,
}

impl HttpChannelApi {
    pub fn new(settings: ApiSettings) -> Result<Self> {
        let client = HttpClient::new(&settings)?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }
}

#[async_trait]
impl ChannelApi for HttpChannelApi {
    async fn fetch_models(&self, channel_id: ChannelId) -> Result<Vec<String>> {
        let url = self
            .settings
            .endpoint(&format!("{}{}", NetworkConfig::FETCH_MODELS_PATH, channel_id))?;
        let response = self.client.get(&url).await?;
        let envelope: Envelope<serde_json::Value> = self.client.json(response).await?;
        // `data` is only meaningful once `success` holds; failures may carry anything.
        let models: Vec<String> = match envelope.into_result("Failed to fetch models")? {
            Some(data) => serde_json::from_value(data)?,
            None => Vec::new(),
        };

        debug!(channel_id, count = models.len(), "Fetched upstream models");
        Ok(models)
    }

    async fn update_models(&self, channel_id: ChannelId, models: &[String]) -> Result<()> {
        let url = self.settings.endpoint(NetworkConfig::UPDATE_CHANNEL_PATH)?;
        let joined = join_models(models);
        let body = UpdateRequest {
            id: channel_id,
            models: &joined,
        };
        let response = self.client.put_json(&url, &body).await?;
        let envelope: Envelope<serde_json::Value> = self.client.json(response).await?;
        envelope.into_result("Failed to update channel")?;

        debug!(channel_id, count = models.len(), "Updated channel models");
        Ok(())
    }
}
