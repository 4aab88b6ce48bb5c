//! HTTP client for the channel-management server.
//!
//! Wraps reqwest with:
//! - Configurable timeout and user agent
//! - Default credential headers sent on every request
//! - Status checking that surfaces the server's own error message

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::{ApiSettings, NetworkConfig};
use crate::{ChansyncError, Result};

/// Error body shape shared by the server's JSON responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// HTTP client bound to one server's credentials.
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a client from server settings.
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .default_headers(default_headers(settings)?)
            .build()
            .map_err(|e| ChansyncError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e),
            })?;

        Ok(Self {
            client,
            timeout: settings.timeout,
        })
    }

    /// Make a GET request.
    pub async fn get(&self, url: &Url) -> Result<Response> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.transport_error("GET", url, e))?;

        check_response_status(response).await
    }

    /// Make a PUT request with a JSON body.
    pub async fn put_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &Url,
        body: &T,
    ) -> Result<Response> {
        debug!("PUT {}", url);
        let response = self
            .client
            .put(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error("PUT", url, e))?;

        check_response_status(response).await
    }

    /// Read the response body and decode it as JSON.
    ///
    /// The client timeout also covers the body, so a stalled read reports the
    /// configured timeout like a stalled `send()` does.
    pub async fn json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let url = response.url().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error("Reading body of", &url, e))?;

        Ok(serde_json::from_slice(&body)?)
    }

    fn transport_error(&self, action: &str, url: &Url, err: reqwest::Error) -> ChansyncError {
        if err.is_timeout() {
            ChansyncError::Timeout(self.timeout)
        } else {
            ChansyncError::Network {
                message: format!("{} {} failed: {}", action, url, err),
                source: Some(err),
            }
        }
    }
}

fn default_headers(settings: &ApiSettings) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    if let Some(token) = settings.access_token.as_deref() {
        let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            ChansyncError::Config {
                message: "Access token contains characters not allowed in a header".to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, value);
    }

    if let Some(user_id) = settings.user_id.as_deref() {
        let name = HeaderName::from_bytes(NetworkConfig::USER_ID_HEADER.as_bytes()).map_err(
            |e| ChansyncError::Config {
                message: format!("Invalid user id header name: {}", e),
            },
        )?;
        let value = HeaderValue::from_str(user_id).map_err(|_| ChansyncError::Config {
            message: "User id contains characters not allowed in a header".to_string(),
        })?;
        headers.insert(name, value);
    }

    Ok(headers)
}

/// Pass 2xx responses through; turn anything else into `ChansyncError::Api`.
async fn check_response_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .map(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status));

    Err(ChansyncError::Api {
        message,
        status_code: Some(status.as_u16()),
    })
}
