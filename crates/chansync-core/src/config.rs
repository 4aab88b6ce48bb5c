//! Centralized configuration for chansync.
//!
//! Constants for the channel-management API plus the per-server settings
//! used to build an HTTP collaborator.

use std::time::Duration;

use url::Url;

use crate::error::{ChansyncError, Result};

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const USER_AGENT: &'static str = concat!("chansync/", env!("CARGO_PKG_VERSION"));
    /// Header carrying the operator's user id alongside the access token.
    pub const USER_ID_HEADER: &'static str = "New-Api-User";
    pub const FETCH_MODELS_PATH: &'static str = "/api/channel/fetch_models/";
    pub const UPDATE_CHANNEL_PATH: &'static str = "/api/channel/";
}

/// Model list representation on the wire.
pub struct ModelListConfig;

impl ModelListConfig {
    pub const DELIMITER: char = ',';
}

/// Connection settings for one channel-management server.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Server root, e.g. `https://gateway.example.com/`.
    pub base_url: Url,
    /// Sent as `Authorization: Bearer <token>` when set.
    pub access_token: Option<String>,
    /// Sent as the user-id header when set.
    pub user_id: Option<String>,
    pub timeout: Duration,
}

impl ApiSettings {
    /// Create settings for a server, validating the base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut url = Url::parse(base_url.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ChansyncError::Config {
                message: format!("Unsupported URL scheme: {}", url.scheme()),
            });
        }
        // Keep a trailing slash so `join` appends instead of replacing the last segment.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            base_url: url,
            access_token: None,
            user_id: None,
            timeout: NetworkConfig::REQUEST_TIMEOUT,
        })
    }

    /// Set the access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the operator user id.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve an API path (leading slash allowed) against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}
