//! Collaborator boundary: the two remote calls a batch run depends on.
//!
//! The orchestrator only talks to [`ChannelApi`]. [`HttpChannelApi`] is the
//! implementation for a channel-management server; tests plug in fakes.

mod client;
mod http;

pub use client::HttpClient;
pub use http::HttpChannelApi;

use async_trait::async_trait;

use crate::models::ChannelId;
use crate::Result;

/// Remote operations consumed by a batch run.
#[async_trait]
pub trait ChannelApi: Send + Sync {
    /// Fetch the models the channel's upstream currently serves.
    async fn fetch_models(&self, channel_id: ChannelId) -> Result<Vec<String>>;

    /// Replace the channel's model list.
    async fn update_models(&self, channel_id: ChannelId, models: &[String]) -> Result<()>;
}

#[async_trait]
impl<T: ChannelApi + ?Sized> ChannelApi for std::sync::Arc<T> {
    async fn fetch_models(&self, channel_id: ChannelId) -> Result<Vec<String>> {
        (**self).fetch_models(channel_id).await
    }

    async fn update_models(&self, channel_id: ChannelId, models: &[String]) -> Result<()> {
        (**self).update_models(channel_id, models).await
    }
}
