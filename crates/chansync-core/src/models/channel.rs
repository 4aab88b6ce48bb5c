//! Channel snapshots as exported by the channel-management server.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ModelListConfig;
use crate::error::{ChansyncError, Result};

/// Stable channel identifier.
pub type ChannelId = i64;

/// A channel snapshot: its id, display name, comma-joined model list and
/// optional alias table blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub models: String,
    #[serde(default)]
    pub model_mapping: Option<String>,
}

impl Channel {
    pub fn new(id: ChannelId, name: impl Into<String>, models: &[&str]) -> Self {
        Self {
            id,
            name: name.into(),
            models: models.join(","),
            model_mapping: None,
        }
    }

    /// Attach a serialized alias table.
    pub fn with_mapping(mut self, mapping: impl Into<String>) -> Self {
        self.model_mapping = Some(mapping.into());
        self
    }

    /// Parsed model list in display order.
    pub fn current_models(&self) -> Vec<String> {
        parse_models(&self.models)
    }
}

/// Split a comma-joined model list.
///
/// Entries are trimmed, empty entries dropped, and repeats collapsed onto
/// their first occurrence.
pub fn parse_models(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(ModelListConfig::DELIMITER)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .filter(|m| seen.insert(*m))
        .map(str::to_string)
        .collect()
}

/// Join a model list into its wire representation.
pub fn join_models(models: &[String]) -> String {
    let mut delimiter = [0u8; 4];
    let delimiter = ModelListConfig::DELIMITER.encode_utf8(&mut delimiter);
    models.join(delimiter)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChannelDocument {
    List(Vec<Channel>),
    Envelope { data: ChannelData },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChannelData {
    List(Vec<Channel>),
    Page { items: Vec<Channel> },
}

/// Parse channels from JSON text.
///
/// Accepts a bare array, `{"data": [...]}`, or a paged
/// `{"data": {"items": [...]}}` listing.
pub fn parse_channels(json: &str) -> Result<Vec<Channel>> {
    let document: ChannelDocument = serde_json::from_str(json)?;
    Ok(match document {
        ChannelDocument::List(channels) => channels,
        ChannelDocument::Envelope { data } => match data {
            ChannelData::List(channels) => channels,
            ChannelData::Page { items } => items,
        },
    })
}

/// Read channels from a JSON file on disk.
pub fn load_channels(path: &Path) -> Result<Vec<Channel>> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ChansyncError::io_with_path(e, path))?;
    parse_channels(&content)
}
