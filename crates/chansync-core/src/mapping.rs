//! Alias table resolution.
//!
//! A channel may expose a model under a local alias that forwards to a
//! canonical upstream name. The table is stored as a JSON object blob on the
//! channel; a blob that is absent or malformed resolves to an empty table so
//! that one badly configured channel cannot abort a batch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Alias → canonical model table for one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelMapping {
    entries: BTreeMap<String, String>,
}

impl ModelMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.entries.insert(alias.into(), target.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether `name` is an alias key.
    pub fn is_alias(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Canonical target of `alias`, if it is one.
    pub fn target_of(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(String::as_str)
    }

    /// Whether some alias forwards to `name`.
    pub fn is_target(&self, name: &str) -> bool {
        self.entries.values().any(|target| target == name)
    }

    /// Iterate `(alias, target)` pairs in alias order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(alias, target)| (alias.as_str(), target.as_str()))
    }
}

impl<A: Into<String>, T: Into<String>> FromIterator<(A, T)> for ModelMapping {
    fn from_iter<I: IntoIterator<Item = (A, T)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(alias, target)| (alias.into(), target.into()))
                .collect(),
        }
    }
}

/// Parse a channel's stored alias table.
///
/// Never fails: an absent, blank or malformed blob yields an empty table.
/// The blob must be a JSON object whose values are all strings; anything
/// else is treated as malformed as a whole.
pub fn parse_model_mapping(blob: Option<&str>) -> ModelMapping {
    let Some(raw) = blob.map(str::trim).filter(|s| !s.is_empty()) else {
        return ModelMapping::default();
    };

    match serde_json::from_str::<BTreeMap<String, String>>(raw) {
        Ok(entries) => ModelMapping { entries },
        Err(e) => {
            warn!("Ignoring malformed model mapping: {}", e);
            ModelMapping::default()
        }
    }
}
