//! Operator vetoes over individual plan entries.
//!
//! Every entry of a plan is active unless the store holds an explicit
//! `Inactive` for it. Seeding writes explicit `Active` entries for
//! visibility, but lookups never depend on them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::ChannelId;
use crate::plan::Plan;

/// Which half of a plan an override targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    Add,
    Remove,
}

impl OverrideKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideKind::Add => "add",
            OverrideKind::Remove => "remove",
        }
    }
}

impl std::fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Toggle state of one plan entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideState {
    #[default]
    Active,
    Inactive,
}

impl OverrideState {
    pub fn toggled(self) -> Self {
        match self {
            OverrideState::Active => OverrideState::Inactive,
            OverrideState::Inactive => OverrideState::Active,
        }
    }
}

/// Per-channel override tables, one per plan half.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOverrides {
    #[serde(default)]
    pub add: HashMap<String, OverrideState>,
    #[serde(default)]
    pub remove: HashMap<String, OverrideState>,
}

impl ChannelOverrides {
    fn table(&self, kind: OverrideKind) -> &HashMap<String, OverrideState> {
        match kind {
            OverrideKind::Add => &self.add,
            OverrideKind::Remove => &self.remove,
        }
    }

    fn table_mut(&mut self, kind: OverrideKind) -> &mut HashMap<String, OverrideState> {
        match kind {
            OverrideKind::Add => &mut self.add,
            OverrideKind::Remove => &mut self.remove,
        }
    }
}

/// Override store for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanOverrideStore {
    channels: HashMap<ChannelId, ChannelOverrides>,
}

impl PlanOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset a channel's overrides to every plan entry active.
    pub fn seed(&mut self, channel_id: ChannelId, plan: &Plan) {
        let overrides = ChannelOverrides {
            add: plan
                .to_add
                .iter()
                .map(|m| (m.clone(), OverrideState::Active))
                .collect(),
            remove: plan
                .to_remove
                .iter()
                .map(|m| (m.clone(), OverrideState::Active))
                .collect(),
        };
        self.channels.insert(channel_id, overrides);
    }

    /// Effective state of an entry. Absent entries are active.
    pub fn state(&self, channel_id: ChannelId, kind: OverrideKind, model: &str) -> OverrideState {
        self.channels
            .get(&channel_id)
            .and_then(|overrides| overrides.table(kind).get(model))
            .copied()
            .unwrap_or_default()
    }

    pub fn is_active(&self, channel_id: ChannelId, kind: OverrideKind, model: &str) -> bool {
        self.state(channel_id, kind, model) == OverrideState::Active
    }

    /// Set an entry's state explicitly.
    pub fn set(
        &mut self,
        channel_id: ChannelId,
        kind: OverrideKind,
        model: &str,
        state: OverrideState,
    ) {
        self.channels
            .entry(channel_id)
            .or_default()
            .table_mut(kind)
            .insert(model.to_string(), state);
    }

    /// Flip an entry and return its new state.
    pub fn toggle(&mut self, channel_id: ChannelId, kind: OverrideKind, model: &str) -> OverrideState {
        let next = self.state(channel_id, kind, model).toggled();
        self.set(channel_id, kind, model, next);
        next
    }

    /// Keep the models of `models` that are active, preserving order.
    pub fn filter_active(
        &self,
        channel_id: ChannelId,
        kind: OverrideKind,
        models: &[String],
    ) -> Vec<String> {
        models
            .iter()
            .filter(|m| self.is_active(channel_id, kind, m))
            .cloned()
            .collect()
    }

    pub fn channel(&self, channel_id: ChannelId) -> Option<&ChannelOverrides> {
        self.channels.get(&channel_id)
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }

    /// Owned copy taken when execution starts.
    pub fn snapshot(&self) -> PlanOverrideStore {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> Plan {
        Plan {
            to_add: vec!["gpt-4o".into(), "o3".into()],
            to_remove: vec!["gpt-3.5".into()],
        }
    }

    #[test]
    fn test_absence_means_active() {
        let store = PlanOverrideStore::new();
        assert_eq!(store.state(1, OverrideKind::Add, "anything"), OverrideState::Active);
        assert!(store.is_active(42, OverrideKind::Remove, "x"));
    }

    #[test]
    fn test_seed_marks_all_active() {
        let mut store = PlanOverrideStore::new();
        store.seed(1, &plan());

        let overrides = store.channel(1).unwrap();
        assert_eq!(overrides.add.len(), 2);
        assert_eq!(overrides.remove.get("gpt-3.5"), Some(&OverrideState::Active));
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut store = PlanOverrideStore::new();
        store.seed(1, &plan());

        assert_eq!(store.toggle(1, OverrideKind::Add, "o3"), OverrideState::Inactive);
        assert!(!store.is_active(1, OverrideKind::Add, "o3"));
        assert_eq!(store.toggle(1, OverrideKind::Add, "o3"), OverrideState::Active);
        assert!(store.is_active(1, OverrideKind::Add, "o3"));
    }

    #[test]
    fn test_toggle_without_seed() {
        let mut store = PlanOverrideStore::new();
        assert_eq!(store.toggle(5, OverrideKind::Remove, "m"), OverrideState::Inactive);
        assert!(store.is_active(5, OverrideKind::Add, "m"));
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut store = PlanOverrideStore::new();
        store.set(1, OverrideKind::Add, "m", OverrideState::Inactive);
        assert!(store.is_active(1, OverrideKind::Remove, "m"));
        assert!(store.is_active(2, OverrideKind::Add, "m"));
    }

    #[test]
    fn test_filter_active_preserves_order() {
        let mut store = PlanOverrideStore::new();
        store.seed(1, &plan());
        store.toggle(1, OverrideKind::Add, "gpt-4o");

        let active = store.filter_active(1, OverrideKind::Add, &plan().to_add);
        assert_eq!(active, vec!["o3".to_string()]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = PlanOverrideStore::new();
        store.seed(1, &plan());
        let snapshot = store.snapshot();

        store.toggle(1, OverrideKind::Remove, "gpt-3.5");
        assert!(snapshot.is_active(1, OverrideKind::Remove, "gpt-3.5"));

        store.clear();
        assert!(store.channel(1).is_none());
    }
}
