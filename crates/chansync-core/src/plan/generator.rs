//! Plan generation: the add/remove diff between a channel's model list and
//! what its upstream currently serves.
//!
//! Aliases are the reason this is more than a set difference. An alias is
//! alive while its canonical target is served, and a canonical name already
//! reachable through a listed alias is not proposed again on its own.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::mapping::ModelMapping;
use crate::models::UpdateMode;

/// Proposed diff for one channel in one run.
///
/// `to_add` never intersects the channel's current models and `to_remove`
/// is always a subset of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// The halves of this plan that `mode` lets through.
    pub fn visible(&self, mode: UpdateMode) -> Plan {
        Plan {
            to_add: if mode.adds() { self.to_add.clone() } else { Vec::new() },
            to_remove: if mode.removes() {
                self.to_remove.clone()
            } else {
                Vec::new()
            },
        }
    }

    /// Apply the plan to `current`: removals dropped in place, additions
    /// appended in plan order.
    pub fn apply_to(&self, current: &[String]) -> Vec<String> {
        let removed: HashSet<&str> = self.to_remove.iter().map(String::as_str).collect();
        current
            .iter()
            .filter(|m| !removed.contains(m.as_str()))
            .chain(self.to_add.iter())
            .cloned()
            .collect()
    }
}

/// Compute the plan for one channel.
pub fn generate_plan(
    current: &[String],
    available: &[String],
    mapping: &ModelMapping,
    mode: UpdateMode,
) -> Plan {
    let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
    let available_set: HashSet<&str> = available.iter().map(String::as_str).collect();

    // Canonical names already covered by an alias the channel lists.
    let used_as_target: HashSet<&str> = mapping
        .iter()
        .filter(|(alias, _)| current_set.contains(alias))
        .map(|(_, target)| target)
        .collect();

    let mut plan = Plan::default();

    if mode.adds() {
        let mut seen = HashSet::new();
        for model in available {
            let name = model.as_str();
            if !current_set.contains(name) && !used_as_target.contains(name) && seen.insert(name)
            {
                plan.to_add.push(model.clone());
            }
        }
    }

    if mode.removes() {
        let mut seen = HashSet::new();
        for model in current {
            let name = model.as_str();
            let stale = match mapping.target_of(name) {
                // An alias name that is itself served stays, even with a dead target.
                Some(target) => !available_set.contains(target) && !available_set.contains(name),
                None => !available_set.contains(name),
            };
            if stale && seen.insert(name) {
                plan.to_remove.push(model.clone());
            }
        }
    }

    plan
}
