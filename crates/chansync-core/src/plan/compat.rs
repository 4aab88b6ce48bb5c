//! Mapping compatibility: aliases a channel lists whose canonical target is
//! no longer served upstream.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::mapping::ModelMapping;

/// One alias whose target became unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncompatibleMapping {
    pub alias: String,
    pub target: String,
    /// The alias name is itself served directly. The alias then survives the
    /// plan and the operator should check the mapping instead.
    pub alias_available: bool,
}

impl IncompatibleMapping {
    /// Whether the plan proposes removing this alias.
    pub fn will_be_removed(&self) -> bool {
        !self.alias_available
    }
}

/// Flag every listed alias whose canonical target is missing from `available`.
pub fn check_mapping_compatibility(
    current: &[String],
    available: &[String],
    mapping: &ModelMapping,
) -> Vec<IncompatibleMapping> {
    let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
    let available_set: HashSet<&str> = available.iter().map(String::as_str).collect();

    mapping
        .iter()
        .filter(|(alias, target)| current_set.contains(alias) && !available_set.contains(target))
        .map(|(alias, target)| IncompatibleMapping {
            alias: alias.to_string(),
            target: target.to_string(),
            alias_available: available_set.contains(alias),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_flags_dead_target() {
        let mapping: ModelMapping = [("old-alias", "gpt-3.5")].into_iter().collect();
        let flagged = check_mapping_compatibility(&list(&["old-alias"]), &[], &mapping);
        assert_eq!(
            flagged,
            vec![IncompatibleMapping {
                alias: "old-alias".into(),
                target: "gpt-3.5".into(),
                alias_available: false,
            }]
        );
        assert!(flagged[0].will_be_removed());
    }

    #[test]
    fn test_ignores_unlisted_alias_and_live_target() {
        let mapping: ModelMapping = [("unlisted", "gone"), ("live", "gpt-4o")]
            .into_iter()
            .collect();
        let flagged =
            check_mapping_compatibility(&list(&["live"]), &list(&["gpt-4o"]), &mapping);
        assert!(flagged.is_empty());
    }

    #[test]
    fn test_reports_directly_available_alias() {
        let mapping: ModelMapping = [("gpt-4", "gpt-4-0613")].into_iter().collect();
        let flagged = check_mapping_compatibility(&list(&["gpt-4"]), &list(&["gpt-4"]), &mapping);
        assert_eq!(flagged.len(), 1);
        assert!(flagged[0].alias_available);
        assert!(!flagged[0].will_be_removed());
    }
}
