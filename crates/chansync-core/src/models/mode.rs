//! Update mode selecting which halves of a plan a run computes and applies.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChansyncError;

/// Run-scoped update mode. Immutable for the lifetime of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateMode {
    /// Only propose models that became available.
    #[serde(rename = "add_new")]
    AddOnly,
    /// Only propose models that are no longer served.
    #[default]
    #[serde(rename = "remove_invalid")]
    RemoveOnly,
    /// Both halves.
    #[serde(rename = "full_update")]
    Full,
}

impl UpdateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateMode::AddOnly => "add_new",
            UpdateMode::RemoveOnly => "remove_invalid",
            UpdateMode::Full => "full_update",
        }
    }

    /// Whether the add half is computed and applied.
    pub fn adds(&self) -> bool {
        matches!(self, UpdateMode::AddOnly | UpdateMode::Full)
    }

    /// Whether the remove half is computed and applied.
    pub fn removes(&self) -> bool {
        matches!(self, UpdateMode::RemoveOnly | UpdateMode::Full)
    }
}

impl FromStr for UpdateMode {
    type Err = ChansyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add_new" | "add-only" | "add_only" | "add" => Ok(UpdateMode::AddOnly),
            "remove_invalid" | "remove-only" | "remove_only" | "remove" => {
                Ok(UpdateMode::RemoveOnly)
            }
            "full_update" | "full" => Ok(UpdateMode::Full),
            other => Err(ChansyncError::Config {
                message: format!(
                    "Unknown update mode '{}' (expected add_new, remove_invalid or full_update)",
                    other
                ),
            }),
        }
    }
}

impl std::fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_halves() {
        assert!(UpdateMode::AddOnly.adds());
        assert!(!UpdateMode::AddOnly.removes());
        assert!(!UpdateMode::RemoveOnly.adds());
        assert!(UpdateMode::RemoveOnly.removes());
        assert!(UpdateMode::Full.adds() && UpdateMode::Full.removes());
    }

    #[test]
    fn test_mode_parse_wire_and_aliases() {
        for mode in [UpdateMode::AddOnly, UpdateMode::RemoveOnly, UpdateMode::Full] {
            assert_eq!(mode.as_str().parse::<UpdateMode>().unwrap(), mode);
        }
        assert_eq!("Full".parse::<UpdateMode>().unwrap(), UpdateMode::Full);
        assert_eq!("add-only".parse::<UpdateMode>().unwrap(), UpdateMode::AddOnly);
        assert!("sideways".parse::<UpdateMode>().is_err());
    }

    #[test]
    fn test_mode_serde_uses_wire_names() {
        let json = serde_json::to_string(&UpdateMode::Full).unwrap();
        assert_eq!(json, "\"full_update\"");
        let mode: UpdateMode = serde_json::from_str("\"add_new\"").unwrap();
        assert_eq!(mode, UpdateMode::AddOnly);
    }

    #[test]
    fn test_default_mode_is_remove_only() {
        assert_eq!(UpdateMode::default(), UpdateMode::RemoveOnly);
    }
}
