//! `--skip` vetoes of the form `add:<channel id>:<model>` or
//! `remove:<channel id>:<model>`.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use chansync_core::{ChannelId, OverrideKind, Plan};

/// One plan entry the operator does not want applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipEntry {
    pub kind: OverrideKind,
    pub channel_id: ChannelId,
    pub model: String,
}

impl SkipEntry {
    /// Whether the entry appears in the matching half of `plan`.
    pub fn matches(&self, plan: &Plan) -> bool {
        let half = match self.kind {
            OverrideKind::Add => &plan.to_add,
            OverrideKind::Remove => &plan.to_remove,
        };
        half.iter().any(|m| *m == self.model)
    }
}

impl FromStr for SkipEntry {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        // Model names may themselves contain ':'.
        let mut parts = s.splitn(3, ':');

        let kind = match parts.next().map(str::trim) {
            Some("add") => OverrideKind::Add,
            Some("remove") => OverrideKind::Remove,
            _ => bail!("expected 'add:<id>:<model>' or 'remove:<id>:<model>', got '{}'", s),
        };
        let channel_id = parts
            .next()
            .ok_or_else(|| anyhow!("missing channel id in '{}'", s))?
            .trim()
            .parse::<ChannelId>()
            .with_context(|| format!("invalid channel id in '{}'", s))?;
        let model = parts
            .next()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| anyhow!("missing model name in '{}'", s))?;

        Ok(Self {
            kind,
            channel_id,
            model: model.to_string(),
        })
    }
}

impl fmt::Display for SkipEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind, self.channel_id, self.model)
    }
}
