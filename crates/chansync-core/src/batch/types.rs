//! Types for batch model update runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::progress::ProgressSnapshot;
use crate::mapping::ModelMapping;
use crate::models::{ChannelId, UpdateMode};
use crate::overrides::PlanOverrideStore;
use crate::plan::{IncompatibleMapping, Plan};

/// Overall phase of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    /// Created, planning not started yet
    Idle,
    /// Fetching upstream models and computing plans
    Planning,
    /// Waiting for the operator to approve or cancel
    PlanReview,
    /// Applying approved plans
    Executing,
    Completed,
    /// Cancelled before every channel was processed
    Stopped,
    /// The run could not start (no channels)
    Error,
}

impl BatchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchPhase::Idle => "idle",
            BatchPhase::Planning => "planning",
            BatchPhase::PlanReview => "plan_review",
            BatchPhase::Executing => "executing",
            BatchPhase::Completed => "completed",
            BatchPhase::Stopped => "stopped",
            BatchPhase::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchPhase::Completed | BatchPhase::Stopped | BatchPhase::Error
        )
    }
}

impl std::fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of one channel within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Pending,
    Planning,
    PlanReady,
    PlanFailed,
    Executing,
    Success,
    Failed,
}

/// Per-channel record of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRunState {
    pub channel_id: ChannelId,
    pub channel_name: String,
    pub status: ChannelStatus,
    /// Upstream models, fetched once during planning.
    pub available_models: Vec<String>,
    /// Channel models as parsed when the channel was planned.
    pub current_models: Vec<String>,
    pub mapping: ModelMapping,
    pub plan: Plan,
    pub incompatible_mappings: Vec<IncompatibleMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChannelRunState {
    pub(crate) fn pending(channel_id: ChannelId, channel_name: &str) -> Self {
        Self {
            channel_id,
            channel_name: channel_name.to_string(),
            status: ChannelStatus::Pending,
            available_models: Vec::new(),
            current_models: Vec::new(),
            mapping: ModelMapping::default(),
            plan: Plan::default(),
            incompatible_mappings: Vec::new(),
            error: None,
        }
    }
}

/// Outcome of one channel processed during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryDetail {
    pub channel_id: ChannelId,
    pub channel_name: String,
    pub success: bool,
    pub added_count: usize,
    pub removed_count: usize,
    pub added_models: Vec<String>,
    pub removed_models: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SummaryDetail {
    pub(crate) fn succeeded(
        state: &ChannelRunState,
        added_models: Vec<String>,
        removed_models: Vec<String>,
    ) -> Self {
        Self {
            channel_id: state.channel_id,
            channel_name: state.channel_name.clone(),
            success: true,
            added_count: added_models.len(),
            removed_count: removed_models.len(),
            added_models,
            removed_models,
            error: None,
        }
    }

    pub(crate) fn failed(state: &ChannelRunState, error: String) -> Self {
        Self {
            channel_id: state.channel_id,
            channel_name: state.channel_name.clone(),
            success: false,
            added_count: 0,
            removed_count: 0,
            added_models: Vec::new(),
            removed_models: Vec::new(),
            error: Some(error),
        }
    }
}

/// A channel whose plan could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFailure {
    pub channel_id: ChannelId,
    pub channel_name: String,
    pub error: String,
}

/// Final report of a run, produced when it reaches a terminal phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub success: usize,
    pub failed: usize,
    pub details: Vec<SummaryDetail>,
    /// Channels left out of execution because planning failed.
    pub plan_failures: Vec<PlanFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl Summary {
    pub(crate) fn new(started_at: DateTime<Utc>, plan_failures: Vec<PlanFailure>) -> Self {
        Self {
            success: 0,
            failed: 0,
            details: Vec::new(),
            plan_failures,
            started_at,
            finished_at: started_at,
        }
    }

    pub(crate) fn record(&mut self, detail: SummaryDetail) {
        if detail.success {
            self.success += 1;
        } else {
            self.failed += 1;
        }
        self.details.push(detail);
    }

    /// Whether any channel failed to plan or to apply.
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || !self.plan_failures.is_empty()
    }
}

/// Owned view of a run for observers and reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSnapshot {
    pub run_id: Uuid,
    pub mode: UpdateMode,
    pub phase: BatchPhase,
    pub progress: ProgressSnapshot,
    /// Channel records in input order.
    pub channels: Vec<ChannelRunState>,
    pub overrides: PlanOverrideStore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}
