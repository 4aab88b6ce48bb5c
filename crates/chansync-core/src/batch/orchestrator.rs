//! Two-phase batch run over a set of channels.
//!
//! Phase 1 fetches every channel's upstream models in input order and
//! computes a plan per channel. The run then waits in `PlanReview` until the
//! caller either executes or stops it. Phase 2 applies each approved plan
//! with one remote update per channel.
//!
//! Channels are processed strictly one at a time. Cancellation is polled
//! between channels only, so a started remote call always completes and is
//! recorded.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::progress::ProgressHandle;
use super::types::{
    BatchPhase, BatchSnapshot, ChannelRunState, ChannelStatus, PlanFailure, Summary,
    SummaryDetail,
};
use crate::cancel::CancellationToken;
use crate::error::{ChansyncError, Result};
use crate::mapping::parse_model_mapping;
use crate::models::{Channel, ChannelId, UpdateMode};
use crate::overrides::{OverrideKind, OverrideState, PlanOverrideStore};
use crate::plan::{check_mapping_compatibility, generate_plan, Plan};
use crate::remote::ChannelApi;

/// A batch model update run.
///
/// # Example
///
/// ```no_run
/// use chansync_core::batch::{BatchPhase, BatchRun};
/// use chansync_core::{ApiSettings, Channel, HttpChannelApi, UpdateMode};
///
/// # async fn run() -> chansync_core::Result<()> {
/// let api = HttpChannelApi::new(ApiSettings::new("http://localhost:3000")?)?;
/// let channels = vec![Channel::new(1, "openai", &["gpt-4o", "gpt-3.5-turbo"])];
///
/// let mut run = BatchRun::new(channels, UpdateMode::Full);
/// if run.plan(&api).await? == BatchPhase::PlanReview {
///     let summary = run.execute(&api).await?;
///     println!("{} updated, {} failed", summary.success, summary.failed);
/// }
/// # Ok(())
/// # }
/// ```
pub struct BatchRun {
    run_id: Uuid,
    mode: UpdateMode,
    inputs: HashMap<ChannelId, Channel>,
    order: Vec<ChannelId>,
    states: HashMap<ChannelId, ChannelRunState>,
    overrides: PlanOverrideStore,
    phase: BatchPhase,
    token: CancellationToken,
    progress: ProgressHandle,
    summary: Option<Summary>,
    started_at: Option<DateTime<Utc>>,
}

impl BatchRun {
    /// Create a run over `channels`.
    ///
    /// Input order is kept. A repeated channel id keeps its first occurrence.
    pub fn new(channels: Vec<Channel>, mode: UpdateMode) -> Self {
        let mut inputs = HashMap::with_capacity(channels.len());
        let mut order = Vec::with_capacity(channels.len());
        for channel in channels {
            if inputs.contains_key(&channel.id) {
                warn!(channel_id = channel.id, "Duplicate channel in input, keeping the first");
                continue;
            }
            order.push(channel.id);
            inputs.insert(channel.id, channel);
        }

        let mut run = Self {
            run_id: Uuid::new_v4(),
            mode,
            inputs,
            order,
            states: HashMap::new(),
            overrides: PlanOverrideStore::new(),
            phase: BatchPhase::Idle,
            token: CancellationToken::new(),
            progress: ProgressHandle::new(),
            summary: None,
            started_at: None,
        };
        run.reset_states();
        run
    }

    /// Token that stops the run between channels when cancelled.
    ///
    /// Hand it to another task (a signal handler, a UI) to cancel while
    /// `plan` or `execute` is awaiting.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Shared progress counters, readable from any task.
    pub fn progress(&self) -> ProgressHandle {
        self.progress.clone()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn mode(&self) -> UpdateMode {
        self.mode
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    /// Final summary, present once the run reached a terminal phase.
    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    pub fn channel(&self, channel_id: ChannelId) -> Option<&ChannelRunState> {
        self.states.get(&channel_id)
    }

    /// Channel records in input order.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelRunState> + '_ {
        self.order.iter().filter_map(|id| self.states.get(id))
    }

    pub fn overrides(&self) -> &PlanOverrideStore {
        &self.overrides
    }

    /// Phase 1: fetch upstream models and compute a plan for every channel.
    ///
    /// A channel whose fetch fails is marked `PlanFailed` and the loop moves
    /// on. Returns the phase reached: `PlanReview`, or `Stopped` when the
    /// token was cancelled.
    pub async fn plan<A>(&mut self, api: &A) -> Result<BatchPhase>
    where
        A: ChannelApi + ?Sized,
    {
        self.expect_phase("plan", BatchPhase::Idle)?;
        let started_at = Utc::now();
        self.started_at = Some(started_at);

        if self.order.is_empty() {
            warn!(run_id = %self.run_id, "Batch run started with no channels");
            self.finish(BatchPhase::Error, Summary::new(started_at, Vec::new()));
            return Err(ChansyncError::EmptyInput);
        }

        self.phase = BatchPhase::Planning;
        self.progress.start_planning(self.order.len());
        info!(
            run_id = %self.run_id,
            mode = %self.mode,
            channels = self.order.len(),
            "Planning batch model update"
        );

        let order = self.order.clone();
        for channel_id in order {
            if self.token.is_cancelled() {
                info!(run_id = %self.run_id, channel_id, "Planning stopped");
                break;
            }
            self.plan_channel(api, channel_id).await;
            self.progress.advance_planning();
        }

        if self.token.is_cancelled() {
            let summary = Summary::new(started_at, self.plan_failures());
            self.finish(BatchPhase::Stopped, summary);
        } else {
            self.phase = BatchPhase::PlanReview;
            info!(
                run_id = %self.run_id,
                ready = self.count(ChannelStatus::PlanReady),
                failed = self.count(ChannelStatus::PlanFailed),
                "Plans ready for review"
            );
        }

        Ok(self.phase)
    }

    async fn plan_channel<A>(&mut self, api: &A, channel_id: ChannelId)
    where
        A: ChannelApi + ?Sized,
    {
        let Some(channel) = self.inputs.get(&channel_id) else {
            return;
        };
        let current = channel.current_models();
        let mapping = parse_model_mapping(channel.model_mapping.as_deref());
        self.set_status(channel_id, ChannelStatus::Planning);

        let fetched = api.fetch_models(channel_id).await;

        let Some(state) = self.states.get_mut(&channel_id) else {
            return;
        };
        match fetched {
            Ok(available) => {
                let plan = generate_plan(&current, &available, &mapping, self.mode);
                debug!(
                    run_id = %self.run_id,
                    channel_id,
                    to_add = plan.to_add.len(),
                    to_remove = plan.to_remove.len(),
                    "Channel planned"
                );
                self.overrides.seed(channel_id, &plan);
                state.incompatible_mappings =
                    check_mapping_compatibility(&current, &available, &mapping);
                state.available_models = available;
                state.plan = plan;
                state.status = ChannelStatus::PlanReady;
            }
            Err(e) => {
                warn!(run_id = %self.run_id, channel_id, error = %e, "Failed to plan channel");
                state.status = ChannelStatus::PlanFailed;
                state.error = Some(e.to_string());
            }
        }
        state.current_models = current;
        state.mapping = mapping;
    }

    /// Flip the veto on one plan entry of a reviewable channel.
    pub fn toggle_override(
        &mut self,
        channel_id: ChannelId,
        kind: OverrideKind,
        model: &str,
    ) -> Result<OverrideState> {
        self.expect_reviewable(channel_id)?;
        let state = self.overrides.toggle(channel_id, kind, model);
        debug!(channel_id, %kind, model, ?state, "Override toggled");
        Ok(state)
    }

    /// Set the veto state of one plan entry of a reviewable channel.
    pub fn set_override(
        &mut self,
        channel_id: ChannelId,
        kind: OverrideKind,
        model: &str,
        state: OverrideState,
    ) -> Result<()> {
        self.expect_reviewable(channel_id)?;
        self.overrides.set(channel_id, kind, model, state);
        debug!(channel_id, %kind, model, ?state, "Override set");
        Ok(())
    }

    /// Request cancellation.
    ///
    /// While awaiting review this ends the run immediately in `Stopped`.
    /// Loops that are running observe it before their next channel.
    pub fn stop(&mut self) {
        self.token.cancel();
        if self.phase == BatchPhase::PlanReview {
            info!(run_id = %self.run_id, "Run stopped during review");
            let started_at = self.started_at.unwrap_or_else(Utc::now);
            let summary = Summary::new(started_at, self.plan_failures());
            self.finish(BatchPhase::Stopped, summary);
        }
    }

    /// Phase 2: apply the reviewed plans.
    ///
    /// Overrides are read once when execution starts. Channels that failed
    /// to plan are left out. A failing update is recorded on its channel and
    /// in the summary, and the loop moves on.
    pub async fn execute<A>(&mut self, api: &A) -> Result<&Summary>
    where
        A: ChannelApi + ?Sized,
    {
        self.expect_phase("execute", BatchPhase::PlanReview)?;
        let overrides = self.overrides.snapshot();
        let eligible: Vec<ChannelId> = self
            .order
            .iter()
            .copied()
            .filter(|id| {
                self.states
                    .get(id)
                    .is_some_and(|s| s.status == ChannelStatus::PlanReady)
            })
            .collect();

        let started_at = self.started_at.unwrap_or_else(Utc::now);
        let mut summary = Summary::new(started_at, self.plan_failures());

        self.phase = BatchPhase::Executing;
        self.progress.start_execution(eligible.len());
        info!(
            run_id = %self.run_id,
            channels = eligible.len(),
            "Applying batch model update"
        );

        for channel_id in eligible {
            if self.token.is_cancelled() {
                info!(run_id = %self.run_id, channel_id, "Execution stopped");
                break;
            }
            if let Some(detail) = self.execute_channel(api, channel_id, &overrides).await {
                summary.record(detail);
            }
            self.progress.advance_execution();
        }

        let phase = if self.token.is_cancelled() {
            BatchPhase::Stopped
        } else {
            BatchPhase::Completed
        };
        info!(
            run_id = %self.run_id,
            %phase,
            success = summary.success,
            failed = summary.failed,
            "Batch model update finished"
        );
        Ok(self.finish(phase, summary))
    }

    async fn execute_channel<A>(
        &mut self,
        api: &A,
        channel_id: ChannelId,
        overrides: &PlanOverrideStore,
    ) -> Option<SummaryDetail>
    where
        A: ChannelApi + ?Sized,
    {
        let state = self.states.get_mut(&channel_id)?;

        let visible = state.plan.visible(self.mode);
        if visible.is_empty() {
            state.status = ChannelStatus::Success;
            return Some(SummaryDetail::succeeded(state, Vec::new(), Vec::new()));
        }

        state.status = ChannelStatus::Executing;
        let approved = Plan {
            to_add: overrides.filter_active(channel_id, OverrideKind::Add, &visible.to_add),
            to_remove: overrides.filter_active(
                channel_id,
                OverrideKind::Remove,
                &visible.to_remove,
            ),
        };
        if approved.is_empty() {
            debug!(run_id = %self.run_id, channel_id, "Every entry vetoed, no update sent");
            state.status = ChannelStatus::Success;
            return Some(SummaryDetail::succeeded(state, Vec::new(), Vec::new()));
        }

        let models = approved.apply_to(&state.current_models);
        match api.update_models(channel_id, &models).await {
            Ok(()) => {
                info!(
                    run_id = %self.run_id,
                    channel_id,
                    added = approved.to_add.len(),
                    removed = approved.to_remove.len(),
                    "Channel updated"
                );
                state.status = ChannelStatus::Success;
                Some(SummaryDetail::succeeded(
                    state,
                    approved.to_add,
                    approved.to_remove,
                ))
            }
            Err(e) => {
                warn!(run_id = %self.run_id, channel_id, error = %e, "Failed to update channel");
                let message = e.to_string();
                state.status = ChannelStatus::Failed;
                state.error = Some(message.clone());
                Some(SummaryDetail::failed(state, message))
            }
        }
    }

    /// Discard every result of this run and return to `Idle` with the same
    /// channels and mode. Tokens handed out earlier keep working.
    pub fn restart(&mut self) {
        let previous = self.run_id;
        self.run_id = Uuid::new_v4();
        self.reset_states();
        self.overrides.clear();
        self.progress.reset();
        self.token.reset();
        self.summary = None;
        self.started_at = None;
        self.phase = BatchPhase::Idle;
        info!(run_id = %self.run_id, %previous, "Batch run restarted");
    }

    /// Owned view of the whole run.
    pub fn snapshot(&self) -> BatchSnapshot {
        BatchSnapshot {
            run_id: self.run_id,
            mode: self.mode,
            phase: self.phase,
            progress: self.progress.snapshot(),
            channels: self.channels().cloned().collect(),
            overrides: self.overrides.snapshot(),
            summary: self.summary.clone(),
        }
    }

    fn reset_states(&mut self) {
        self.states = self
            .order
            .iter()
            .filter_map(|id| self.inputs.get(id))
            .map(|c| (c.id, ChannelRunState::pending(c.id, &c.name)))
            .collect();
    }

    fn set_status(&mut self, channel_id: ChannelId, status: ChannelStatus) {
        if let Some(state) = self.states.get_mut(&channel_id) {
            state.status = status;
        }
    }

    fn count(&self, status: ChannelStatus) -> usize {
        self.states.values().filter(|s| s.status == status).count()
    }

    fn plan_failures(&self) -> Vec<PlanFailure> {
        self.channels()
            .filter(|s| s.status == ChannelStatus::PlanFailed)
            .map(|s| PlanFailure {
                channel_id: s.channel_id,
                channel_name: s.channel_name.clone(),
                error: s.error.clone().unwrap_or_default(),
            })
            .collect()
    }

    fn finish(&mut self, phase: BatchPhase, mut summary: Summary) -> &Summary {
        summary.finished_at = Utc::now();
        self.phase = phase;
        self.summary.insert(summary)
    }

    fn expect_phase(&self, operation: &str, expected: BatchPhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(ChansyncError::invalid_phase(operation, expected, self.phase))
        }
    }

    fn expect_reviewable(&self, channel_id: ChannelId) -> Result<()> {
        self.expect_phase("change overrides", BatchPhase::PlanReview)?;
        match self.states.get(&channel_id) {
            Some(state) if state.status == ChannelStatus::PlanReady => Ok(()),
            _ => Err(ChansyncError::ChannelNotFound { channel_id }),
        }
    }
}
