//! Batch reconciliation of channel model lists.
//!
//! A [`BatchRun`] moves through `Idle → Planning → PlanReview → Executing →
//! Completed`, with `Stopped` reachable from any non-terminal phase and
//! `Error` when there is nothing to process.

mod orchestrator;
mod progress;
mod types;

pub use orchestrator::BatchRun;
pub use progress::{PhaseProgress, ProgressHandle, ProgressSnapshot};
pub use types::{
    BatchPhase, BatchSnapshot, ChannelRunState, ChannelStatus, PlanFailure, Summary,
    SummaryDetail,
};
