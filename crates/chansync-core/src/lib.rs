//! Chansync Core - batch reconciliation of channel model lists.
//!
//! A channel declares which models it routes. Over time its upstream starts
//! serving new models and retires old ones. This crate computes, per
//! channel, which models to add and remove, lets an operator veto individual
//! entries, and then writes the approved lists back one channel at a time.
//!
//! The remote server is reached only through the [`ChannelApi`] trait, so a
//! run can be driven against [`HttpChannelApi`] or any other implementation.
//!
//! # Example
//!
//! ```rust,ignore
//! use chansync_core::{ApiSettings, BatchRun, HttpChannelApi, OverrideKind, UpdateMode};
//!
//! #[tokio::main]
//! async fn main() -> chansync_core::Result<()> {
//!     let settings = ApiSettings::new("http://localhost:3000")?
//!         .with_access_token("token")
//!         .with_user_id("1");
//!     let api = HttpChannelApi::new(settings)?;
//!     let channels = chansync_core::load_channels("channels.json".as_ref())?;
//!
//!     let mut run = BatchRun::new(channels, UpdateMode::Full);
//!     run.plan(&api).await?;
//!     run.toggle_override(7, OverrideKind::Remove, "gpt-4-0314")?;
//!
//!     let summary = run.execute(&api).await?;
//!     println!("{} succeeded, {} failed", summary.success, summary.failed);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod cancel;
pub mod config;
pub mod error;
pub mod mapping;
pub mod models;
pub mod overrides;
pub mod plan;
pub mod remote;

// Re-export commonly used types
pub use batch::{
    BatchPhase, BatchRun, BatchSnapshot, ChannelRunState, ChannelStatus, PhaseProgress,
    PlanFailure, ProgressHandle, ProgressSnapshot, Summary, SummaryDetail,
};
pub use cancel::CancellationToken;
pub use config::ApiSettings;
pub use error::{ChansyncError, Result};
pub use mapping::{parse_model_mapping, ModelMapping};
pub use models::{load_channels, parse_channels, Channel, ChannelId, UpdateMode};
pub use overrides::{OverrideKind, OverrideState, PlanOverrideStore};
pub use plan::{check_mapping_compatibility, generate_plan, IncompatibleMapping, Plan};
pub use remote::{ChannelApi, HttpChannelApi};
