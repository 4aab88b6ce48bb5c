//! Chansync CLI - plan and apply batch model updates for channels.
//!
//! Reads a channel export, asks the channel-management server which models
//! each upstream serves, and prints the resulting plans as JSON on stdout.
//! `apply --yes` then writes the approved model lists back. Logs go to
//! stderr so stdout stays machine-readable.

mod skip;

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chansync_core::{
    load_channels, ApiSettings, BatchPhase, BatchRun, BatchSnapshot, CancellationToken,
    ChannelStatus, HttpChannelApi, OverrideState, UpdateMode,
};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use skip::SkipEntry;

#[derive(Parser, Debug)]
#[command(name = "chansync")]
#[command(about = "Reconcile channel model lists against what their upstreams serve")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute plans and print them without writing anything
    Plan(PlanArgs),
    /// Compute plans, apply vetoes and write the approved model lists
    Apply(ApplyArgs),
}

impl Command {
    fn common(&self) -> &CommonArgs {
        match self {
            Command::Plan(args) => &args.common,
            Command::Apply(args) => &args.common,
        }
    }
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Leave one planned change out (repeatable)
    #[arg(long = "skip", value_name = "add|remove:ID:MODEL")]
    skips: Vec<SkipEntry>,

    /// Write the approved lists; without it `apply` only prints the plans
    #[arg(short, long)]
    yes: bool,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON file with the channels to process
    #[arg(long)]
    channels: PathBuf,

    /// Channel-management server root URL
    #[arg(long, env = "CHANSYNC_BASE_URL")]
    base_url: String,

    /// Access token sent as a bearer token
    #[arg(long, env = "CHANSYNC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Operator user id sent alongside the token
    #[arg(long, env = "CHANSYNC_USER_ID")]
    user_id: Option<String>,

    /// add_new, remove_invalid or full_update
    #[arg(long, default_value = "remove_invalid")]
    mode: UpdateMode,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl CommonArgs {
    fn settings(&self) -> Result<ApiSettings> {
        let mut settings = ApiSettings::new(&self.base_url)?
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(token) = &self.token {
            settings = settings.with_access_token(token);
        }
        if let Some(user_id) = &self.user_id {
            settings = settings.with_user_id(user_id);
        }
        Ok(settings)
    }
}

/// Exit status for a run cut short by Ctrl-C.
const INTERRUPTED_EXIT_CODE: u8 = 130;

/// How a finished invocation maps onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    /// A channel failed, or the run could not start
    Failed,
    /// Interrupted before every channel was processed
    Stopped,
}

impl Outcome {
    fn of(snapshot: &BatchSnapshot) -> Self {
        let any_failed = snapshot
            .channels
            .iter()
            .any(|c| matches!(c.status, ChannelStatus::PlanFailed | ChannelStatus::Failed));

        match snapshot.phase {
            BatchPhase::Error => Outcome::Failed,
            BatchPhase::Stopped => Outcome::Stopped,
            _ if any_failed => Outcome::Failed,
            _ => Outcome::Success,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failed => ExitCode::FAILURE,
            Outcome::Stopped => ExitCode::from(INTERRUPTED_EXIT_CODE),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.command.common().debug);

    let outcome = run(cli.command).await?;
    Ok(outcome.into())
}

fn init_logging(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();
}

async fn run(command: Command) -> Result<Outcome> {
    let (common, apply) = match command {
        Command::Plan(args) => (args.common, None),
        Command::Apply(args) => (args.common, Some((args.skips, args.yes))),
    };

    let channels = load_channels(&common.channels)
        .with_context(|| format!("Failed to load channels from {}", common.channels.display()))?;
    let api = HttpChannelApi::new(common.settings()?)?;

    let mut batch = BatchRun::new(channels, common.mode);
    info!(
        run_id = %batch.run_id(),
        mode = %common.mode,
        server = %api.settings().base_url,
        "Starting batch run"
    );
    watch_ctrl_c(batch.cancellation_token());

    let phase = match batch.plan(&api).await {
        Ok(phase) => phase,
        Err(e) => {
            print_snapshot(&batch.snapshot())?;
            return Err(e.into());
        }
    };

    if let Some((skips, yes)) = apply {
        if phase == BatchPhase::PlanReview {
            apply_skips(&mut batch, &skips);
            if yes {
                batch.execute(&api).await?;
            } else {
                warn!("Nothing written: pass --yes to apply the plans");
            }
        }
    }

    let snapshot = batch.snapshot();
    print_snapshot(&snapshot)?;
    Ok(Outcome::of(&snapshot))
}

fn apply_skips(batch: &mut BatchRun, skips: &[SkipEntry]) {
    for skip in skips {
        let planned = batch
            .channel(skip.channel_id)
            .is_some_and(|state| skip.matches(&state.plan));
        if !planned {
            warn!("Skip {} does not match any planned change", skip);
        }
        if let Err(e) =
            batch.set_override(skip.channel_id, skip.kind, &skip.model, OverrideState::Inactive)
        {
            warn!("Ignoring skip {}: {}", skip, e);
        }
    }
}

fn watch_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if handle_interrupts(tokio::signal::ctrl_c, &token).await {
            std::process::exit(i32::from(INTERRUPTED_EXIT_CODE));
        }
    });
}

/// The first interrupt stops the run after the current channel. Returns
/// `true` when a second one arrives, meaning the caller should exit without
/// waiting for the in-flight request.
async fn handle_interrupts<F, Fut>(mut next_interrupt: F, token: &CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if next_interrupt().await.is_err() {
        return false;
    }
    warn!("Interrupt received, stopping after the current channel (Ctrl-C again to quit)");
    token.cancel();

    if next_interrupt().await.is_err() {
        return false;
    }
    warn!("Second interrupt received, exiting");
    true
}

fn print_snapshot(snapshot: &BatchSnapshot) -> Result<()> {
    // Intentional stdout: the snapshot is the command's output.
    println!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}
