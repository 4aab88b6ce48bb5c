//! Stop flag shared between a batch run and whoever may interrupt it.
//!
//! The orchestrator reads the flag only between channels. A fetch or update
//! that has already been sent always completes and is recorded, so a stopped
//! run never leaves a channel half-written.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Handle for stopping a batch run from outside it.
///
/// Every clone points at the same flag. `BatchRun::cancellation_token` hands
/// one out, typically to a signal handler.
///
/// ```
/// use chansync_core::{BatchRun, BatchPhase, UpdateMode};
///
/// let run = BatchRun::new(Vec::new(), UpdateMode::Full);
/// let token = run.cancellation_token();
/// token.cancel();
/// assert_eq!(run.phase(), BatchPhase::Idle);
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    stop: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop before its next channel.
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Re-arm the flag for a restarted run. Tokens handed out earlier stay
    /// attached and can stop the new run too.
    pub(crate) fn reset(&self) {
        self.stop.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_lets_run_continue() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn test_handed_out_clone_stops_owner() {
        let owner = CancellationToken::new();
        let handler = owner.clone();

        handler.cancel();
        assert!(owner.is_cancelled());
    }

    #[test]
    fn test_reset_rearms_every_clone() {
        let owner = CancellationToken::new();
        let handler = owner.clone();
        handler.cancel();

        owner.reset();
        assert!(!handler.is_cancelled());

        handler.cancel();
        assert!(owner.is_cancelled());
    }
}
