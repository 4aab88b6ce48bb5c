//! Thread-safe progress tracking for batch runs.
//!
//! Planning and execution are counted separately. Within a run neither
//! counter ever decreases, so observers polling from another task see a
//! monotonic percentage per phase.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Completed-of-total counter for one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseProgress {
    pub completed: usize,
    pub total: usize,
}

impl PhaseProgress {
    /// Integer percentage, clamped to 0..=100. Zero when there is nothing to do.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.completed.saturating_mul(100) / self.total;
        pct.min(100) as u8
    }

    pub fn is_done(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }
}

/// Point-in-time copy of both counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub planning: PhaseProgress,
    pub execution: PhaseProgress,
}

/// Shared handle to a run's progress. Clones observe the same counters.
#[derive(Debug, Clone, Default)]
pub struct ProgressHandle {
    state: Arc<Mutex<ProgressSnapshot>>,
}

impl ProgressHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current counters.
    pub fn snapshot(&self) -> ProgressSnapshot {
        *self.state.lock().expect("progress lock poisoned")
    }

    pub fn planning(&self) -> PhaseProgress {
        self.snapshot().planning
    }

    pub fn execution(&self) -> PhaseProgress {
        self.snapshot().execution
    }

    pub(crate) fn start_planning(&self, total: usize) {
        let mut state = self.state.lock().expect("progress lock poisoned");
        state.planning = PhaseProgress { completed: 0, total };
    }

    pub(crate) fn advance_planning(&self) {
        let mut state = self.state.lock().expect("progress lock poisoned");
        advance(&mut state.planning);
    }

    pub(crate) fn start_execution(&self, total: usize) {
        let mut state = self.state.lock().expect("progress lock poisoned");
        state.execution = PhaseProgress { completed: 0, total };
    }

    pub(crate) fn advance_execution(&self) {
        let mut state = self.state.lock().expect("progress lock poisoned");
        advance(&mut state.execution);
    }

    /// Zero both counters for a fresh run.
    pub(crate) fn reset(&self) {
        let mut state = self.state.lock().expect("progress lock poisoned");
        *state = ProgressSnapshot::default();
    }
}

fn advance(progress: &mut PhaseProgress) {
    if progress.completed < progress.total {
        progress.completed += 1;
    }
}
