//! Mutual exclusion and cooldown for script batches.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Why a batch did not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another batch is still dispatching.
    InFlight,
    /// The previous batch started less than the cooldown ago.
    Cooldown { remaining: Duration },
}

#[derive(Debug, Default)]
struct GuardState {
    running: bool,
    last_started: Option<Instant>,
}

/// Execution guard shared by every trigger of one engine.
///
/// The check of both conditions and the update of both fields happen inside a
/// single lock acquisition, and the lock is never held across an `.await`.
#[derive(Debug)]
pub(crate) struct ExecutionGuard {
    state: Mutex<GuardState>,
    cooldown: Duration,
}

impl ExecutionGuard {
    pub(crate) fn new(cooldown: Duration) -> Self {
        Self {
            state: Mutex::new(GuardState::default()),
            cooldown,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GuardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the guard for one batch, stamping the start time.
    pub(crate) fn try_acquire(self: &Arc<Self>) -> Result<RunPermit, SkipReason> {
        self.try_acquire_at(Instant::now())
    }

    pub(crate) fn try_acquire_at(self: &Arc<Self>, now: Instant) -> Result<RunPermit, SkipReason> {
        let mut state = self.lock();

        if state.running {
            return Err(SkipReason::InFlight);
        }

        if let Some(last) = state.last_started {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.cooldown {
                return Err(SkipReason::Cooldown {
                    remaining: self.cooldown - elapsed,
                });
            }
        }

        state.running = true;
        state.last_started = Some(now);

        Ok(RunPermit {
            guard: Arc::clone(self),
        })
    }

    pub(crate) fn is_running(&self) -> bool {
        self.lock().running
    }
}

/// Proof that the holder owns the current batch. Dropping it clears the
/// running flag, whichever way the batch ends.
#[derive(Debug)]
pub(crate) struct RunPermit {
    guard: Arc<ExecutionGuard>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.guard.lock().running = false;
    }
}
