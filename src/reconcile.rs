//! Reconciler: debounced, single-flight scheduling of apply cycles
//!
//! # Design Principles
//! 1. State machine: Stopped → Idle ⇄ Pending → Applying → Idle | Pending
//! 2. Trailing-edge debounce: every notification restarts the window
//! 3. Single flight: `begin` refuses while a cycle is running, and
//!    notifications that arrive meanwhile collapse into one follow-up cycle
//!
//! Time is passed in by the caller, so the machine has no timers of its
//! own. A host arms one timer for `deadline()` and calls `begin` when it
//! fires.
//!
//! # Usage
//! ```rust,ignore
//! let mut reconciler = Reconciler::new(Duration::from_millis(250));
//! reconciler.start();
//! reconciler.notify(now);
//! if let Some(cycle) = reconciler.begin(later) {
//!     // ... run the cycle ...
//!     reconciler.finish(cycle, later);
//! }
//! ```

use instant::Instant;
use serde::Serialize;
use std::time::Duration;

// =============================================================================
// State Machine
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Not started, or stopped: notifications are ignored
    Stopped,
    Idle,
    /// A cycle is due at `deadline`
    Pending { deadline: Instant },
    /// Cycle `id` is running; `rerun` records notifications seen meanwhile
    Applying { id: u64, rerun: bool },
}

/// Public view of the current phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Stopped,
    Idle,
    Pending,
    Applying,
}

/// Proof that a cycle was started; hand it back to `finish`.
#[must_use = "a started cycle must be finished"]
#[derive(Debug, PartialEq, Eq)]
pub struct CycleTicket {
    id: u64,
}

impl CycleTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// Notifications accepted while running
    pub notifications: u64,
    /// Notifications folded into an already requested cycle
    pub coalesced: u64,
    /// Cycles started
    pub cycles: u64,
}

// =============================================================================
// Reconciler
// =============================================================================

#[derive(Debug)]
pub struct Reconciler {
    phase: Phase,
    debounce: Duration,
    stats: ReconcileStats,
}

impl Reconciler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            phase: Phase::Stopped,
            debounce,
            stats: ReconcileStats::default(),
        }
    }

    /// Begin accepting notifications. Idempotent.
    pub fn start(&mut self) {
        if self.phase == Phase::Stopped {
            self.phase = Phase::Idle;
        }
    }

    /// Drop any pending cycle and ignore further notifications. A running
    /// cycle is not interrupted; its `finish` becomes a no-op.
    pub fn stop(&mut self) {
        self.phase = Phase::Stopped;
    }

    pub fn is_running(&self) -> bool {
        self.phase != Phase::Stopped
    }

    pub fn state(&self) -> SchedulerState {
        match self.phase {
            Phase::Stopped => SchedulerState::Stopped,
            Phase::Idle => SchedulerState::Idle,
            Phase::Pending { .. } => SchedulerState::Pending,
            Phase::Applying { .. } => SchedulerState::Applying,
        }
    }

    pub fn stats(&self) -> ReconcileStats {
        self.stats
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// When the pending cycle is due, if one is pending
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Pending { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// "The tree may have changed." Restarts the debounce window. Returns
    /// false when stopped.
    pub fn notify(&mut self, now: Instant) -> bool {
        self.request(now + self.debounce)
    }

    /// Like `notify`, but the cycle is due immediately.
    pub fn request_now(&mut self, now: Instant) -> bool {
        self.request(now)
    }

    fn request(&mut self, deadline: Instant) -> bool {
        match self.phase {
            Phase::Stopped => return false,
            Phase::Idle => {
                self.phase = Phase::Pending { deadline };
            }
            Phase::Pending { .. } => {
                self.stats.coalesced += 1;
                self.phase = Phase::Pending { deadline };
            }
            Phase::Applying { id, rerun } => {
                if rerun {
                    self.stats.coalesced += 1;
                }
                self.phase = Phase::Applying { id, rerun: true };
            }
        }
        self.stats.notifications += 1;
        true
    }

    /// Start the pending cycle if it is due. `None` when nothing is due or
    /// a cycle is already running.
    pub fn begin(&mut self, now: Instant) -> Option<CycleTicket> {
        match self.phase {
            Phase::Pending { deadline } if deadline <= now => {
                self.stats.cycles += 1;
                let id = self.stats.cycles;
                self.phase = Phase::Applying { id, rerun: false };
                Some(CycleTicket { id })
            }
            _ => None,
        }
    }

    /// End a cycle. Goes back to `Idle`, or to `Pending` with a fresh
    /// window if notifications arrived while it ran.
    pub fn finish(&mut self, ticket: CycleTicket, now: Instant) {
        match self.phase {
            Phase::Applying { id, rerun } if id == ticket.id => {
                self.phase = if rerun {
                    Phase::Pending {
                        deadline: now + self.debounce,
                    }
                } else {
                    Phase::Idle
                };
            }
            _ => {
                tracing::debug!(cycle = ticket.id, state = ?self.state(), "Finished cycle is no longer current");
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
