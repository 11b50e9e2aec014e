//! Countdown phase, snapshot, and pure tick logic

use serde::{Deserialize, Serialize};

/// Countdown phase. `Done` is terminal until the next start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Done,
}

/// Point-in-time view of the countdown, published on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub remaining_seconds: u64,
    pub total_seconds: u64,
}

impl TimerSnapshot {
    /// Fraction of the committed duration still remaining, for dial sweep.
    pub fn sweep_fraction(&self) -> f64 {
        if self.total_seconds == 0 {
            0.0
        } else {
            self.remaining_seconds as f64 / self.total_seconds as f64
        }
    }
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            remaining_seconds: 0,
            total_seconds: 0,
        }
    }
}

/// Pure countdown state machine, driven by an external tick source.
///
/// Holds the one-shot completion latch: `tick` reports completion exactly
/// once per `start`, no matter how many redundant ticks arrive afterwards.
#[derive(Debug, Default)]
pub struct CountdownCore {
    snapshot: TimerSnapshot,
    completion_fired: bool,
}

impl CountdownCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a run. Valid from any phase; re-invocation while running is a
    /// retarget and rearms the completion latch. Returns `true` if the run
    /// completed immediately (zero-length), consuming the latch.
    pub fn start(&mut self, total_seconds: u64) -> bool {
        self.snapshot = TimerSnapshot {
            phase: Phase::Running,
            remaining_seconds: total_seconds,
            total_seconds,
        };
        self.completion_fired = false;
        if total_seconds == 0 {
            self.snapshot.phase = Phase::Done;
            self.completion_fired = true;
            return true;
        }
        false
    }

    /// Apply one second of elapsed time. Returns `true` exactly once per
    /// start, on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        if self.snapshot.phase != Phase::Running {
            return false;
        }
        self.snapshot.remaining_seconds = self.snapshot.remaining_seconds.saturating_sub(1);
        if self.snapshot.remaining_seconds == 0 {
            self.snapshot.phase = Phase::Done;
            if !self.completion_fired {
                self.completion_fired = true;
                return true;
            }
        }
        false
    }

    /// Return to idle and clear the completion latch. Valid from any phase.
    pub fn reset(&mut self) {
        self.snapshot.phase = Phase::Idle;
        self.snapshot.remaining_seconds = 0;
        self.completion_fired = false;
    }

    /// Acknowledge a finished run without clearing the committed total.
    pub fn acknowledge(&mut self) {
        if self.snapshot.phase == Phase::Done {
            self.snapshot.phase = Phase::Idle;
            self.snapshot.remaining_seconds = 0;
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot
    }

    pub fn phase(&self) -> Phase {
        self.snapshot.phase
    }
}
