use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerPhase {
    /// No countdown has been sized yet.
    #[default]
    Idle,
    /// Sized from advice, never started since the last seed or reset.
    Ready,
    Running,
    Paused,
    Finished,
}

impl TimerPhase {
    /// Whether a fresh advice result may (re)size the countdown.
    pub fn accepts_seed(&self) -> bool {
        matches!(self, TimerPhase::Idle | TimerPhase::Ready)
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; nothing changed.
    Ignored,
    Counting { remaining_seconds: u32 },
    /// Running reached zero on this tick. Returned exactly once per run.
    Finished,
}

/// Countdown state. Fields only change through the transitions below, which
/// keep `remaining_seconds <= total_seconds` and `Idle` implying zero totals.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    phase: TimerPhase,
    total_seconds: u32,
    remaining_seconds: u32,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Size the countdown if it has not been started. Returns true when the
    /// state changed.
    pub fn seed(&mut self, total_seconds: u32) -> bool {
        if !self.phase.accepts_seed() {
            return false;
        }

        let next = if total_seconds == 0 {
            Self::default()
        } else {
            Self {
                phase: TimerPhase::Ready,
                total_seconds,
                remaining_seconds: total_seconds,
            }
        };

        let changed = next != *self;
        *self = next;
        changed
    }

    /// Ready or Paused to Running.
    pub fn start(&mut self) -> bool {
        match self.phase {
            TimerPhase::Ready | TimerPhase::Paused if self.remaining_seconds > 0 => {
                self.phase = TimerPhase::Running;
                true
            }
            _ => false,
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.phase == TimerPhase::Running {
            self.phase = TimerPhase::Paused;
            true
        } else {
            false
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != TimerPhase::Running {
            return TickOutcome::Ignored;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.phase = TimerPhase::Finished;
            TickOutcome::Finished
        } else {
            TickOutcome::Counting {
                remaining_seconds: self.remaining_seconds,
            }
        }
    }

    /// Valid from any phase: back to Ready with a full countdown, or Idle
    /// when nothing was ever sized.
    pub fn reset(&mut self) {
        if self.total_seconds > 0 {
            self.phase = TimerPhase::Ready;
            self.remaining_seconds = self.total_seconds;
        } else {
            *self = Self::default();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase == TimerPhase::Finished
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn progress_percent(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        let elapsed = self.total_seconds.saturating_sub(self.remaining_seconds);
        f64::from(elapsed) / f64::from(self.total_seconds) * 100.0
    }

    /// Remaining time as `MM:SS`. Minutes are not wrapped into hours.
    pub fn format_remaining(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_seconds / 60,
            self.remaining_seconds % 60
        )
    }

    pub fn status_label(&self) -> &'static str {
        match self.phase {
            TimerPhase::Idle => "WAITING",
            TimerPhase::Ready => "READY",
            TimerPhase::Running => "TANNING",
            TimerPhase::Paused => "PAUSED",
            TimerPhase::Finished => "DONE!",
        }
    }
}
