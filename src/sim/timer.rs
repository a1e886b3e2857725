//! Level countdown
//!
//! Two counters driven by the scheduler: whole seconds (coarse, 1000 ms) and
//! a 0-1000 ms display sub-counter (fine, 10 ms). Expiry happens when the
//! sub-counter wraps while the seconds counter is at zero.

use serde::{Deserialize, Serialize};

use crate::consts::{COARSE_TICK_MS, FINE_TICK_MS, WARNING_THRESHOLD_SECS};

/// What the HUD shows: seconds and hundredths left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerDisplay {
    pub seconds: u32,
    pub hundredths: u32,
}

impl std::fmt::Display for TimerDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.seconds, self.hundredths)
    }
}

/// Countdown state
#[derive(Debug, Clone, Default)]
pub struct Countdown {
    remaining: u32,
    sub_ms: u32,
    running: bool,
    paused: bool,
    warned: bool,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, duration_secs: u32) {
        self.remaining = duration_secs;
        self.sub_ms = 0;
        self.running = true;
        self.paused = false;
        self.warned = false;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn add_time(&mut self, secs: u32) {
        self.remaining = self.remaining.saturating_add(secs);
        if self.remaining > WARNING_THRESHOLD_SECS {
            self.warned = false;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn ticking(&self) -> bool {
        self.running && !self.paused
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    /// Whole-second step. Returns true exactly once per run, on the first
    /// step that leaves the clock at or under the warning threshold.
    pub fn on_coarse_tick(&mut self) -> bool {
        if !self.ticking() {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining <= WARNING_THRESHOLD_SECS && !self.warned {
            self.warned = true;
            return true;
        }
        false
    }

    /// Sub-counter step. Returns true when the countdown has expired; the
    /// countdown stops itself in that case.
    pub fn on_fine_tick(&mut self) -> bool {
        if !self.ticking() {
            return false;
        }
        self.sub_ms += FINE_TICK_MS as u32;
        if self.sub_ms >= COARSE_TICK_MS as u32 {
            self.sub_ms = 0;
            if self.remaining == 0 {
                self.stop();
                return true;
            }
        }
        false
    }

    /// Time left for display. Between coarse ticks the seconds read one
    /// lower and the hundredths count down.
    pub fn display(&self) -> TimerDisplay {
        if self.sub_ms == 0 {
            TimerDisplay {
                seconds: self.remaining,
                hundredths: 0,
            }
        } else {
            TimerDisplay {
                seconds: self.remaining.saturating_sub(1),
                hundredths: (COARSE_TICK_MS as u32 - self.sub_ms) / 10,
            }
        }
    }
}
