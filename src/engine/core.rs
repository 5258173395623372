// src/engine/core.rs

//! Pure debounce state machine.
//!
//! Trailing-edge debounce with a single timer:
//! - `Idle`: no reload pending.
//! - `Armed`: counting down to `deadline`; every further trigger pushes the
//!   deadline out by a full window.
//!
//! The async scheduler (`engine::runtime`) owns one of these and does the
//! actual waiting. This type has no Tokio, channels, or clocks of its own;
//! callers pass `now` in, which keeps it deterministic under test.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebouncePhase {
    Idle,
    Armed { deadline: Instant },
}

#[derive(Debug, Clone)]
pub struct DebounceState {
    window: Duration,
    phase: DebouncePhase,
}

impl DebounceState {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            phase: DebouncePhase::Idle,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn phase(&self) -> DebouncePhase {
        self.phase
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.phase, DebouncePhase::Armed { .. })
    }

    /// When the pending reload is due, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            DebouncePhase::Idle => None,
            DebouncePhase::Armed { deadline } => Some(deadline),
        }
    }

    /// A qualifying event arrived: (re)arm the timer one window from `now`.
    pub fn on_trigger(&mut self, now: Instant) {
        self.phase = DebouncePhase::Armed {
            deadline: now + self.window,
        };
    }

    /// If the timer has expired at `now`, disarm it and return true.
    ///
    /// The caller must then run the reload exactly once.
    pub fn take_expired(&mut self, now: Instant) -> bool {
        match self.phase {
            DebouncePhase::Armed { deadline } if now >= deadline => {
                self.phase = DebouncePhase::Idle;
                true
            }
            _ => false,
        }
    }
}
