// src/engine/mod.rs

//! Reload coordination.
//!
//! This module ties together:
//! - the pure debounce state machine ([`core`])
//! - the async consumer loop that owns debounce timing and calls the reload
//!   callback ([`runtime`])
//! - the watcher instance lifecycle: start sessions, run the scheduler,
//!   drain on shutdown ([`watcher`])

use std::sync::Arc;
use std::time::Duration;

/// Zero-argument reload callback supplied by the worker-pool collaborator.
///
/// Its outcome is the collaborator's business; the engine never inspects it.
pub type ReloadCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Inactivity required after the last qualifying event before a reload.
pub const QUIESCENCE_WINDOW: Duration = Duration::from_millis(150);

pub mod core;
pub mod runtime;
pub mod watcher;

pub use core::{DebouncePhase, DebounceState};
pub use runtime::{DebounceScheduler, InFlight};
pub use watcher::{Watcher, WatcherOptions, WatcherSlot, WatcherState};
