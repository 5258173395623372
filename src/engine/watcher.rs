// src/engine/watcher.rs

//! Watcher instance lifecycle.
//!
//! ```text
//! uninitialized -> starting -> running -> stopping -> stopped
//!        ^            |
//!        +------------+  (any session fails to open)
//! ```
//!
//! Startup is all-or-nothing: if one pattern's session fails to open, the
//! sessions opened before it are stopped again and the instance returns to
//! `Uninitialized`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard, mpsc};
use tracing::{debug, info, warn};

use crate::errors::{Result, WatchError};
use crate::watch::backend::WatchBackend;
use crate::watch::pattern::WatchSpec;
use crate::watch::session::{Session, SessionManager};

use super::runtime::DebounceScheduler;
use super::{QUIESCENCE_WINDOW, ReloadCallback};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Uninitialized,
    Starting,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherOptions {
    /// Quiescence window for the trailing-edge debounce.
    pub quiescence: Duration,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            quiescence: QUIESCENCE_WINDOW,
        }
    }
}

/// Everything that only exists while the watcher is running.
struct Active {
    manager: SessionManager,
    sessions: Vec<Session>,
    scheduler: DebounceScheduler,
}

/// One watcher instance: a set of sessions, the reload callback, and the
/// debounce scheduler that ties them together.
///
/// Must be started and drained from within a Tokio runtime.
pub struct Watcher {
    backend: Arc<dyn WatchBackend>,
    options: WatcherOptions,
    state: WatcherState,
    active: Option<Active>,
    reloads_at_stop: u64,
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("state", &self.state)
            .field("options", &self.options)
            .field("sessions", &self.session_count())
            .finish_non_exhaustive()
    }
}

impl Watcher {
    pub fn new(backend: Arc<dyn WatchBackend>) -> Self {
        Self::with_options(backend, WatcherOptions::default())
    }

    pub fn with_options(backend: Arc<dyn WatchBackend>, options: WatcherOptions) -> Self {
        Self {
            backend,
            options,
            state: WatcherState::Uninitialized,
            active: None,
            reloads_at_stop: 0,
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == WatcherState::Running
    }

    pub fn session_count(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.sessions.len())
    }

    /// Live sessions, in pattern order.
    pub fn sessions(&self) -> &[Session] {
        match &self.active {
            Some(active) => &active.sessions,
            None => &[],
        }
    }

    /// Number of reloads this instance has started.
    pub fn reload_count(&self) -> u64 {
        self.active
            .as_ref()
            .map_or(self.reloads_at_stop, |a| a.scheduler.reload_count())
    }

    /// Compile `patterns` (relative ones against the working directory) and
    /// start watching them. See [`Watcher::start_specs`].
    pub fn start<I, S>(&mut self, patterns: I, callback: ReloadCallback) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_startable()?;
        let specs = compile_all(patterns)?;
        self.start_specs(specs, callback)
    }

    /// Open one session per compiled spec and start the debounce scheduler.
    ///
    /// Fails with [`WatchError::AlreadyRunning`] while this instance is
    /// running, and with [`WatchError::Stopped`] once it has been drained.
    pub fn start_specs(&mut self, specs: Vec<WatchSpec>, callback: ReloadCallback) -> Result<()> {
        self.ensure_startable()?;
        if specs.is_empty() {
            return Err(WatchError::NoPatterns);
        }

        self.state = WatcherState::Starting;
        debug!(patterns = specs.len(), "watcher starting");

        let (trigger_tx, trigger_rx) = mpsc::channel::<()>(1);
        let manager = SessionManager::new(Arc::clone(&self.backend), trigger_tx);

        let mut sessions = Vec::with_capacity(specs.len());
        for spec in specs {
            match manager.start(Arc::new(spec)) {
                Ok(session) => sessions.push(session),
                Err(err) => {
                    warn!(
                        error = %err,
                        opened = sessions.len(),
                        "session failed to start; rolling back"
                    );
                    for session in sessions {
                        manager.stop(session);
                    }
                    self.state = WatcherState::Uninitialized;
                    return Err(err);
                }
            }
        }

        let scheduler = DebounceScheduler::spawn(trigger_rx, callback, self.options.quiescence);

        info!(sessions = sessions.len(), "watcher running");
        self.active = Some(Active {
            manager,
            sessions,
            scheduler,
        });
        self.state = WatcherState::Running;
        Ok(())
    }

    fn ensure_startable(&self) -> Result<()> {
        match self.state {
            WatcherState::Uninitialized => Ok(()),
            WatcherState::Starting | WatcherState::Running | WatcherState::Stopping => {
                Err(WatchError::AlreadyRunning)
            }
            WatcherState::Stopped => Err(WatchError::Stopped),
        }
    }

    /// Stop the scheduler, close every session, and wait for any in-flight
    /// reload to finish.
    ///
    /// After this returns the reload callback is never invoked again. A no-op
    /// if the watcher was never started or has already been drained.
    pub async fn drain(&mut self) {
        let Some(mut active) = self.active.take() else {
            debug!(state = ?self.state, "drain: nothing to stop");
            return;
        };

        self.state = WatcherState::Stopping;
        debug!("watcher stopping");

        active.scheduler.stop_and_join().await;

        for session in active.sessions.drain(..) {
            active.manager.stop(session);
        }

        active.scheduler.in_flight().wait_idle().await;

        self.reloads_at_stop = active.scheduler.reload_count();
        self.state = WatcherState::Stopped;
        info!(reloads = self.reloads_at_stop, "watcher stopped");
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        if self.active.is_some() {
            warn!("watcher dropped while running; call drain() for an orderly shutdown");
        }
    }
}

/// Explicitly owned slot holding at most one active [`Watcher`].
///
/// Callers that need a process-wide "only one watcher" rule create one slot
/// at their boundary and route every start through it.
pub struct WatcherSlot {
    backend: Arc<dyn WatchBackend>,
    options: WatcherOptions,
    active: Mutex<Option<Watcher>>,
}

impl fmt::Debug for WatcherSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherSlot")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl WatcherSlot {
    pub fn new(backend: Arc<dyn WatchBackend>) -> Self {
        Self::with_options(backend, WatcherOptions::default())
    }

    pub fn with_options(backend: Arc<dyn WatchBackend>, options: WatcherOptions) -> Self {
        Self {
            backend,
            options,
            active: Mutex::new(None),
        }
    }

    /// Start a new watcher in this slot.
    ///
    /// Fails with [`WatchError::AlreadyRunning`] while another watcher from
    /// this slot is active; that watcher is left untouched and `patterns` is
    /// not compiled.
    pub async fn start<I, S>(&self, patterns: I, callback: ReloadCallback) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut guard = self.lock_idle().await?;
        let specs = compile_all(patterns)?;
        self.install(&mut guard, specs, callback)
    }

    pub async fn start_specs(&self, specs: Vec<WatchSpec>, callback: ReloadCallback) -> Result<()> {
        let mut guard = self.lock_idle().await?;
        self.install(&mut guard, specs, callback)
    }

    /// Lock the slot, failing if it already holds a running watcher.
    async fn lock_idle(&self) -> Result<MutexGuard<'_, Option<Watcher>>> {
        let guard = self.active.lock().await;
        if guard.as_ref().is_some_and(Watcher::is_running) {
            return Err(WatchError::AlreadyRunning);
        }
        Ok(guard)
    }

    fn install(
        &self,
        slot: &mut Option<Watcher>,
        specs: Vec<WatchSpec>,
        callback: ReloadCallback,
    ) -> Result<()> {
        let mut watcher = Watcher::with_options(Arc::clone(&self.backend), self.options);
        watcher.start_specs(specs, callback)?;
        *slot = Some(watcher);
        Ok(())
    }

    pub async fn is_active(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(Watcher::is_running)
    }

    /// Reload count of the current (or most recently drained) watcher.
    pub async fn reload_count(&self) -> u64 {
        self.active
            .lock()
            .await
            .as_ref()
            .map_or(0, Watcher::reload_count)
    }

    /// Drain the active watcher, if any. Safe to call repeatedly.
    pub async fn drain(&self) {
        let mut guard = self.active.lock().await;
        if let Some(watcher) = guard.as_mut() {
            watcher.drain().await;
        }
    }
}

fn compile_all<I, S>(patterns: I) -> Result<Vec<WatchSpec>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| WatchSpec::compile(p.as_ref()))
        .collect()
}
