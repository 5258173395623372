// src/engine/runtime.rs

//! Debounce scheduler: the single consumer of the trigger signal.
//!
//! One Tokio task waits on three sources (stop signal, trigger signal,
//! timer expiry) and is the only place the reload callback is ever called.
//! The callback runs on the blocking pool but is awaited from the loop, so
//! reloads are strictly serialized.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::{Notify, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::ReloadCallback;
use super::core::DebounceState;

/// In-flight reload counter with wait-group semantics.
#[derive(Debug, Default)]
pub struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one reload as started. The returned guard marks it finished when
    /// dropped, including on panic.
    pub fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::AcqRel);
        InFlightGuard {
            inner: Arc::clone(self),
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Wait until no reload is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Debug)]
pub struct InFlightGuard {
    inner: Arc<InFlight>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.inner.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

/// Handle to the running consumer task.
pub struct DebounceScheduler {
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    in_flight: Arc<InFlight>,
    reloads: Arc<AtomicU64>,
}

impl fmt::Debug for DebounceScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebounceScheduler")
            .field("running", &self.task.is_some())
            .field("in_flight", &self.in_flight.count())
            .field("reloads", &self.reload_count())
            .finish()
    }
}

impl DebounceScheduler {
    /// Spawn the consumer loop on the current Tokio runtime.
    pub fn spawn(
        trigger_rx: mpsc::Receiver<()>,
        callback: ReloadCallback,
        window: Duration,
    ) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();
        let in_flight = Arc::new(InFlight::new());
        let reloads = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(consumer_loop(
            trigger_rx,
            stop_rx,
            callback,
            DebounceState::new(window),
            Arc::clone(&in_flight),
            Arc::clone(&reloads),
        ));

        Self {
            stop_tx: Some(stop_tx),
            task: Some(task),
            in_flight,
            reloads,
        }
    }

    pub fn in_flight(&self) -> &Arc<InFlight> {
        &self.in_flight
    }

    /// Number of reload callbacks that have been started so far.
    pub fn reload_count(&self) -> u64 {
        self.reloads.load(Ordering::Acquire)
    }

    /// Signal stop and wait for the consumer loop to exit.
    ///
    /// A reload already running is allowed to finish first. Calling this
    /// again is a no-op.
    pub async fn stop_and_join(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // Err means the loop already exited and dropped its receiver.
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                error!(error = %err, "debounce loop terminated abnormally");
            }
        }
    }
}

async fn consumer_loop(
    mut trigger_rx: mpsc::Receiver<()>,
    mut stop_rx: oneshot::Receiver<()>,
    callback: ReloadCallback,
    mut state: DebounceState,
    in_flight: Arc<InFlight>,
    reloads: Arc<AtomicU64>,
) {
    debug!(
        window_ms = state.window().as_millis() as u64,
        "debounce loop started"
    );

    loop {
        let deadline = state.deadline();

        tokio::select! {
            biased;

            _ = &mut stop_rx => {
                debug!(pending = state.is_armed(), "stop requested");
                break;
            }

            received = trigger_rx.recv() => match received {
                Some(()) => state.on_trigger(Instant::now()),
                None => {
                    debug!("trigger signal closed");
                    break;
                }
            },

            _ = expiry(deadline) => {
                if state.take_expired(Instant::now()) {
                    reloads.fetch_add(1, Ordering::AcqRel);
                    invoke(&callback, &in_flight).await;
                }
            }
        }
    }

    debug!("debounce loop finished");
}

async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

async fn invoke(callback: &ReloadCallback, in_flight: &Arc<InFlight>) {
    let _guard = in_flight.enter();
    let callback = Arc::clone(callback);
    let started = Instant::now();

    info!("files changed; reloading");

    match tokio::task::spawn_blocking(move || callback()).await {
        Ok(()) => info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "reload finished"
        ),
        Err(err) => error!(error = %err, "reload callback panicked"),
    }
}
