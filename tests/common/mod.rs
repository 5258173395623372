#![allow(dead_code, unused_imports)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use reloadwatch::engine::ReloadCallback;

pub use reloadwatch_test_utils::{
    ConfigFileBuilder, FakeBackend, eventually, init_tracing, with_timeout,
};

/// How long tests wait for an asynchronous reload to be observed.
pub const SETTLE: Duration = Duration::from_secs(2);

/// Reload callback that counts invocations and records when each one began.
#[derive(Clone, Default)]
pub struct CallbackRecorder {
    calls: Arc<AtomicUsize>,
    started: Arc<Mutex<Vec<Instant>>>,
}

impl CallbackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> ReloadCallback {
        self.callback_with_delay(Duration::ZERO)
    }

    /// Callback that sleeps for `delay` after recording its start.
    pub fn callback_with_delay(&self, delay: Duration) -> ReloadCallback {
        let calls = Arc::clone(&self.calls);
        let started = Arc::clone(&self.started);
        Arc::new(move || {
            started.lock().unwrap().push(Instant::now());
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            calls.fetch_add(1, Ordering::SeqCst);
        })
    }

    /// Number of callbacks that have returned.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn started_at(&self) -> Vec<Instant> {
        self.started.lock().unwrap().clone()
    }
}
