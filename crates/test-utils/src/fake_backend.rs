use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use reloadwatch::watch::{Delivery, EventKind, Handle, NativeWatch, PathKind, WatchBackend};

/// An in-memory `WatchBackend` that:
/// - records every `open_watch` / `close` call
/// - can be told to fail opening specific roots, or to fail every close
/// - lets the test push synthetic native events through `emit`.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    sessions: Vec<FakeSession>,
    fail_roots: HashSet<PathBuf>,
    fail_close: bool,
    open_calls: usize,
    close_calls: usize,
}

struct FakeSession {
    root: PathBuf,
    handle: Handle,
    deliver: Delivery,
    open: bool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `open_watch` fail for exactly this root.
    pub fn fail_on_root(&self, root: impl Into<PathBuf>) {
        self.lock().fail_roots.insert(root.into());
    }

    /// Make every `close` report an error (delivery still stops).
    pub fn fail_on_close(&self) {
        self.lock().fail_close = true;
    }

    pub fn open_calls(&self) -> usize {
        self.lock().open_calls
    }

    pub fn close_calls(&self) -> usize {
        self.lock().close_calls
    }

    /// Roots of sessions that are currently open, in open order.
    pub fn live_roots(&self) -> Vec<PathBuf> {
        self.lock()
            .sessions
            .iter()
            .filter(|s| s.open)
            .map(|s| s.root.clone())
            .collect()
    }

    /// Handles of every session ever opened, in open order.
    pub fn handles(&self) -> Vec<Handle> {
        self.lock().sessions.iter().map(|s| s.handle).collect()
    }

    /// Deliver one event to every open session rooted at `root`.
    ///
    /// Returns how many sessions received it.
    pub fn emit(&self, root: &Path, path: &Path, event: EventKind, kind: PathKind) -> usize {
        let targets: Vec<(Handle, Delivery)> = self
            .lock()
            .sessions
            .iter()
            .filter(|s| s.open && s.root == root)
            .map(|s| (s.handle, Arc::clone(&s.deliver)))
            .collect();

        for (handle, deliver) in &targets {
            deliver(path, event, kind, *handle);
        }
        targets.len()
    }

    /// Deliver one event through the callback registered for `handle`, even
    /// if that session has been closed. Models a late native delivery.
    pub fn emit_late(&self, handle: Handle, path: &Path, event: EventKind, kind: PathKind) -> bool {
        let deliver = self
            .lock()
            .sessions
            .iter()
            .find(|s| s.handle == handle)
            .map(|s| Arc::clone(&s.deliver));

        match deliver {
            Some(deliver) => {
                deliver(path, event, kind, handle);
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }
}

impl WatchBackend for FakeBackend {
    fn open_watch(
        &self,
        root: &Path,
        handle: Handle,
        deliver: Delivery,
    ) -> anyhow::Result<Box<dyn NativeWatch>> {
        let mut state = self.lock();
        state.open_calls += 1;

        if state.fail_roots.contains(root) {
            return Err(anyhow!("simulated open failure for {}", root.display()));
        }

        state.sessions.push(FakeSession {
            root: root.to_path_buf(),
            handle,
            deliver,
            open: true,
        });

        Ok(Box::new(FakeNative {
            handle,
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeNative {
    handle: Handle,
    state: Arc<Mutex<FakeState>>,
}

impl NativeWatch for FakeNative {
    // The session itself is marked closed by `Drop` once `self` goes out of scope.
    fn close(self: Box<Self>) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.close_calls += 1;
        if state.fail_close {
            return Err(anyhow!("simulated close failure"));
        }
        Ok(())
    }
}

/// Dropping the box without `close` also stops delivery, like a real watcher.
impl Drop for FakeNative {
    fn drop(&mut self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if let Some(session) = state.sessions.iter_mut().find(|s| s.handle == self.handle) {
            session.open = false;
        }
    }
}
