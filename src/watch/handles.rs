// src/watch/handles.rs

//! Handle table bridging native callbacks back to typed session state.
//!
//! Native sessions only carry an opaque [`Handle`]. Handles are allocated
//! from a monotonic counter and never reused, so a late delivery for a
//! stopped session resolves to nothing instead of to someone else's spec.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::watch::pattern::WatchSpec;

/// Opaque identifier for one native session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sender half of the shared trigger signal.
pub type TriggerSender = mpsc::Sender<()>;

/// What a handle resolves to while its session is live.
///
/// Entries are fully built before insertion, so readers never observe a
/// partially bound spec.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub spec: Arc<WatchSpec>,
    pub trigger: TriggerSender,
}

#[derive(Debug)]
pub struct HandleTable {
    next: AtomicU64,
    entries: DashMap<Handle, SessionEntry>,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            entries: DashMap::new(),
        }
    }

    /// Allocate a fresh handle and bind `spec` + `trigger` to it.
    pub fn register(&self, spec: Arc<WatchSpec>, trigger: TriggerSender) -> Handle {
        let handle = Handle(self.next.fetch_add(1, Ordering::Relaxed));
        self.entries.insert(handle, SessionEntry { spec, trigger });
        handle
    }

    pub fn resolve(&self, handle: Handle) -> Option<SessionEntry> {
        self.entries.get(&handle).map(|e| e.value().clone())
    }

    /// Invalidate a handle. Returns false if it was not registered.
    pub fn release(&self, handle: Handle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
