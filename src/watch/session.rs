// src/watch/session.rs

//! Session manager: one native watch per [`WatchSpec`].
//!
//! Each session is registered in the [`HandleTable`] before the native watch
//! is opened, and released only after native delivery has been stopped.
//! Native callbacks are routed through [`route`], which applies the event
//! filter and pattern matcher and then pokes the shared trigger signal.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, trace, warn};

use crate::errors::{Result, WatchError};
use crate::watch::backend::{Delivery, NativeWatch, WatchBackend};
use crate::watch::filter::{EventKind, PathKind, is_candidate};
use crate::watch::handles::{Handle, HandleTable, TriggerSender};
use crate::watch::pattern::WatchSpec;

/// One live native watch keyed to exactly one spec.
pub struct Session {
    handle: Handle,
    root: PathBuf,
    native: Box<dyn NativeWatch>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("handle", &self.handle)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

pub struct SessionManager {
    backend: Arc<dyn WatchBackend>,
    table: Arc<HandleTable>,
    trigger: TriggerSender,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("live_handles", &self.table.len())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(backend: Arc<dyn WatchBackend>, trigger: TriggerSender) -> Self {
        Self {
            backend,
            table: Arc::new(HandleTable::new()),
            trigger,
        }
    }

    pub fn table(&self) -> &Arc<HandleTable> {
        &self.table
    }

    /// Register `spec` and open a native watch on its root directory.
    ///
    /// On failure the handle is released again, so nothing dangles.
    pub fn start(&self, spec: Arc<WatchSpec>) -> Result<Session> {
        let root = spec.root_path().to_path_buf();
        let trigger = self.trigger.clone();
        let handle = self.table.register(Arc::clone(&spec), trigger);

        match self.backend.open_watch(&root, handle, self.delivery()) {
            Ok(native) => {
                info!(%handle, root = %root.display(), pattern = spec.pattern(), "watching");
                Ok(Session {
                    handle,
                    root,
                    native,
                })
            }
            Err(err) => {
                self.table.release(handle);
                Err(WatchError::UnableToStartWatching {
                    root,
                    reason: format!("{err:#}"),
                })
            }
        }
    }

    /// Close the native watch, then invalidate its handle.
    ///
    /// Close failures are logged, never returned: shutdown always completes.
    pub fn stop(&self, session: Session) {
        let Session {
            handle,
            root,
            native,
        } = session;

        if let Err(err) = native.close() {
            let err = WatchError::SessionStop {
                root: root.clone(),
                reason: format!("{err:#}"),
            };
            warn!(%handle, error = %err, "session stop failed");
        }

        self.table.release(handle);
        debug!(%handle, root = %root.display(), "session stopped");
    }

    fn delivery(&self) -> Delivery {
        let table = Arc::clone(&self.table);
        Arc::new(move |path: &Path, event: EventKind, kind: PathKind, handle: Handle| {
            route(&table, path, event, kind, handle);
        })
    }
}

/// Dispatch one native event.
///
/// Returns true if the trigger signal now holds a pending trigger because of
/// this event. Never blocks: a full trigger channel already means "reload
/// pending", and a closed one means the watcher is shutting down.
pub fn route(
    table: &HandleTable,
    path: &Path,
    event: EventKind,
    kind: PathKind,
    handle: Handle,
) -> bool {
    let Some(entry) = table.resolve(handle) else {
        trace!(%handle, path = %path.display(), "event for released handle; dropping");
        return false;
    };

    if !is_candidate(event, kind) {
        trace!(?event, ?kind, path = %path.display(), "event class filtered out");
        return false;
    }

    if !entry.spec.matches(path) {
        trace!(path = %path.display(), pattern = entry.spec.pattern(), "no pattern match");
        return false;
    }

    debug!(?event, path = %path.display(), pattern = entry.spec.pattern(), "change detected");

    match entry.trigger.try_send(()) {
        Ok(()) | Err(TrySendError::Full(())) => true,
        Err(TrySendError::Closed(())) => false,
    }
}
