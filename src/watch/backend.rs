// src/watch/backend.rs

//! Pluggable native filesystem-notification backend.
//!
//! The session manager talks to a [`WatchBackend`] instead of `notify`
//! directly, so tests can swap in a fake that delivers synthetic events.
//!
//! - [`NotifyBackend`] is the production implementation: one recursive
//!   `notify::RecommendedWatcher` per session.
//! - Each delivered path is reported with its classification and the
//!   session's opaque [`Handle`].

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::watch::filter::{EventKind, PathKind};
use crate::watch::handles::Handle;

/// Callback invoked from the backend's delivery thread for every native
/// event: `(path, event kind, path kind, handle)`.
pub type Delivery = Arc<dyn Fn(&Path, EventKind, PathKind, Handle) + Send + Sync>;

/// A live native watch. Dropping it must also stop delivery.
pub trait NativeWatch: Send {
    /// Stop native delivery and release OS resources.
    fn close(self: Box<Self>) -> Result<()>;
}

/// Trait abstracting how native watches are opened.
pub trait WatchBackend: Send + Sync {
    /// Start watching `root` recursively, reporting events through `deliver`
    /// tagged with `handle`.
    fn open_watch(
        &self,
        root: &Path,
        handle: Handle,
        deliver: Delivery,
    ) -> Result<Box<dyn NativeWatch>>;
}

/// Production backend built on the `notify` crate.
///
/// Native facilities report resolved paths (FSEvents reports `/private/tmp`
/// for `/tmp`), so the root is canonicalized before watching and every
/// delivered path is rebased onto the root the spec was compiled against.
#[derive(Debug, Clone, Default)]
pub struct NotifyBackend;

impl WatchBackend for NotifyBackend {
    fn open_watch(
        &self,
        root: &Path,
        handle: Handle,
        deliver: Delivery,
    ) -> Result<Box<dyn NativeWatch>> {
        let watched = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let rebase = RootRebase::new(watched.clone(), root.to_path_buf());

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            on_native_event(res, handle, &rebase, &deliver)
        })
        .context("creating native watcher")?;

        watcher
            .watch(&watched, RecursiveMode::Recursive)
            .with_context(|| format!("watching {}", root.display()))?;

        debug!(
            %handle,
            root = %root.display(),
            watched = %watched.display(),
            "native watch opened"
        );

        Ok(Box::new(NotifySession { watched, watcher }))
    }
}

struct NotifySession {
    watched: PathBuf,
    watcher: RecommendedWatcher,
}

impl NativeWatch for NotifySession {
    fn close(mut self: Box<Self>) -> Result<()> {
        // The watcher is dropped on return either way, which stops delivery.
        self.watcher
            .unwatch(&self.watched)
            .with_context(|| format!("unwatching {}", self.watched.display()))
    }
}

/// Maps paths below the watched (resolved) root back below the root the
/// spec was compiled against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootRebase {
    watched: PathBuf,
    compiled: PathBuf,
}

impl RootRebase {
    pub fn new(watched: PathBuf, compiled: PathBuf) -> Self {
        Self { watched, compiled }
    }

    pub fn watched(&self) -> &Path {
        &self.watched
    }

    /// Rewrite `path` if it lies at or below the watched root.
    ///
    /// Paths outside it, and every path when both roots are the same, are
    /// returned unchanged.
    pub fn apply<'a>(&self, path: &'a Path) -> Cow<'a, Path> {
        if self.watched == self.compiled {
            return Cow::Borrowed(path);
        }
        match path.strip_prefix(&self.watched) {
            Ok(rest) if rest.as_os_str().is_empty() => Cow::Owned(self.compiled.clone()),
            Ok(rest) => Cow::Owned(self.compiled.join(rest)),
            Err(_) => Cow::Borrowed(path),
        }
    }
}

fn on_native_event(
    res: notify::Result<Event>,
    handle: Handle,
    rebase: &RootRebase,
    deliver: &Delivery,
) {
    match res {
        Ok(event) => forward_event(&event, handle, rebase, deliver),
        Err(err) => warn!(%handle, error = %err, "file watch error"),
    }
}

fn forward_event(event: &Event, handle: Handle, rebase: &RootRebase, deliver: &Delivery) {
    let event_kind = classify_event_kind(&event.kind);
    for path in &event.paths {
        let path_kind = if event.need_rescan() {
            PathKind::Watcher
        } else {
            classify_path_kind(&event.kind, path)
        };
        deliver(&rebase.apply(path), event_kind, path_kind, handle);
    }
}

/// Map a `notify` event kind onto the native event-kind enumeration.
pub fn classify_event_kind(kind: &notify::EventKind) -> EventKind {
    match kind {
        notify::EventKind::Create(_) => EventKind::Create,
        notify::EventKind::Remove(_) => EventKind::Destroy,
        notify::EventKind::Modify(ModifyKind::Name(_)) => EventKind::Rename,
        notify::EventKind::Modify(ModifyKind::Metadata(_)) => EventKind::Owner,
        notify::EventKind::Modify(_) => EventKind::Modify,
        notify::EventKind::Access(_) | notify::EventKind::Any | notify::EventKind::Other => {
            EventKind::Other
        }
    }
}

/// Work out what kind of entry `path` is.
///
/// Looks at the entry without following symlinks. When it has already
/// vanished, falls back to the kind `notify` reported, and to a file when
/// `notify` did not say.
pub fn classify_path_kind(kind: &notify::EventKind, path: &Path) -> PathKind {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => PathKind::SymLink,
        Ok(meta) if meta.is_dir() => PathKind::Dir,
        Ok(meta) if meta.is_file() => PathKind::File,
        Ok(_) => PathKind::Other,
        Err(_) => match kind {
            notify::EventKind::Create(CreateKind::Folder)
            | notify::EventKind::Remove(RemoveKind::Folder) => PathKind::Dir,
            notify::EventKind::Create(CreateKind::Other)
            | notify::EventKind::Remove(RemoveKind::Other) => PathKind::Other,
            _ => PathKind::File,
        },
    }
}
