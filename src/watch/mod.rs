// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling user patterns into a static root plus `**`-separated segments.
//! - Matching concrete paths against those compiled patterns.
//! - Filtering native events by event kind and path kind.
//! - Opening one native watch per pattern and routing its events onto the
//!   shared trigger signal.
//!
//! It does **not** decide when to reload; that is the debounce scheduler's
//! job in [`crate::engine`].

pub mod backend;
pub mod filter;
pub mod handles;
pub mod matcher;
pub mod pattern;
pub mod session;

pub use backend::{Delivery, NativeWatch, NotifyBackend, RootRebase, WatchBackend};
pub use filter::{EventKind, PathKind, is_candidate};
pub use handles::{Handle, HandleTable, SessionEntry, TriggerSender};
pub use matcher::{expand_braces, strip_root};
pub use pattern::WatchSpec;
pub use session::{Session, SessionManager, route};
