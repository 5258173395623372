// src/watch/filter.rs

//! Event filter applied before any glob matching.
//!
//! Native events carry two small integer classifications: what happened
//! ([`EventKind`]) and what kind of entry it happened to ([`PathKind`]).
//! Only combinations that can represent a meaningful source change are
//! passed on to the matcher.

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    Rename = 0,
    Modify = 1,
    Create = 2,
    Destroy = 3,
    /// Ownership / permission / attribute change.
    Owner = 4,
    Other = 5,
}

impl EventKind {
    /// Map a native code to a kind; unknown codes become [`EventKind::Other`].
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => EventKind::Rename,
            1 => EventKind::Modify,
            2 => EventKind::Create,
            3 => EventKind::Destroy,
            4 => EventKind::Owner,
            _ => EventKind::Other,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_accepted(self) -> bool {
        matches!(
            self,
            EventKind::Rename | EventKind::Modify | EventKind::Create | EventKind::Destroy
        )
    }
}

/// What kind of filesystem entry an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PathKind {
    Dir = 0,
    File = 1,
    HardLink = 2,
    SymLink = 3,
    /// Bookkeeping emitted by the watcher implementation itself.
    Watcher = 4,
    Other = 5,
}

impl PathKind {
    /// Map a native code to a kind; unknown codes become [`PathKind::Other`].
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => PathKind::Dir,
            1 => PathKind::File,
            2 => PathKind::HardLink,
            3 => PathKind::SymLink,
            4 => PathKind::Watcher,
            _ => PathKind::Other,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_accepted(self) -> bool {
        matches!(self, PathKind::Dir | PathKind::File | PathKind::HardLink)
    }
}

/// Returns true if an event with these classifications may trigger a reload
/// (subject to pattern matching).
pub fn is_candidate(event: EventKind, path: PathKind) -> bool {
    event.is_accepted() && path.is_accepted()
}
