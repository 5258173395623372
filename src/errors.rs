// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    /// The pattern could not be resolved to an absolute path.
    #[error("invalid watch pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("at least one watch pattern is required")]
    NoPatterns,

    /// A watcher is already active for this instance or slot.
    #[error("a watcher is already running")]
    AlreadyRunning,

    /// The watcher has been drained; start a new instance instead.
    #[error("watcher has been stopped and cannot be restarted")]
    Stopped,

    #[error("unable to start watching {root:?}: {reason}")]
    UnableToStartWatching { root: PathBuf, reason: String },

    /// Native teardown failed. Only ever logged, never returned from `drain`.
    #[error("failed to stop watching {root:?}: {reason}")]
    SessionStop { root: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, WatchError>;
