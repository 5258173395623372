// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::engine::QUIESCENCE_WINDOW;

/// Top-level configuration exactly as read from a TOML file.
///
/// ```toml
/// [watch]
/// patterns = ["src/**/*.php", "config/*.{yaml,yml}"]
/// debounce_ms = 150
///
/// [reload]
/// cmd = "kill -USR2 $(cat /run/app.pid)"
/// ```
///
/// Only `[watch].patterns` is required. Use `ConfigFile::try_from` to get a
/// validated [`ConfigFile`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub reload: ReloadSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Patterns to watch. Relative patterns resolve against the directory
    /// containing the config file.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Quiescence window in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    QUIESCENCE_WINDOW.as_millis() as u64
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[reload]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReloadSection {
    /// Shell command run once per reload. When absent, reloads are only
    /// logged.
    #[serde(default)]
    pub cmd: Option<String>,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>`, so holders can rely on
/// a non-empty pattern list and a non-zero debounce window.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    watch: WatchSection,
    reload: ReloadSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(watch: WatchSection, reload: ReloadSection) -> Self {
        Self { watch, reload }
    }

    pub fn patterns(&self) -> &[String] {
        &self.watch.patterns
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms)
    }

    pub fn reload_cmd(&self) -> Option<&str> {
        self.reload.cmd.as_deref()
    }
}
