#![allow(dead_code)]

use reloadwatch::config::{ConfigFile, RawConfigFile, ReloadSection, WatchSection};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                watch: WatchSection::default(),
                reload: ReloadSection::default(),
            },
        }
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.config.watch.patterns.push(pattern.to_string());
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.watch.debounce_ms = ms;
        self
    }

    pub fn with_reload_cmd(mut self, cmd: &str) -> Self {
        self.config.reload.cmd = Some(cmd.to_string());
        self
    }

    /// The raw config, for tests that exercise validation failures.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
