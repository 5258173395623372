// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatchError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = WatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.watch, raw.reload))
    }
}

/// Run every semantic check on a freshly parsed config.
pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_patterns(cfg)?;
    validate_patterns(cfg)?;
    validate_debounce(cfg)?;
    validate_reload(cfg)?;
    Ok(())
}

fn ensure_has_patterns(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.patterns.is_empty() {
        return Err(WatchError::Config(
            "[watch].patterns must contain at least one pattern".to_string(),
        ));
    }
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    for (index, pattern) in cfg.watch.patterns.iter().enumerate() {
        if pattern.trim().is_empty() {
            return Err(WatchError::Config(format!(
                "[watch].patterns[{index}] is blank"
            )));
        }
    }
    Ok(())
}

fn validate_debounce(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.debounce_ms == 0 {
        return Err(WatchError::Config(
            "[watch].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_reload(cfg: &RawConfigFile) -> Result<()> {
    if let Some(cmd) = &cfg.reload.cmd {
        if cmd.trim().is_empty() {
            return Err(WatchError::Config(
                "[reload].cmd must not be blank when set".to_string(),
            ));
        }
    }
    Ok(())
}
