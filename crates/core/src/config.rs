// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration
//!
//! Loaded from TOML; every field has a default so a missing or partial file
//! is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables for regeneration, synchronization and the cleanup sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum spacing between non-forced regenerations of one ticker
    #[serde(with = "humantime_serde")]
    pub cooldown: Duration,
    /// Horizon for "has a future occurrence" during synchronization
    #[serde(with = "humantime_serde")]
    pub sync_lookahead: Duration,
    /// Horizon for the cleanup sweep
    #[serde(with = "humantime_serde")]
    pub cleanup_lookahead: Duration,
    /// Daemon background tick
    #[serde(with = "humantime_serde")]
    pub background_interval: Duration,
    /// Daemon cleanup sweep trigger
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
    /// Daemon due-alarm poll
    #[serde(with = "humantime_serde")]
    pub alarm_check_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(5 * 60),
            sync_lookahead: Duration::from_secs(365 * 24 * 60 * 60),
            cleanup_lookahead: Duration::from_secs(24 * 60 * 60),
            background_interval: Duration::from_secs(15 * 60),
            sweep_interval: Duration::from_secs(6 * 60 * 60),
            alarm_check_interval: Duration::from_secs(1),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Convert a configured duration to calendar arithmetic, saturating on overflow
pub fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
