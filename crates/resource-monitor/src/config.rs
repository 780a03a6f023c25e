// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Sampling configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! cpu_warmup_ms = 250
//! per_core_warmup_ms = 500
//! process_window_ms = 500
//! io_window_ms = 1000
//! overlap_windows = false
//! proc_root = "/proc"
//! sys_root = "/sys"
//! passwd_path = "/etc/passwd"
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above.

use crate::MonitorError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Window lengths and counter source locations for a [`crate::SamplingSession`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingConfig {
    /// Wait between the two readings of the first global CPU measurement.
    pub cpu_warmup_ms: u64,
    /// Wait between the two readings of the first per-core measurement, and
    /// after every core topology change.
    pub per_core_warmup_ms: u64,
    /// Process accounting window. Long enough for a non-zero tick delta on
    /// idle or virtualised hosts.
    pub process_window_ms: u64,
    /// Network and disk throughput window.
    pub io_window_ms: u64,
    /// Take all "before" readings together and wait once for the longest
    /// window, instead of running each window back to back.
    pub overlap_windows: bool,
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
    pub passwd_path: PathBuf,
}

impl SamplingConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, MonitorError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, MonitorError> {
        toml::from_str(toml_str)
            .map_err(|e| MonitorError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, MonitorError> {
        toml::to_string_pretty(self)
            .map_err(|e| MonitorError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// A configuration whose windows are all zero. Used by tests and by
    /// callers that pace sampling themselves.
    pub fn without_windows() -> Self {
        Self {
            cpu_warmup_ms: 0,
            per_core_warmup_ms: 0,
            process_window_ms: 0,
            io_window_ms: 0,
            ..Self::default()
        }
    }

    pub fn cpu_warmup(&self) -> Duration {
        Duration::from_millis(self.cpu_warmup_ms)
    }

    pub fn per_core_warmup(&self) -> Duration {
        Duration::from_millis(self.per_core_warmup_ms)
    }

    pub fn process_window(&self) -> Duration {
        Duration::from_millis(self.process_window_ms)
    }

    pub fn io_window(&self) -> Duration {
        Duration::from_millis(self.io_window_ms)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            cpu_warmup_ms: 250,
            per_core_warmup_ms: 500,
            process_window_ms: 500,
            io_window_ms: 1000,
            overlap_windows: false,
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
            passwd_path: PathBuf::from("/etc/passwd"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_windows() {
        let config = SamplingConfig::default();
        assert_eq!(config.cpu_warmup(), Duration::from_millis(250));
        assert_eq!(config.per_core_warmup(), Duration::from_millis(500));
        assert_eq!(config.process_window(), Duration::from_millis(500));
        assert_eq!(config.io_window(), Duration::from_secs(1));
        assert!(!config.overlap_windows);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SamplingConfig::from_toml("overlap_windows = true\nio_window_ms = 2000\n").unwrap();
        assert!(config.overlap_windows);
        assert_eq!(config.io_window_ms, 2000);
        assert_eq!(config.process_window_ms, 500);
        assert_eq!(config.proc_root, PathBuf::from("/proc"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = SamplingConfig {
            proc_root: PathBuf::from("/host/proc"),
            ..SamplingConfig::default()
        };
        let text = config.to_toml().unwrap();
        assert_eq!(SamplingConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = SamplingConfig::from_toml("refresh_rate = 3\n");
        assert!(matches!(result, Err(MonitorError::ConfigError(_))));
    }

    #[test]
    fn test_from_missing_file() {
        let result = SamplingConfig::from_file(Path::new("/nonexistent/buzz.toml"));
        assert!(matches!(result, Err(MonitorError::ConfigError(_))));
    }
}
