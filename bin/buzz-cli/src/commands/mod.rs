// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared setup.

pub mod kill;
pub mod snapshot;
pub mod status;
pub mod top;
pub mod units;

use anyhow::Context;
use resource_monitor::{MonitorError, SamplingConfig, SamplingSession, SystemSnapshot};
use std::path::Path;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the `-v` count picks the level.
/// Output goes to stderr so JSON on stdout stays machine-readable.
pub fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_directive(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .init();
}

fn level_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Reads the `--config` file, or returns the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<SamplingConfig> {
    match path {
        Some(path) => {
            let config = SamplingConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            tracing::info!(path = %path.display(), "configuration loaded");
            Ok(config)
        }
        None => Ok(SamplingConfig::default()),
    }
}

/// A finished cycle: the session to reuse and what it produced.
pub type CycleOutput = (SamplingSession, Result<SystemSnapshot, MonitorError>);

/// Starts one blocking sampling cycle on tokio's blocking pool.
pub fn spawn_cycle(mut session: SamplingSession) -> JoinHandle<CycleOutput> {
    tokio::task::spawn_blocking(move || {
        let result = session.collect_snapshot();
        (session, result)
    })
}

/// Runs one sampling cycle and hands the session back for reuse.
pub async fn collect(session: SamplingSession) -> anyhow::Result<(SamplingSession, SystemSnapshot)> {
    let (session, result) = spawn_cycle(session).await.context("sampling task panicked")?;
    let snapshot = result.context("sampling cycle failed")?;
    Ok((session, snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive(0), "warn");
        assert_eq!(level_directive(1), "info");
        assert_eq!(level_directive(2), "debug");
        assert_eq!(level_directive(9), "trace");
    }

    #[test]
    fn test_load_config_default() {
        assert_eq!(load_config(None).unwrap(), SamplingConfig::default());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/buzz.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/buzz.toml"));
    }
}
