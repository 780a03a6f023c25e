// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for resource monitoring.

/// Errors that can occur when reading or differencing system counters.
///
/// Only foundational failures surface as a `MonitorError`. A process that
/// exits mid-cycle, or an interface that disappears, is dropped from the
/// result instead.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Failed to read a sysfs or procfs file.
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to write a snapshot file.
    #[error("failed to write {path}: {source}")]
    WriteError {
        path: String,
        source: std::io::Error,
    },

    /// A system file was readable but did not contain the expected record.
    #[error("failed to parse value from {path}: {detail}")]
    ParseError { path: String, detail: String },

    /// The expected procfs/sysfs path does not exist.
    #[error("path not found: {path}")]
    NotAvailable { path: String },

    /// Sampling configuration could not be loaded or saved.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A snapshot could not be serialised.
    #[error("serialisation error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure to deliver a signal to a process.
///
/// Every variant renders a human-readable reason suitable for showing to
/// the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignalError {
    /// PID 0, PID 1 and negative PIDs (process groups) are never signalled.
    #[error("refusing to signal PID {0} (PID <= 1)")]
    RefusedPid(i32),

    /// The signal name or number is not recognised.
    #[error("unknown signal '{0}'")]
    UnknownSignal(String),

    /// The target does not exist (or is not visible to us).
    #[error("process not available: {reason}")]
    NotFound { pid: i32, reason: String },

    /// The target exists but the kernel refused delivery.
    #[error("failed to send signal: {reason}")]
    DeliveryFailed { pid: i32, reason: String },
}
