// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # resource-monitor
//!
//! Differential accounting over Linux kernel counters. The kernel only
//! exposes cumulative totals (CPU ticks, bytes, sectors), so every metric
//! here is derived from two readings taken a known interval apart.
//!
//! # Layers
//! - **Counter reader** ([`CounterSource`], [`ProcFs`]): single point-in-time
//!   reads of `/proc` and `/sys`.
//! - **Differencer** ([`delta`]): overflow-safe deltas, clamped percentages
//!   and per-second rates.
//! - **Process reconciler** ([`process`]): matches the T0 and T1 process
//!   sets and drops processes that exited in between.
//! - **Aggregator** ([`SamplingSession`]): owns the sampling windows and the
//!   rolling CPU state, and produces a [`SystemSnapshot`].
//!
//! # Graceful Degradation
//! Only the process table and the aggregate CPU line are required. Missing
//! memory, disk, network or battery sources degrade to zeroes, empty lists
//! or an explicit "unavailable" status.
//!
//! # Example
//! ```no_run
//! use resource_monitor::{SamplingConfig, SamplingSession};
//!
//! let mut session = SamplingSession::new(SamplingConfig::default());
//! let snap = session.collect_snapshot().expect("failed to read system state");
//! println!("{}", snap.summary());
//! ```

pub mod battery;
mod config;
pub mod cpu;
pub mod delta;
pub mod disk;
mod error;
pub mod memory;
pub mod network;
pub mod process;
mod reader;
mod session;
pub mod signal;
mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

pub use battery::BatteryStatus;
pub use config::SamplingConfig;
pub use cpu::{CpuStaticInfo, GlobalCpuSample, PerCoreCpuSample};
pub use disk::{DiskCounterSample, DiskRecord, DiskReport, SubsystemStatus};
pub use error::{MonitorError, SignalError};
pub use memory::MemoryTotals;
pub use network::{InterfaceByteSample, InterfaceRate};
pub use process::{
    CategoryPolicy, DaemonHeuristic, ProcessCategory, ProcessCounterSample, ProcessIdentity,
    ProcessMeta, ProcessRecord, ProcessState,
};
pub use reader::{CounterSource, ProcFs};
pub use session::{SampleClock, SamplingSession, SystemClock};
pub use signal::{guard_pid, parse_signal, send_signal};
pub use snapshot::{default_snapshot_filename, CoreUsage, CpuSummary, MemorySummary, SystemSnapshot};
