// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-process CPU and memory accounting.
//!
//! A process's CPU share is only defined over a window, so the process set
//! is read twice:
//!
//! ```text
//! enumerate()  ──►  T0: total0 + {pid → identity, counters}
//!      │
//!   window (SampleClock::wait)
//!      │
//! reconcile()  ──►  T1: total1 + re-read each T0 pid
//!                     ├─ gone / unreadable → dropped
//!                     └─ alive → ProcessRecord
//! ```
//!
//! Processes that appear between T0 and T1 are picked up on the next cycle.

use crate::cpu::GlobalCpuSample;
use crate::delta::{counter_delta, process_cpu_percent, share_percent};
use crate::reader::CounterSource;
use crate::MonitorError;
use std::collections::HashMap;
use std::fmt;

/// Owner name used when a UID has no passwd entry.
pub const UNKNOWN_USER: &str = "unknown";

/// Coarse split between system services and user-facing programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessCategory {
    Background,
    App,
}

/// Scheduler state, from the state letter in `/proc/<pid>/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ProcessState {
    Running,
    Sleeping,
    SleepingUninterruptible,
    Zombie,
    TracedOrStopped,
    Unknown,
}

impl ProcessState {
    /// Maps a kernel state letter. Idle kernel threads (`I`) and the other
    /// rarer states are reported as `Unknown`.
    pub fn from_code(code: char) -> Self {
        match code {
            'R' => Self::Running,
            'S' => Self::Sleeping,
            'D' => Self::SleepingUninterruptible,
            'Z' => Self::Zombie,
            'T' | 't' => Self::TracedOrStopped,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "Running",
            Self::Sleeping => "Sleeping",
            Self::SleepingUninterruptible => "Sleeping, Uninterruptible",
            Self::Zombie => "Zombie",
            Self::TracedOrStopped => "Traced or Stopped",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Raw name/owner read from procfs, before the user name is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessMeta {
    pub name: String,
    pub uid: u32,
}

/// Who a process is. Fixed for the duration of one cycle.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ProcessIdentity {
    pub pid: i32,
    pub name: String,
    pub owner_user: String,
    pub category: ProcessCategory,
}

/// One reading of a process's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessCounterSample {
    pub pid: i32,
    /// `utime + stime`, cumulative since the process started.
    pub cpu_ticks: u64,
    /// Resident set size at read time.
    pub resident_kb: u64,
    pub thread_count: u32,
    pub state: ProcessState,
}

/// A reconciled process, as reported in a snapshot.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ProcessRecord {
    #[serde(flatten)]
    pub identity: ProcessIdentity,
    pub state: ProcessState,
    pub threads: u32,
    /// Share of one core over the window, in `[0, 100]`.
    pub cpu_percent: f64,
    /// Total CPU time consumed since the process started.
    pub cpu_time_seconds: f64,
    pub resident_kb: u64,
    /// Resident memory as a share of total memory, in `[0, 100]`.
    pub memory_percent: f64,
}

// ── Categorisation ─────────────────────────────────────────────

/// Decides whether a process counts as a background service or an app.
///
/// This is a display heuristic, not a security boundary. Implement it to
/// substitute a stricter policy; closures of the right shape work too.
pub trait CategoryPolicy: Send + Sync {
    fn classify(&self, name: &str, owner: &str) -> ProcessCategory;
}

impl<F> CategoryPolicy for F
where
    F: Fn(&str, &str) -> ProcessCategory + Send + Sync,
{
    fn classify(&self, name: &str, owner: &str) -> ProcessCategory {
        self(name, owner)
    }
}

/// Default policy: root-owned processes and daemon-style names
/// (`sshd`, `systemd`, `dbus-daemon`, ...) are background.
#[derive(Debug, Clone, Copy, Default)]
pub struct DaemonHeuristic;

impl CategoryPolicy for DaemonHeuristic {
    fn classify(&self, name: &str, owner: &str) -> ProcessCategory {
        let base = name.trim_end_matches(|c: char| c.is_ascii_digit() || c == '/' || c == ':');
        if owner == "root" || base.ends_with('d') || name.contains("daemon") {
            ProcessCategory::Background
        } else {
            ProcessCategory::App
        }
    }
}

// ── Parsing ────────────────────────────────────────────────────

/// Builds a counter sample from the contents of `stat`, `status` and
/// (optionally) `statm`.
///
/// `stat` supplies the state letter and `utime`/`stime` (fields 14 and 15).
/// The command name in field 2 may contain spaces and parentheses, so
/// fields are counted from the last `)`. RSS comes from `VmRSS` in
/// `status`, falling back to resident pages in `statm` for processes that
/// do not report it.
pub(crate) fn parse_counters(
    pid: i32,
    stat: &str,
    status: &str,
    statm: Option<&str>,
    page_kb: u64,
) -> Option<ProcessCounterSample> {
    let after_comm = &stat[stat.rfind(')')? + 1..];
    let fields: Vec<&str> = after_comm.split_whitespace().collect();
    // fields[0] is field 3 (state); utime/stime are fields 14/15.
    let state = ProcessState::from_code(fields.first()?.chars().next()?);
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;

    let mut resident_kb = status_value(status, "VmRSS:").unwrap_or(0);
    if resident_kb == 0 {
        resident_kb = statm
            .and_then(|s| s.split_whitespace().nth(1))
            .and_then(|pages| pages.parse::<u64>().ok())
            .map(|pages| pages.saturating_mul(page_kb))
            .unwrap_or(0);
    }

    Some(ProcessCounterSample {
        pid,
        cpu_ticks: utime.saturating_add(stime),
        resident_kb,
        thread_count: status_value(status, "Threads:").unwrap_or(0) as u32,
        state,
    })
}

/// Real UID (first value of the `Uid:` line) from `/proc/<pid>/status`.
pub(crate) fn parse_status_uid(status: &str) -> Option<u32> {
    status_value(status, "Uid:").map(|uid| uid as u32)
}

/// First numeric value after `key` in a `status`-style file.
fn status_value(status: &str, key: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|v| v.parse().ok())
}

/// Finds the user name for `uid` in `/etc/passwd`-formatted content.
pub(crate) fn lookup_passwd(content: &str, uid: u32) -> Option<String> {
    content.lines().find_map(|line| {
        let mut fields = line.split(':');
        let name = fields.next()?;
        let entry_uid: u32 = fields.nth(1)?.parse().ok()?;
        (entry_uid == uid && !name.is_empty()).then(|| name.to_string())
    })
}

// ── Reconciliation ─────────────────────────────────────────────

/// The T0 half of a process accounting window.
#[derive(Debug, Clone)]
pub struct ProcessBaseline {
    pub(crate) total: GlobalCpuSample,
    pub(crate) entries: Vec<(ProcessIdentity, ProcessCounterSample)>,
}

impl ProcessBaseline {
    /// Number of processes seen at T0.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Host facts needed to turn deltas into percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileContext {
    pub logical_cores: u32,
    pub total_memory_kb: u64,
    pub clock_ticks_per_second: u64,
}

/// T0: snapshots the global CPU counters, then every process.
///
/// Processes that exit while being enumerated are skipped. Failing to list
/// the process table at all aborts the cycle.
pub fn enumerate(
    source: &dyn CounterSource,
    policy: &dyn CategoryPolicy,
) -> Result<ProcessBaseline, MonitorError> {
    let total = source.read_global_cpu()?;
    let pids = source.list_pids()?;

    let mut users: HashMap<u32, String> = HashMap::new();
    let mut entries = Vec::with_capacity(pids.len());

    for pid in pids {
        let Some(meta) = source.read_process_meta(pid) else {
            tracing::debug!(pid, "process vanished during enumeration");
            continue;
        };
        let Some(counters) = source.read_process_counters(pid) else {
            tracing::debug!(pid, "process counters unreadable at T0");
            continue;
        };
        let owner = users
            .entry(meta.uid)
            .or_insert_with(|| {
                source
                    .resolve_user(meta.uid)
                    .unwrap_or_else(|| UNKNOWN_USER.to_string())
            })
            .clone();
        let category = policy.classify(&meta.name, &owner);

        entries.push((
            ProcessIdentity {
                pid,
                name: meta.name,
                owner_user: owner,
                category,
            },
            counters,
        ));
    }

    Ok(ProcessBaseline { total, entries })
}

/// T1: re-reads the global CPU counters and every T0 process, and
/// converts the deltas into records.
///
/// A process whose counters can no longer be read is treated as exited
/// and dropped.
pub fn reconcile(
    baseline: ProcessBaseline,
    source: &dyn CounterSource,
    ctx: ReconcileContext,
) -> Result<Vec<ProcessRecord>, MonitorError> {
    let total1 = source.read_global_cpu()?;
    let delta_total = counter_delta(baseline.total.total_ticks, total1.total_ticks).max(1);
    let ticks_per_second = ctx.clock_ticks_per_second.max(1) as f64;
    let seen = baseline.entries.len();

    let records: Vec<ProcessRecord> = baseline
        .entries
        .into_iter()
        .filter_map(|(identity, t0)| {
            let Some(t1) = source.read_process_counters(identity.pid) else {
                tracing::debug!(pid = identity.pid, name = %identity.name, "process exited during window");
                return None;
            };
            let delta_proc = counter_delta(t0.cpu_ticks, t1.cpu_ticks);
            Some(ProcessRecord {
                state: t1.state,
                threads: t1.thread_count,
                cpu_percent: process_cpu_percent(delta_proc, delta_total, ctx.logical_cores),
                cpu_time_seconds: t1.cpu_ticks as f64 / ticks_per_second,
                resident_kb: t1.resident_kb,
                memory_percent: share_percent(t1.resident_kb, ctx.total_memory_kb),
                identity,
            })
        })
        .collect();

    tracing::debug!(
        seen,
        alive = records.len(),
        delta_total,
        "process set reconciled"
    );
    Ok(records)
}
