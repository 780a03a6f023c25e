// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! CPU tick counters and static CPU metadata.
//!
//! Reads CPU state from:
//! - `/proc/stat`: the aggregate `cpu` line, per-core `cpuN` lines and
//!   `procs_running`.
//! - `/proc/cpuinfo`: model name, current clock and logical processor count.
//! - `/sys/devices/system/cpu/online`: fallback core count (e.g. `"0-3"`).
//!
//! Everything here is a pure parse of one reading. Turning two readings into
//! a percentage is [`crate::delta::usage_percent`]'s job.

use crate::MonitorError;

/// Aggregate tick counters for one CPU line of `/proc/stat`.
///
/// `idle_ticks` counts `idle + iowait`; `total_ticks` counts
/// `user + nice + system + idle + iowait + irq + softirq + steal`. Guest time
/// is already accounted inside `user`/`nice`, so it is not added again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct GlobalCpuSample {
    pub idle_ticks: u64,
    pub total_ticks: u64,
}

/// One [`GlobalCpuSample`] per logical core; index is the core id.
pub type PerCoreCpuSample = Vec<GlobalCpuSample>;

/// Static CPU information; read once per cycle, never differenced.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct CpuStaticInfo {
    /// `model name` from `/proc/cpuinfo`, or `"unknown"`.
    pub model_name: String,
    /// `cpu MHz` of the first processor entry; `0.0` when not reported.
    pub frequency_mhz: f64,
    /// Number of logical processors.
    pub logical_processors: u32,
    /// `procs_running` from `/proc/stat`.
    pub running_processes: u64,
}

/// Parses one `cpu`/`cpuN` line into a sample.
///
/// Requires the eight fields from `user` through `steal`; shorter or
/// non-numeric lines yield `None` rather than a partial record.
pub(crate) fn parse_cpu_line(line: &str) -> Option<(String, GlobalCpuSample)> {
    let mut fields = line.split_whitespace();
    let label = fields.next()?;
    if !label.starts_with("cpu") {
        return None;
    }

    let mut values = [0u64; 8];
    for slot in values.iter_mut() {
        *slot = fields.next()?.parse().ok()?;
    }
    let [user, nice, system, idle, iowait, irq, softirq, steal] = values;

    let idle_ticks = idle.saturating_add(iowait);
    let total_ticks = [user, nice, system, irq, softirq, steal]
        .into_iter()
        .fold(idle_ticks, u64::saturating_add);
    Some((
        label.to_string(),
        GlobalCpuSample {
            idle_ticks,
            total_ticks,
        },
    ))
}

/// Extracts the aggregate `cpu` line from `/proc/stat` content.
pub(crate) fn parse_global_cpu(content: &str, path: &str) -> Result<GlobalCpuSample, MonitorError> {
    content
        .lines()
        .filter(|line| line.starts_with("cpu "))
        .find_map(parse_cpu_line)
        .map(|(_, sample)| sample)
        .ok_or_else(|| MonitorError::ParseError {
            path: path.to_string(),
            detail: "aggregate cpu line not found".to_string(),
        })
}

/// Extracts every `cpuN` line, ordered by core id.
///
/// Malformed core lines are skipped. Holes in the id sequence (offline
/// cores) are compacted, so the result is always indexed `0..len`.
pub(crate) fn parse_per_core(content: &str) -> PerCoreCpuSample {
    let mut cores: Vec<(u32, GlobalCpuSample)> = content
        .lines()
        .filter_map(parse_cpu_line)
        .filter_map(|(label, sample)| {
            let id = label.strip_prefix("cpu")?.parse::<u32>().ok()?;
            Some((id, sample))
        })
        .collect();
    cores.sort_by_key(|(id, _)| *id);
    cores.into_iter().map(|(_, sample)| sample).collect()
}

/// Reads `procs_running` from `/proc/stat` content; `0` when absent.
pub(crate) fn parse_procs_running(content: &str) -> u64 {
    content
        .lines()
        .find_map(|line| line.strip_prefix("procs_running "))
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

/// Parses `/proc/cpuinfo` into model name, MHz and processor count.
///
/// The processor count is `0` if no `processor` entries are present; the
/// caller decides on a fallback.
pub(crate) fn parse_cpuinfo(content: &str) -> (String, f64, u32) {
    let mut model_name: Option<String> = None;
    let mut mhz: Option<f64> = None;
    let mut processors = 0u32;

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "processor" => processors += 1,
            "model name" if model_name.is_none() => model_name = Some(value.trim().to_string()),
            "cpu MHz" if mhz.is_none() => mhz = value.trim().parse().ok(),
            _ => {}
        }
    }

    (
        model_name.unwrap_or_else(|| "unknown".to_string()),
        mhz.unwrap_or(0.0),
        processors,
    )
}

/// Parses a CPU range string like `"0-3"` → 4, `"0-7"` → 8, `"0"` → 1, `"0,2-3"` → 3.
pub(crate) fn parse_cpu_range(s: &str) -> Option<u32> {
    let mut total = 0u32;
    for part in s.split(',') {
        let part = part.trim();
        if let Some((start_s, end_s)) = part.split_once('-') {
            let start: u32 = start_s.trim().parse().ok()?;
            let end: u32 = end_s.trim().parse().ok()?;
            total += end.checked_sub(start)? + 1;
        } else {
            let _: u32 = part.parse().ok()?;
            total += 1;
        }
    }
    if total > 0 {
        Some(total)
    } else {
        None
    }
}
