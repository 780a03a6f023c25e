// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Point-in-time counter reads.
//!
//! [`CounterSource`] is the seam between the accounting engine and the
//! kernel. Every method performs one read and returns immediately; none of
//! them waits for a second sample. [`ProcFs`] is the production
//! implementation. Its roots are configurable so tests can point it at a
//! fake `/proc` tree.

use crate::battery::BatteryStatus;
use crate::cpu::{self, CpuStaticInfo, GlobalCpuSample, PerCoreCpuSample};
use crate::disk::{self, DiskCounterSample};
use crate::memory::MemoryTotals;
use crate::network::{self, InterfaceByteSample};
use crate::process::{self, ProcessCounterSample, ProcessMeta};
use crate::{MonitorError, SamplingConfig};
use std::path::{Path, PathBuf};

/// Fallback when `sysconf(_SC_CLK_TCK)` is unavailable; the value on every
/// mainstream Linux architecture.
const DEFAULT_CLOCK_TICKS: u64 = 100;

/// Source of raw kernel counter readings.
///
/// Per-entity reads return `Option` so that "the process exited" is
/// never confused with a fault. Foundational reads return `Result`.
pub trait CounterSource: Send {
    /// Aggregate CPU ticks (the `cpu` line of `/proc/stat`).
    fn read_global_cpu(&self) -> Result<GlobalCpuSample, MonitorError>;

    /// Per-core CPU ticks, indexed by core id.
    fn read_per_core_cpu(&self) -> Result<PerCoreCpuSample, MonitorError>;

    /// All PIDs currently in the process table, ascending.
    fn list_pids(&self) -> Result<Vec<i32>, MonitorError>;

    /// Name and owner of a process, or `None` if it is gone.
    fn read_process_meta(&self, pid: i32) -> Option<ProcessMeta>;

    /// Counters of a process, or `None` if it is gone or unreadable.
    fn read_process_counters(&self, pid: i32) -> Option<ProcessCounterSample>;

    /// User name for a UID.
    fn resolve_user(&self, uid: u32) -> Option<String>;

    /// Cumulative byte counters of every interface.
    fn read_interfaces(&self) -> Result<Vec<InterfaceByteSample>, MonitorError>;

    /// Cumulative I/O counters of every physical block device.
    fn read_disks(&self) -> Result<Vec<DiskCounterSample>, MonitorError>;

    /// Current memory totals.
    fn read_memory_totals(&self) -> Result<MemoryTotals, MonitorError>;

    /// Model name, clock, core count and runnable process count.
    fn read_cpu_info(&self) -> CpuStaticInfo;

    /// Battery state, or the explicit unavailable value.
    fn read_battery(&self) -> BatteryStatus;

    /// Kernel ticks per second, for converting jiffies to seconds.
    fn clock_ticks_per_second(&self) -> u64;
}

/// [`CounterSource`] backed by procfs and sysfs.
#[derive(Debug, Clone)]
pub struct ProcFs {
    proc_root: PathBuf,
    sys_root: PathBuf,
    passwd_path: PathBuf,
    page_kb: u64,
    clock_ticks: u64,
}

impl ProcFs {
    /// Reads from the host's `/proc`, `/sys` and `/etc/passwd`.
    pub fn new() -> Self {
        Self::with_roots("/proc", "/sys", "/etc/passwd")
    }

    /// Reads from alternative roots (containers with a host mount, tests).
    pub fn with_roots(
        proc_root: impl Into<PathBuf>,
        sys_root: impl Into<PathBuf>,
        passwd_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            proc_root: proc_root.into(),
            sys_root: sys_root.into(),
            passwd_path: passwd_path.into(),
            page_kb: page_size_kb(),
            clock_ticks: clock_ticks(),
        }
    }

    /// Builds a reader from the roots named in a sampling configuration.
    pub fn from_config(config: &SamplingConfig) -> Self {
        Self::with_roots(&config.proc_root, &config.sys_root, &config.passwd_path)
    }

    fn proc_path(&self, rel: &str) -> PathBuf {
        self.proc_root.join(rel)
    }

    fn pid_path(&self, pid: i32, file: &str) -> PathBuf {
        self.proc_root.join(pid.to_string()).join(file)
    }

    /// Logical processor count when `/proc/cpuinfo` has no `processor` lines.
    ///
    /// Tries `<sys>/devices/system/cpu/online` first (e.g. `"0-3"` → 4), then
    /// `std::thread::available_parallelism()`.
    fn fallback_core_count(&self) -> u32 {
        let online = self.sys_root.join("devices/system/cpu/online");
        if let Some(count) = read_sysfs_file(&online)
            .ok()
            .and_then(|content| cpu::parse_cpu_range(&content))
        {
            return count;
        }
        std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1)
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for ProcFs {
    fn read_global_cpu(&self) -> Result<GlobalCpuSample, MonitorError> {
        let path = self.proc_path("stat");
        let content = read_proc_file(&path)?;
        cpu::parse_global_cpu(&content, &path.display().to_string())
    }

    fn read_per_core_cpu(&self) -> Result<PerCoreCpuSample, MonitorError> {
        let content = read_proc_file(&self.proc_path("stat"))?;
        Ok(cpu::parse_per_core(&content))
    }

    fn list_pids(&self) -> Result<Vec<i32>, MonitorError> {
        let entries = std::fs::read_dir(&self.proc_root).map_err(|e| MonitorError::ReadError {
            path: self.proc_root.display().to_string(),
            source: e,
        })?;

        let mut pids: Vec<i32> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name();
                let name = name.to_str()?;
                if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                name.parse().ok()
            })
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    fn read_process_meta(&self, pid: i32) -> Option<ProcessMeta> {
        let name = std::fs::read_to_string(self.pid_path(pid, "comm")).ok()?;
        let status = std::fs::read_to_string(self.pid_path(pid, "status")).ok()?;
        Some(ProcessMeta {
            name: name.trim_end_matches('\n').to_string(),
            uid: process::parse_status_uid(&status)?,
        })
    }

    fn read_process_counters(&self, pid: i32) -> Option<ProcessCounterSample> {
        let stat = std::fs::read_to_string(self.pid_path(pid, "stat")).ok()?;
        let status = std::fs::read_to_string(self.pid_path(pid, "status")).ok()?;
        let statm = std::fs::read_to_string(self.pid_path(pid, "statm")).ok();
        process::parse_counters(pid, &stat, &status, statm.as_deref(), self.page_kb)
    }

    fn resolve_user(&self, uid: u32) -> Option<String> {
        let content = std::fs::read_to_string(&self.passwd_path).ok()?;
        process::lookup_passwd(&content, uid)
    }

    fn read_interfaces(&self) -> Result<Vec<InterfaceByteSample>, MonitorError> {
        let content = read_proc_file(&self.proc_path("net/dev"))?;
        Ok(network::parse_net_dev(&content))
    }

    fn read_disks(&self) -> Result<Vec<DiskCounterSample>, MonitorError> {
        let content = read_proc_file(&self.proc_path("diskstats"))?;
        Ok(disk::parse_diskstats(&content))
    }

    fn read_memory_totals(&self) -> Result<MemoryTotals, MonitorError> {
        let path = self.proc_path("meminfo");
        let content = read_proc_file(&path)?;
        MemoryTotals::parse(&content, &path.display().to_string())
    }

    fn read_cpu_info(&self) -> CpuStaticInfo {
        let (model_name, frequency_mhz, mut logical_processors) =
            match std::fs::read_to_string(self.proc_path("cpuinfo")) {
                Ok(content) => cpu::parse_cpuinfo(&content),
                Err(e) => {
                    tracing::debug!("cpuinfo unreadable: {e}");
                    ("unknown".to_string(), 0.0, 0)
                }
            };
        if logical_processors == 0 {
            logical_processors = self.fallback_core_count();
        }
        let running_processes = std::fs::read_to_string(self.proc_path("stat"))
            .map(|content| cpu::parse_procs_running(&content))
            .unwrap_or(0);

        CpuStaticInfo {
            model_name,
            frequency_mhz,
            logical_processors,
            running_processes,
        }
    }

    fn read_battery(&self) -> BatteryStatus {
        BatteryStatus::read_from(&self.sys_root.join("class/power_supply"))
    }

    fn clock_ticks_per_second(&self) -> u64 {
        self.clock_ticks
    }
}

/// Reads a procfs file whole, mapping a missing file to `NotAvailable`.
fn read_proc_file(path: &Path) -> Result<String, MonitorError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => MonitorError::NotAvailable {
            path: path.display().to_string(),
        },
        _ => MonitorError::ReadError {
            path: path.display().to_string(),
            source: e,
        },
    })
}

/// Reads a sysfs/procfs file and returns its trimmed content.
pub(crate) fn read_sysfs_file(path: &Path) -> Result<String, MonitorError> {
    if !path.exists() {
        return Err(MonitorError::NotAvailable {
            path: path.display().to_string(),
        });
    }
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| MonitorError::ReadError {
            path: path.display().to_string(),
            source: e,
        })
}

fn clock_ticks() -> u64 {
    // SAFETY: sysconf has no preconditions and only reads a constant.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 {
        ticks as u64
    } else {
        DEFAULT_CLOCK_TICKS
    }
}

fn page_size_kb() -> u64 {
    // SAFETY: as above.
    let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page >= 1024 {
        page as u64 / 1024
    } else {
        4
    }
}
