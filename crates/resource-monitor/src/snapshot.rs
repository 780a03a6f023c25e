// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Aggregated point-in-time system snapshot.
//!
//! A [`SystemSnapshot`] is the result of one sampling cycle: CPU, memory,
//! processes, network, disk and battery, stamped with a UTC timestamp. It
//! serialises to the JSON document written by `buzz snapshot`.

use crate::battery::BatteryStatus;
use crate::disk::{DiskReport, SubsystemStatus};
use crate::memory::MemoryTotals;
use crate::network::InterfaceRate;
use crate::process::ProcessRecord;
use crate::MonitorError;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Busy percentage of one logical core.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct CoreUsage {
    pub core_id: u32,
    pub usage_percent: f64,
}

/// Global CPU usage plus the static CPU description.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct CpuSummary {
    pub usage_percent: f64,
    pub model_name: String,
    pub frequency_mhz: f64,
    pub logical_processors: u32,
    pub running_processes: u64,
    pub per_core: Vec<CoreUsage>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct MemorySummary {
    pub usage_percent: f64,
    #[serde(flatten)]
    pub totals: MemoryTotals,
}

/// A complete reading of the host, produced by
/// [`crate::SamplingSession::collect_snapshot`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SystemSnapshot {
    pub cpu: CpuSummary,
    pub memory: MemorySummary,
    pub processes: Vec<ProcessRecord>,
    pub network: Vec<InterfaceRate>,
    pub disk: DiskReport,
    pub battery: BatteryStatus,
    /// UTC, `YYYY-MM-DDTHH:MM:SSZ`.
    pub timestamp: String,
}

impl SystemSnapshot {
    /// Formats a timestamp the way snapshots carry it.
    pub fn format_timestamp(at: DateTime<Utc>) -> String {
        at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Pretty-printed JSON document.
    pub fn to_json_pretty(&self) -> Result<String, MonitorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the snapshot as pretty JSON to `path`, replacing any file
    /// already there.
    pub fn save_to(&self, path: &Path) -> Result<(), MonitorError> {
        let mut json = self.to_json_pretty()?;
        json.push('\n');
        std::fs::write(path, json).map_err(|source| MonitorError::WriteError {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), "snapshot saved");
        Ok(())
    }

    /// Returns a one-line summary suitable for logging or CLI display.
    ///
    /// # Example output
    /// ```text
    /// System: CPU 12.5% (8 cores), Mem 6144/15872 MB used (38.7%), 312 procs, 2 ifaces, disks available
    /// ```
    pub fn summary(&self) -> String {
        let disk_status = match self.disk.status {
            SubsystemStatus::Available => "available",
            SubsystemStatus::Unavailable => "unavailable",
        };
        format!(
            "System: CPU {:.1}% ({} cores), Mem {}/{} MB used ({:.1}%), \
             {} procs, {} ifaces, disks {disk_status}",
            self.cpu.usage_percent,
            self.cpu.logical_processors,
            self.memory.totals.used_kb() / 1024,
            self.memory.totals.total_kb / 1024,
            self.memory.usage_percent,
            self.processes.len(),
            self.network.len(),
        )
    }
}

/// File name used by `--save` and the dashboard's save command:
/// `buzz-snapshot-YYYYMMDD-HHMMSSZ.json`.
pub fn default_snapshot_filename(now: DateTime<Utc>) -> String {
    format!("buzz-snapshot-{}.json", now.format("%Y%m%d-%H%M%SZ"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ProcessCategory, ProcessIdentity, ProcessState};
    use crate::{SamplingConfig, SamplingSession};
    use chrono::TimeZone;

    fn sample_snapshot() -> SystemSnapshot {
        SystemSnapshot {
            cpu: CpuSummary {
                usage_percent: 12.5,
                model_name: "Cortex-A72".to_string(),
                frequency_mhz: 1800.0,
                logical_processors: 4,
                running_processes: 2,
                per_core: vec![CoreUsage {
                    core_id: 0,
                    usage_percent: 25.0,
                }],
            },
            memory: MemorySummary {
                usage_percent: 50.0,
                totals: MemoryTotals {
                    total_kb: 4_194_304,
                    available_kb: 2_097_152,
                    ..Default::default()
                },
            },
            processes: vec![ProcessRecord {
                identity: ProcessIdentity {
                    pid: 77,
                    name: "editor".to_string(),
                    owner_user: "alice".to_string(),
                    category: ProcessCategory::App,
                },
                state: ProcessState::Sleeping,
                threads: 4,
                cpu_percent: 3.0,
                cpu_time_seconds: 1.5,
                resident_kb: 2048,
                memory_percent: 0.05,
            }],
            network: vec![InterfaceRate {
                interface: "eth0".to_string(),
                download_bytes_per_sec: 1_048_576.0,
                upload_bytes_per_sec: 0.0,
            }],
            disk: DiskReport::from_records(Vec::new()),
            battery: BatteryStatus::unavailable(),
            timestamp: "2025-03-14T15:09:26Z".to_string(),
        }
    }

    #[test]
    fn test_format_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(SystemSnapshot::format_timestamp(at), "2025-01-02T03:04:05Z");
    }

    #[test]
    fn test_default_snapshot_filename() {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        assert_eq!(
            default_snapshot_filename(at),
            "buzz-snapshot-20250314-150926Z.json"
        );
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&sample_snapshot().to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["cpu"]["per_core"][0]["core_id"], 0);
        assert_eq!(json["memory"]["total_kb"], 4_194_304);
        assert_eq!(json["memory"]["usage_percent"], 50.0);
        assert_eq!(json["processes"][0]["pid"], 77);
        assert_eq!(json["processes"][0]["category"], "app");
        assert_eq!(json["network"][0]["interface"], "eth0");
        assert_eq!(json["disk"]["status"], "unavailable");
        assert_eq!(json["battery"]["status"], "Unavailable");
        assert_eq!(json["timestamp"], "2025-03-14T15:09:26Z");
    }

    #[test]
    fn test_save_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        sample_snapshot().save_to(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["cpu"]["model_name"], "Cortex-A72");
    }

    #[test]
    fn test_save_to_missing_dir() {
        let result = sample_snapshot().save_to(Path::new("/nonexistent/dir/snap.json"));
        assert!(matches!(result, Err(MonitorError::WriteError { .. })));
    }

    #[test]
    fn test_summary_format() {
        let summary = sample_snapshot().summary();
        assert!(summary.contains("CPU 12.5%"));
        assert!(summary.contains("4 cores"));
        assert!(summary.contains("2048/4096 MB"));
        assert!(summary.contains("1 procs"));
        assert!(summary.contains("disks unavailable"));
    }

    #[test]
    fn test_live_cycle_on_linux() {
        if Path::new("/proc/stat").exists() {
            let snap = SamplingSession::new(SamplingConfig::without_windows())
                .collect_snapshot()
                .unwrap();
            assert!(snap.cpu.usage_percent >= 0.0 && snap.cpu.usage_percent <= 100.0);
            assert!(!snap.timestamp.is_empty());
        }
    }
}
