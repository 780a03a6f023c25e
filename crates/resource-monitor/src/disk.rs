// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Block device I/O counters from `/proc/diskstats`.
//!
//! Counters are reported as-is (cumulative since boot) together with read
//! and write throughput over the session's I/O window.

use crate::delta::rate_per_second;
use std::collections::HashMap;

/// `/proc/diskstats` always counts in 512-byte sectors, whatever the
/// device's physical sector size.
pub const SECTOR_BYTES: u64 = 512;

/// Cumulative I/O counters of one block device.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DiskCounterSample {
    pub device: String,
    pub reads_completed: u64,
    pub writes_completed: u64,
    pub sectors_read: u64,
    pub sectors_written: u64,
    pub read_time_ms: u64,
    pub write_time_ms: u64,
}

/// A device's counters plus its throughput over the last window.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DiskRecord {
    #[serde(flatten)]
    pub counters: DiskCounterSample,
    pub read_bytes_per_sec: f64,
    pub write_bytes_per_sec: f64,
}

/// Whether a subsystem produced any data this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubsystemStatus {
    Available,
    Unavailable,
}

/// Disk section of a snapshot.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DiskReport {
    pub status: SubsystemStatus,
    pub disks: Vec<DiskRecord>,
}

impl DiskReport {
    /// Builds the report, flagging it unavailable when no device survived
    /// the filter.
    pub fn from_records(disks: Vec<DiskRecord>) -> Self {
        let status = if disks.is_empty() {
            SubsystemStatus::Unavailable
        } else {
            SubsystemStatus::Available
        };
        Self { status, disks }
    }
}

/// Loopback and RAM-backed devices carry no useful I/O signal.
pub(crate) fn is_pseudo_device(name: &str) -> bool {
    name.starts_with("loop") || name.starts_with("ram") || name.starts_with("zram")
}

/// Parses `/proc/diskstats` content, dropping pseudo devices.
///
/// Line format: `major minor name rd_ios rd_merges rd_sectors rd_ticks
/// wr_ios wr_merges wr_sectors wr_ticks in_flight io_ticks time_in_queue ...`.
/// Lines with fewer than the eleven stat fields are skipped.
pub(crate) fn parse_diskstats(content: &str) -> Vec<DiskCounterSample> {
    content
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 14 {
                return None;
            }
            parts[0].parse::<u32>().ok()?;
            parts[1].parse::<u32>().ok()?;
            let device = parts[2];
            if is_pseudo_device(device) {
                return None;
            }

            let mut stats = [0u64; 11];
            for (slot, raw) in stats.iter_mut().zip(&parts[3..14]) {
                *slot = raw.parse().ok()?;
            }
            Some(DiskCounterSample {
                device: device.to_string(),
                reads_completed: stats[0],
                sectors_read: stats[2],
                read_time_ms: stats[3],
                writes_completed: stats[4],
                sectors_written: stats[6],
                write_time_ms: stats[7],
            })
        })
        .collect()
}

/// Joins two disk readings by device name into records with throughput.
///
/// Devices without a baseline still get reported, with zero rates.
pub fn disk_records(
    before: &[DiskCounterSample],
    after: Vec<DiskCounterSample>,
    elapsed_seconds: f64,
) -> Vec<DiskRecord> {
    let baseline: HashMap<&str, &DiskCounterSample> =
        before.iter().map(|d| (d.device.as_str(), d)).collect();

    after
        .into_iter()
        .map(|cur| {
            let (read_bytes_per_sec, write_bytes_per_sec) = match baseline.get(cur.device.as_str()) {
                Some(prev) => (
                    rate_per_second(prev.sectors_read, cur.sectors_read, elapsed_seconds)
                        * SECTOR_BYTES as f64,
                    rate_per_second(prev.sectors_written, cur.sectors_written, elapsed_seconds)
                        * SECTOR_BYTES as f64,
                ),
                None => (0.0, 0.0),
            };
            DiskRecord {
                counters: cur,
                read_bytes_per_sec,
                write_bytes_per_sec,
            }
        })
        .collect()
}
