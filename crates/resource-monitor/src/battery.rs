// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Battery status via `/sys/class/power_supply/`.
//!
//! Static passthrough: the kernel reports a status string (`Charging`,
//! `Discharging`, `Full`, ...) and a capacity percentage. Desktops and
//! servers have no battery at all, which is reported explicitly.

use crate::reader::read_sysfs_file;
use std::path::Path;

/// Status string used when no battery is present.
pub const UNAVAILABLE: &str = "Unavailable";

/// Supplies tried in order; the first one with a readable status wins.
const SUPPLIES: [&str; 2] = ["BAT0", "BAT1"];

/// Battery state as reported by the kernel.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BatteryStatus {
    pub status: String,
    /// `None` when there is no battery or `capacity` did not parse.
    pub capacity_percent: Option<u8>,
}

impl BatteryStatus {
    /// The "no battery" value.
    pub fn unavailable() -> Self {
        Self {
            status: UNAVAILABLE.to_string(),
            capacity_percent: None,
        }
    }

    /// Returns `true` if a battery was found.
    pub fn is_available(&self) -> bool {
        self.status != UNAVAILABLE
    }

    /// Reads the first present battery below `power_supply_dir`.
    pub(crate) fn read_from(power_supply_dir: &Path) -> Self {
        for supply in SUPPLIES {
            let dir = power_supply_dir.join(supply);
            let (Ok(status), Ok(capacity)) = (
                read_sysfs_file(&dir.join("status")),
                read_sysfs_file(&dir.join("capacity")),
            ) else {
                continue;
            };
            return Self {
                status,
                capacity_percent: capacity.parse::<u8>().ok().map(|c| c.min(100)),
            };
        }
        Self::unavailable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supply_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn write_supply(root: &Path, name: &str, status: &str, capacity: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("status"), status).unwrap();
        std::fs::write(dir.join("capacity"), capacity).unwrap();
    }

    #[test]
    fn test_no_battery() {
        let dir = supply_dir();
        let status = BatteryStatus::read_from(dir.path());
        assert_eq!(status, BatteryStatus::unavailable());
        assert!(!status.is_available());
    }

    #[test]
    fn test_bat0() {
        let dir = supply_dir();
        write_supply(dir.path(), "BAT0", "Discharging\n", "87\n");
        let status = BatteryStatus::read_from(dir.path());
        assert_eq!(status.status, "Discharging");
        assert_eq!(status.capacity_percent, Some(87));
    }

    #[test]
    fn test_falls_back_to_bat1() {
        let dir = supply_dir();
        write_supply(dir.path(), "BAT1", "Charging", "40");
        let status = BatteryStatus::read_from(dir.path());
        assert_eq!(status.status, "Charging");
        assert_eq!(status.capacity_percent, Some(40));
    }

    #[test]
    fn test_unparsable_capacity() {
        let dir = supply_dir();
        write_supply(dir.path(), "BAT0", "Full", "n/a");
        let status = BatteryStatus::read_from(dir.path());
        assert!(status.is_available());
        assert_eq!(status.capacity_percent, None);
    }
}
