// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! System memory totals via `/proc/meminfo`.
//!
//! The kernel already reports current state here, so nothing is
//! differenced. All values are kept in kB, as the kernel reports them.

use crate::delta::clamp_percent;
use crate::MonitorError;

/// Instantaneous memory totals, in kB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MemoryTotals {
    pub total_kb: u64,
    /// `MemAvailable`, or `MemFree + Buffers + Cached` on kernels that
    /// predate it.
    pub available_kb: u64,
    pub cached_kb: u64,
    pub swap_free_kb: u64,
    pub swap_total_kb: u64,
}

impl MemoryTotals {
    /// Parses the content of a `/proc/meminfo`-formatted string.
    ///
    /// Only `MemTotal` is mandatory. Lines that do not parse are skipped.
    pub fn parse(content: &str, source_path: &str) -> Result<Self, MonitorError> {
        let mut total_kb: Option<u64> = None;
        let mut available_kb: Option<u64> = None;
        let mut free_kb = 0u64;
        let mut buffers_kb = 0u64;
        let mut totals = Self::default();

        for line in content.lines() {
            let mut parts = line.split_whitespace();
            let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };
            let Ok(value) = value.parse::<u64>() else {
                continue;
            };
            match key {
                "MemTotal:" => total_kb = Some(value),
                "MemAvailable:" => available_kb = Some(value),
                "MemFree:" => free_kb = value,
                "Buffers:" => buffers_kb = value,
                "Cached:" => totals.cached_kb = value,
                "SwapTotal:" => totals.swap_total_kb = value,
                "SwapFree:" => totals.swap_free_kb = value,
                _ => {}
            }
        }

        totals.total_kb = total_kb.ok_or_else(|| MonitorError::ParseError {
            path: source_path.to_string(),
            detail: "MemTotal not found".to_string(),
        })?;
        totals.available_kb = available_kb
            .unwrap_or(free_kb + buffers_kb + totals.cached_kb)
            .min(totals.total_kb);
        Ok(totals)
    }

    /// Memory in use as a percentage of total: `100 * (1 - available/total)`.
    ///
    /// `0` when the total is unknown.
    pub fn usage_percent(&self) -> f64 {
        if self.total_kb == 0 {
            return 0.0;
        }
        clamp_percent(100.0 * (1.0 - self.available_kb as f64 / self.total_kb as f64))
    }

    /// Memory in use, in kB.
    pub fn used_kb(&self) -> u64 {
        self.total_kb.saturating_sub(self.available_kb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_MEMINFO: &str = "\
MemTotal:        3884292 kB
MemFree:          218456 kB
MemAvailable:    2456780 kB
Buffers:          123456 kB
Cached:          1987654 kB
SwapCached:            0 kB
Active:          1234567 kB
Inactive:         876543 kB
SwapTotal:       2097148 kB
SwapFree:        2000000 kB
";

    #[test]
    fn test_parse_meminfo() {
        let info = MemoryTotals::parse(SAMPLE_MEMINFO, "/proc/meminfo").unwrap();
        assert_eq!(info.total_kb, 3884292);
        assert_eq!(info.available_kb, 2456780);
        assert_eq!(info.cached_kb, 1987654);
        assert_eq!(info.swap_total_kb, 2097148);
        assert_eq!(info.swap_free_kb, 2000000);
        assert_eq!(info.used_kb(), 3884292 - 2456780);
    }

    #[test]
    fn test_usage_percent() {
        let info = MemoryTotals {
            total_kb: 4_000_000,
            available_kb: 1_000_000,
            ..Default::default()
        };
        assert!((info.usage_percent() - 75.0).abs() < 0.001);
    }

    #[test]
    fn test_usage_percent_zero_total() {
        assert_eq!(MemoryTotals::default().usage_percent(), 0.0);
    }

    #[test]
    fn test_missing_mem_available_falls_back() {
        let old_kernel = "MemTotal: 1000 kB\nMemFree: 100 kB\nBuffers: 50 kB\nCached: 250 kB\n";
        let info = MemoryTotals::parse(old_kernel, "/proc/meminfo").unwrap();
        assert_eq!(info.available_kb, 400);
    }

    #[test]
    fn test_missing_mem_total() {
        let incomplete = "MemFree:          218456 kB\n";
        let result = MemoryTotals::parse(incomplete, "/proc/meminfo");
        assert!(matches!(result, Err(MonitorError::ParseError { .. })));
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let content = "MemTotal: 2048 kB\nCached: lots kB\nbroken\nSwapFree: 12 kB\n";
        let info = MemoryTotals::parse(content, "/proc/meminfo").unwrap();
        assert_eq!(info.total_kb, 2048);
        assert_eq!(info.cached_kb, 0);
        assert_eq!(info.swap_free_kb, 12);
    }
}
