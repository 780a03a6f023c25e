// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Human-readable units shared by `buzz status` and `buzz top`.

/// `4.2013` → `"4.2%"`.
pub fn percent(value: f64) -> String {
    format!("{value:.1}%")
}

fn scaled(mut value: f64, units: &[&str]) -> String {
    let mut idx = 0;
    while value >= 1024.0 && idx + 1 < units.len() {
        value /= 1024.0;
        idx += 1;
    }
    let precision = if value >= 100.0 { 0 } else { 1 };
    format!("{value:.precision$} {}", units[idx])
}

/// Bytes per second in binary units: `1048576.0` → `"1.0 MB/s"`.
pub fn human_rate(bytes_per_sec: f64) -> String {
    scaled(bytes_per_sec, &["B/s", "KB/s", "MB/s", "GB/s", "TB/s"])
}

/// Byte count in binary units: `8192.0` → `"8.0 KB"`.
pub fn human_bytes_total(bytes: f64) -> String {
    scaled(bytes, &["B", "KB", "MB", "GB", "TB"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(4.2013), "4.2%");
        assert_eq!(percent(100.0), "100.0%");
    }

    #[test]
    fn test_human_rate() {
        assert_eq!(human_rate(0.0), "0.0 B/s");
        assert_eq!(human_rate(512.0), "512 B/s");
        assert_eq!(human_rate(1_048_576.0), "1.0 MB/s");
        assert_eq!(human_rate(1536.0), "1.5 KB/s");
    }

    #[test]
    fn test_human_bytes_total() {
        assert_eq!(human_bytes_total(8192.0), "8.0 KB");
        assert_eq!(human_bytes_total(200.0 * 1024.0 * 1024.0), "200 MB");
        assert_eq!(human_bytes_total(5.0 * 1024f64.powi(5)), "5120 TB");
    }
}
