// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-interface throughput from `/proc/net/dev`.

use crate::delta::rate_per_second;
use std::collections::HashMap;

/// Cumulative byte counters of one interface.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct InterfaceByteSample {
    pub name: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Throughput of one interface over a sampling window.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct InterfaceRate {
    pub interface: String,
    pub download_bytes_per_sec: f64,
    pub upload_bytes_per_sec: f64,
}

/// Parses `/proc/net/dev` content.
///
/// The two header lines are skipped. Each data line is
/// `name: rx_bytes rx_packets ... (8 rx fields) tx_bytes ...`.
pub(crate) fn parse_net_dev(content: &str) -> Vec<InterfaceByteSample> {
    content
        .lines()
        .skip(2)
        .filter_map(|line| {
            let (name, counters) = line.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let fields: Vec<&str> = counters.split_whitespace().collect();
            if fields.len() < 9 {
                return None;
            }
            Some(InterfaceByteSample {
                name: name.to_string(),
                rx_bytes: fields[0].parse().ok()?,
                tx_bytes: fields[8].parse().ok()?,
            })
        })
        .collect()
}

/// Pairs interfaces by name and converts their deltas to bytes per second.
///
/// Interfaces that only appear in `after` are skipped (no baseline), and
/// interfaces that vanished are dropped. Output follows `after`'s order.
pub fn interface_rates(
    before: &[InterfaceByteSample],
    after: &[InterfaceByteSample],
    elapsed_seconds: f64,
) -> Vec<InterfaceRate> {
    let baseline: HashMap<&str, &InterfaceByteSample> =
        before.iter().map(|s| (s.name.as_str(), s)).collect();

    after
        .iter()
        .filter_map(|cur| {
            let prev = baseline.get(cur.name.as_str())?;
            Some(InterfaceRate {
                interface: cur.name.clone(),
                download_bytes_per_sec: rate_per_second(prev.rx_bytes, cur.rx_bytes, elapsed_seconds),
                upload_bytes_per_sec: rate_per_second(prev.tx_bytes, cur.tx_bytes, elapsed_seconds),
            })
        })
        .collect()
}
