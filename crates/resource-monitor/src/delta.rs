// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Numeric policy shared by every differencing step.
//!
//! Kernel counters only ever grow, so a negative delta means a counter
//! reset, a recycled PID or an overflow. Those are clamped to zero here and
//! never propagated. Percentages are clamped to `[0, 100]` and no function
//! in this module returns NaN or infinity.

use crate::cpu::GlobalCpuSample;

/// Difference between two readings of a monotonic counter, floored at zero.
#[inline]
pub fn counter_delta(prev: u64, cur: u64) -> u64 {
    cur.saturating_sub(prev)
}

/// Clamps a percentage to `[0, 100]`, mapping NaN to `0`.
#[inline]
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Busy percentage of a CPU (or of one core) between two readings.
///
/// `100 * (1 - idle_delta / total_delta)`, where `total_delta` is floored to
/// one tick. If the total did not advance at all, the window carries no
/// information and the result is `0`.
pub fn usage_percent(prev: GlobalCpuSample, cur: GlobalCpuSample) -> f64 {
    if cur.total_ticks <= prev.total_ticks {
        return 0.0;
    }
    let idle_delta = counter_delta(prev.idle_ticks, cur.idle_ticks);
    let total_delta = counter_delta(prev.total_ticks, cur.total_ticks).max(1);
    clamp_percent(100.0 * (1.0 - idle_delta as f64 / total_delta as f64))
}

/// Per-second rate of a byte (or sector) counter over a wall-clock window.
///
/// A counter that went backwards reports `0`. A non-positive or
/// non-finite window also reports `0`.
pub fn rate_per_second(prev: u64, cur: u64, elapsed_seconds: f64) -> f64 {
    if !elapsed_seconds.is_finite() || elapsed_seconds <= 0.0 {
        return 0.0;
    }
    counter_delta(prev, cur) as f64 / elapsed_seconds
}

/// Share of the global tick budget used by one process, scaled so that a
/// single-core-bound process can reach 100 % on a multi-core host.
pub fn process_cpu_percent(delta_proc: u64, delta_total: u64, logical_cores: u32) -> f64 {
    let delta_total = delta_total.max(1) as f64;
    let cores = logical_cores.max(1) as f64;
    clamp_percent(100.0 * delta_proc as f64 / delta_total * cores)
}

/// `part_kb` as a percentage of `total_kb`; `0` when the total is unknown.
pub fn share_percent(part_kb: u64, total_kb: u64) -> f64 {
    if total_kb == 0 {
        return 0.0;
    }
    clamp_percent(100.0 * part_kb as f64 / total_kb as f64)
}
