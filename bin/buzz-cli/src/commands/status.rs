// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `buzz status` command: display one sampling cycle as a readable report.
//!
//! Subsystems that are missing on this host (battery, disks) are shown as
//! unavailable; the command still works.

use super::units::{human_bytes_total, human_rate};
use resource_monitor::{SamplingConfig, SamplingSession, SubsystemStatus, SystemSnapshot};
use std::process::ExitCode;

pub async fn execute(config: SamplingConfig) -> anyhow::Result<ExitCode> {
    let (_, snapshot) = super::collect(SamplingSession::new(config)).await?;
    print!("{}", render(&snapshot));
    Ok(ExitCode::SUCCESS)
}

fn render(snapshot: &SystemSnapshot) -> String {
    let mut out = String::new();
    let mut line = |s: String| {
        out.push_str(&s);
        out.push('\n');
    };

    line("╔══════════════════════════════════════════════════════╗".into());
    line("║             buzz · System Resource Status            ║".into());
    line("╚══════════════════════════════════════════════════════╝".into());
    line(String::new());

    // ── CPU ────────────────────────────────────────────────────
    let cpu = &snapshot.cpu;
    line("  CPU".into());
    line(format!("   Model:        {}", cpu.model_name));
    line(format!(
        "   Cores:        {} @ {:.0} MHz",
        cpu.logical_processors, cpu.frequency_mhz
    ));
    line(format!(
        "   Usage:        {:5.1}%  {}",
        cpu.usage_percent,
        usage_bar(cpu.usage_percent / 100.0)
    ));
    for core in &cpu.per_core {
        line(format!(
            "   Core {:<3}      {:5.1}%  {}",
            core.core_id,
            core.usage_percent,
            usage_bar(core.usage_percent / 100.0)
        ));
    }
    line(format!("   Running:      {} processes", cpu.running_processes));
    line(String::new());

    // ── Memory ─────────────────────────────────────────────────
    let mem = &snapshot.memory;
    line("  Memory".into());
    line(format!("   Total:        {} MB", mem.totals.total_kb / 1024));
    line(format!("   Available:    {} MB", mem.totals.available_kb / 1024));
    line(format!(
        "   Used:         {} MB ({:.1}%)  {}",
        mem.totals.used_kb() / 1024,
        mem.usage_percent,
        usage_bar(mem.usage_percent / 100.0)
    ));
    line(format!(
        "   Swap free:    {} / {}",
        human_bytes_total(mem.totals.swap_free_kb as f64 * 1024.0),
        human_bytes_total(mem.totals.swap_total_kb as f64 * 1024.0)
    ));
    line(String::new());

    // ── Network / Disk ─────────────────────────────────────────
    line("  Network".into());
    if snapshot.network.is_empty() {
        line("   (no interfaces)".into());
    }
    for iface in &snapshot.network {
        line(format!(
            "   {:<12}  down {:>10}  up {:>10}",
            iface.interface,
            human_rate(iface.download_bytes_per_sec),
            human_rate(iface.upload_bytes_per_sec)
        ));
    }
    line(String::new());

    line("  Disks".into());
    if snapshot.disk.status == SubsystemStatus::Unavailable {
        line("   Unavailable".into());
    }
    for disk in &snapshot.disk.disks {
        line(format!(
            "   {:<12}  read {:>10}  write {:>10}",
            disk.counters.device,
            human_rate(disk.read_bytes_per_sec),
            human_rate(disk.write_bytes_per_sec)
        ));
    }
    line(String::new());

    // ── Battery ────────────────────────────────────────────────
    line("  Battery".into());
    match snapshot.battery.capacity_percent {
        Some(capacity) => line(format!(
            "   {}  {capacity}%  {}",
            snapshot.battery.status,
            usage_bar(f64::from(capacity) / 100.0)
        )),
        None => line(format!("   {}", snapshot.battery.status)),
    }
    line(String::new());
    line(snapshot.summary());
    out
}

/// Creates a visual usage bar (0.0-1.0 scale).
fn usage_bar(ratio: f64) -> String {
    let filled = (ratio.clamp(0.0, 1.0) * 20.0).round() as usize;
    let empty = 20 - filled;
    let symbol = if ratio >= 0.9 {
        "#"
    } else if ratio >= 0.7 {
        "="
    } else {
        "-"
    };
    format!("[{}{}]", symbol.repeat(filled), ".".repeat(empty))
}
