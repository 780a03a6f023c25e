// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dashboard rendering.
//!
//! ```text
//! buzz: a lightweight resource monitor  refresh 2000 ms  sorted by cpu  top 25
//! ┌ Summary ─────────────────────────────────────────────────┐
//! │ CPU            : 12.5%       Memory Used : 48.1%         │
//! └──────────────────────────────────────────────────────────┘
//! ┌ Processes (sorted by CPU%, top 25) ──────────────────────┐
//! │ pid     name    user    state   threads  type    cpu%    │
//! └──────────────────────────────────────────────────────────┘
//! ┌ CPU Cores ┐┌ Network Interfaces ──┐┌ Disks ──────────────┐
//! └───────────┘└──────────────────────┘└─────────────────────┘
//! Saved snapshot: /home/alice/buzz-snapshot-20250314-150926Z.json
//! > k 4242 --sigkill
//! ```
//!
//! Column widths follow the widest cell, clamped to 6..=40 characters.
//! Trailing columns are dropped when a table is narrower than its columns,
//! but the first column always stays.

use super::{Dashboard, NoticeKind, SortKey};
use crate::commands::units::{human_bytes_total, human_rate, percent};
use ratatui::{prelude::*, widgets::*};
use resource_monitor::{ProcessCategory, ProcessRecord, SystemSnapshot};

const MIN_COL_WIDTH: usize = 6;
const MAX_COL_WIDTH: usize = 40;
const COL_GAP: usize = 2;
const PROMPT: &str = "> ";

/// Colours, or plain text under `--no-color`.
#[derive(Debug, Clone, Copy)]
struct Palette {
    enabled: bool,
}

impl Palette {
    fn fg(self, color: Color) -> Style {
        if self.enabled {
            Style::default().fg(color)
        } else {
            Style::default()
        }
    }

    fn header(self) -> Style {
        self.fg(Color::Cyan).add_modifier(Modifier::BOLD)
    }

    fn title(self) -> Style {
        self.fg(Color::Magenta).add_modifier(Modifier::BOLD)
    }

    fn dim(self) -> Style {
        self.fg(Color::DarkGray)
    }

    fn notice(self, kind: NoticeKind) -> Style {
        match kind {
            NoticeKind::Ok => self.fg(Color::Green),
            NoticeKind::Warn => self.fg(Color::Yellow),
            NoticeKind::Err => self.fg(Color::Red),
        }
    }
}

/// Rows of one titled table before layout.
#[derive(Debug, Clone, PartialEq)]
struct TableData {
    title: String,
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl TableData {
    fn new(title: impl Into<String>, headers: &[&'static str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    /// A bordered table sized for an area `width` cells wide.
    fn widget(&self, width: u16, palette: Palette) -> Table<'static> {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(format!(" {} ", self.title), palette.title()));

        if self.rows.is_empty() {
            return Table::new([Row::new(["(no data)"]).style(palette.dim())], [Constraint::Length(9)])
                .block(block);
        }

        let widths = column_widths(&self.headers, &self.rows);
        let keep = columns_that_fit(&widths, usize::from(width.saturating_sub(2)));

        let header = Row::new(self.headers[..keep].iter().map(|h| h.to_string())).style(palette.header());
        let rows = self.rows.iter().map(|row| {
            Row::new((0..keep).map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                ellipsize(cell, widths[i])
            }))
        });
        let constraints = widths[..keep]
            .iter()
            .map(|&w| Constraint::Length(u16::try_from(w).unwrap_or(u16::MAX)));

        Table::new(rows, constraints)
            .header(header)
            .column_spacing(COL_GAP as u16)
            .block(block)
    }
}

/// Widest of header and cells per column, clamped to `6..=40`.
fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
                .clamp(MIN_COL_WIDTH, MAX_COL_WIDTH)
        })
        .collect()
}

/// How many leading columns fit in `available` cells; at least one.
fn columns_that_fit(widths: &[usize], available: usize) -> usize {
    let mut keep = widths.len();
    while keep > 1 {
        let needed = widths[..keep].iter().sum::<usize>() + (keep - 1) * COL_GAP;
        if needed <= available {
            break;
        }
        keep -= 1;
    }
    keep
}

/// Truncates to `max` characters, marking the cut with `...`.
fn ellipsize(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max {
        return s.to_string();
    }
    if max <= 3 {
        return s.chars().take(max).collect();
    }
    let mut cut: String = s.chars().take(max - 3).collect();
    cut.push_str("...");
    cut
}

pub(super) fn draw(frame: &mut Frame, dashboard: &Dashboard) {
    let palette = Palette {
        enabled: !dashboard.args.no_color,
    };

    let Some(snapshot) = &dashboard.snapshot else {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
            .split(frame.area());
        draw_title(frame, rows[0], dashboard, palette);
        let waiting = Paragraph::new("Collecting the first snapshot (includes CPU warm-up)...")
            .style(palette.dim())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(waiting, rows[1]);
        draw_notice(frame, rows[2], dashboard, palette);
        draw_input(frame, rows[3], dashboard, palette);
        return;
    };

    let summary = summary_rows(snapshot, dashboard.args.refresh);
    let summary_height = summary.len().div_ceil(2) as u16 + 2;
    let io_rows = snapshot
        .cpu
        .per_core
        .len()
        .max(snapshot.network.len())
        .max(snapshot.disk.disks.len())
        .max(1);
    let io_height = (io_rows as u16).saturating_add(3).min(14);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(summary_height),
            Constraint::Min(5),
            Constraint::Length(io_height),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_title(frame, rows[0], dashboard, palette);
    draw_summary(frame, rows[1], &summary, palette);

    let processes = process_table(snapshot, dashboard.args.sort, dashboard.args.top);
    frame.render_widget(processes.widget(rows[2].width, palette), rows[2]);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(20), Constraint::Percentage(35), Constraint::Percentage(45)])
        .split(rows[3]);
    for (table, area) in [core_table(snapshot), network_table(snapshot), disk_table(snapshot)]
        .iter()
        .zip(cols.iter())
    {
        frame.render_widget(table.widget(area.width, palette), *area);
    }

    draw_notice(frame, rows[4], dashboard, palette);
    draw_input(frame, rows[5], dashboard, palette);
}

fn draw_title(frame: &mut Frame, area: Rect, dashboard: &Dashboard, palette: Palette) {
    let sort = match dashboard.args.sort {
        SortKey::Cpu => "cpu",
        SortKey::Mem => "mem",
    };
    let mut spans = vec![
        Span::styled("buzz: a lightweight resource monitor", palette.title()),
        Span::styled(
            format!("  refresh {} ms  sorted by {sort}  top {}", dashboard.args.refresh, dashboard.args.top),
            palette.dim(),
        ),
    ];
    if dashboard.sampling {
        spans.push(Span::styled("  sampling...", palette.notice(NoticeKind::Warn)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_summary(frame: &mut Frame, area: Rect, summary: &[(&'static str, String)], palette: Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" Summary ", palette.title()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);
    let (left, right) = summary.split_at(summary.len().div_ceil(2));
    for (entries, half) in [left, right].into_iter().zip(halves.iter()) {
        let width = entries.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
        let lines: Vec<Line> = entries
            .iter()
            .map(|(key, value)| {
                Line::from(vec![
                    Span::styled(format!(" {key:<width$}"), palette.header()),
                    Span::raw(format!(" : {value}")),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), *half);
    }
}

fn draw_notice(frame: &mut Frame, area: Rect, dashboard: &Dashboard, palette: Palette) {
    let line = match &dashboard.notice {
        Some(notice) => Line::styled(notice.text.clone(), palette.notice(notice.kind)),
        None => Line::styled(
            "q quit | d save snapshot | k <pid> [--sigkill|--sigterm|--signal <n>] signal a process",
            palette.dim(),
        ),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_input(frame: &mut Frame, area: Rect, dashboard: &Dashboard, palette: Palette) {
    let line = Line::from(vec![
        Span::styled(PROMPT, palette.notice(NoticeKind::Warn)),
        Span::raw(dashboard.input.clone()),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    let typed = (PROMPT.len() + dashboard.input.chars().count()) as u16;
    let x = area.x.saturating_add(typed).min(area.right().saturating_sub(1));
    frame.set_cursor_position((x, area.y));
}

fn summary_rows(snapshot: &SystemSnapshot, refresh_ms: u64) -> Vec<(&'static str, String)> {
    let cpu = &snapshot.cpu;
    let mem = &snapshot.memory;
    let battery = match snapshot.battery.capacity_percent {
        Some(capacity) => format!("{} ({capacity}%)", snapshot.battery.status),
        None => snapshot.battery.status.clone(),
    };
    vec![
        ("CPU", percent(cpu.usage_percent)),
        ("CPU Freq (GHz)", format!("{:.2}", cpu.frequency_mhz / 1000.0)),
        ("Procs Running", cpu.running_processes.to_string()),
        ("Cores", cpu.logical_processors.to_string()),
        ("Battery", battery),
        ("Refresh", format!("{refresh_ms} ms")),
        ("Memory Used", percent(mem.usage_percent)),
        ("Mem Total", human_bytes_total(mem.totals.total_kb as f64 * 1024.0)),
        ("Mem Avail", human_bytes_total(mem.totals.available_kb as f64 * 1024.0)),
        ("Swap Free", human_bytes_total(mem.totals.swap_free_kb as f64 * 1024.0)),
        ("Swap Total", human_bytes_total(mem.totals.swap_total_kb as f64 * 1024.0)),
    ]
}

/// The `top` heaviest processes by the chosen key. The sort key's columns
/// come first so they survive narrow terminals.
fn process_table(snapshot: &SystemSnapshot, sort: SortKey, top: usize) -> TableData {
    let mut processes: Vec<&ProcessRecord> = snapshot.processes.iter().collect();
    match sort {
        SortKey::Cpu => processes.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent)),
        SortKey::Mem => processes.sort_by(|a, b| b.memory_percent.total_cmp(&a.memory_percent)),
    }

    let ident = ["pid", "name", "user", "state", "threads", "type"];
    let cpu_cols = ["cpu%", "cpu_time"];
    let mem_cols = ["mem%", "rss"];
    let (label, headers): (&str, Vec<&'static str>) = match sort {
        SortKey::Cpu => ("CPU%", [&ident[..], &cpu_cols[..], &mem_cols[..]].concat()),
        SortKey::Mem => ("Memory%", [&ident[..], &mem_cols[..], &cpu_cols[..]].concat()),
    };

    let mut table = TableData::new(format!("Processes (sorted by {label}, top {top})"), &headers);
    for p in processes.into_iter().take(top) {
        let id = &p.identity;
        let kind = match id.category {
            ProcessCategory::Background => "background",
            ProcessCategory::App => "app",
        };
        let mut row = vec![
            id.pid.to_string(),
            id.name.clone(),
            id.owner_user.clone(),
            p.state.to_string(),
            p.threads.to_string(),
            kind.to_string(),
        ];
        let cpu = [percent(p.cpu_percent), format!("{:.2}s", p.cpu_time_seconds)];
        let mem = [percent(p.memory_percent), human_bytes_total(p.resident_kb as f64 * 1024.0)];
        match sort {
            SortKey::Cpu => row.extend(cpu.into_iter().chain(mem)),
            SortKey::Mem => row.extend(mem.into_iter().chain(cpu)),
        }
        table.rows.push(row);
    }
    table
}

fn core_table(snapshot: &SystemSnapshot) -> TableData {
    let mut table = TableData::new("CPU Cores", &["core", "usage"]);
    for core in &snapshot.cpu.per_core {
        table.rows.push(vec![core.core_id.to_string(), percent(core.usage_percent)]);
    }
    table
}

fn network_table(snapshot: &SystemSnapshot) -> TableData {
    let mut table = TableData::new("Network Interfaces", &["interface", "download", "upload"]);
    for iface in &snapshot.network {
        table.rows.push(vec![
            iface.interface.clone(),
            human_rate(iface.download_bytes_per_sec),
            human_rate(iface.upload_bytes_per_sec),
        ]);
    }
    table
}

fn disk_table(snapshot: &SystemSnapshot) -> TableData {
    let mut table = TableData::new(
        "Disks",
        &["device", "read", "write", "reads", "writes", "read_total", "written_total"],
    );
    for disk in &snapshot.disk.disks {
        let c = &disk.counters;
        table.rows.push(vec![
            c.device.clone(),
            human_rate(disk.read_bytes_per_sec),
            human_rate(disk.write_bytes_per_sec),
            c.reads_completed.to_string(),
            c.writes_completed.to_string(),
            human_bytes_total(c.sectors_read as f64 * 512.0),
            human_bytes_total(c.sectors_written as f64 * 512.0),
        ]);
    }
    table
}
