// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Sampling sessions: rolling state plus one-cycle orchestration.
//!
//! A [`SamplingSession`] is owned by its caller. It remembers the previous
//! global and per-core CPU readings so that later cycles need no CPU
//! warm-up. Nothing is kept in statics, so independent sessions (parallel
//! tests, several dashboards) never interfere.
//!
//! # Window strategies
//! ```text
//! sequential (default)         overlapped
//! ───────────────────          ───────────────────────────────
//! cpu warm-up      250 ms      cpu/cores/procs/net/disk before
//! per-core warm-up 500 ms      wait max(required windows)
//! process window   500 ms      cpu/cores/procs/net/disk after
//! net+disk window 1000 ms
//! ```
//! Both honour each metric's own minimum window. The warm-ups only apply
//! while the session is cold (first cycle, or a core count change).

use crate::cpu::{CpuStaticInfo, GlobalCpuSample, PerCoreCpuSample};
use crate::delta::usage_percent;
use crate::disk::{disk_records, DiskCounterSample, DiskRecord, DiskReport};
use crate::memory::MemoryTotals;
use crate::network::{interface_rates, InterfaceByteSample, InterfaceRate};
use crate::process::{self, CategoryPolicy, DaemonHeuristic, ProcessRecord, ReconcileContext};
use crate::reader::{CounterSource, ProcFs};
use crate::snapshot::{CoreUsage, CpuSummary, MemorySummary, SystemSnapshot};
use crate::{MonitorError, SamplingConfig};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Paces sampling windows and stamps snapshots.
pub trait SampleClock: Send {
    /// Blocks for `window` and returns the wall-clock time that actually
    /// elapsed.
    fn wait(&mut self, window: Duration) -> Duration;

    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Real clock: `thread::sleep` plus `Instant` measurement.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SampleClock for SystemClock {
    fn wait(&mut self, window: Duration) -> Duration {
        let start = Instant::now();
        if !window.is_zero() {
            std::thread::sleep(window);
        }
        start.elapsed()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Caller-owned sampling state and collaborators.
///
/// # Example
/// ```no_run
/// use resource_monitor::{SamplingConfig, SamplingSession};
///
/// let mut session = SamplingSession::new(SamplingConfig::default());
/// let first = session.collect_snapshot()?;   // includes CPU warm-up
/// let second = session.collect_snapshot()?;  // reuses rolling state
/// println!("{}\n{}", first.summary(), second.summary());
/// # Ok::<(), resource_monitor::MonitorError>(())
/// ```
pub struct SamplingSession {
    config: SamplingConfig,
    source: Box<dyn CounterSource>,
    clock: Box<dyn SampleClock>,
    policy: Box<dyn CategoryPolicy>,
    prev_cpu: Option<GlobalCpuSample>,
    prev_cores: Option<PerCoreCpuSample>,
}

impl std::fmt::Debug for SamplingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplingSession")
            .field("config", &self.config)
            .field("prev_cpu", &self.prev_cpu)
            .field("prev_cores", &self.prev_cores.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

impl SamplingSession {
    /// A session reading the procfs/sysfs roots named in `config`.
    pub fn new(config: SamplingConfig) -> Self {
        let source = ProcFs::from_config(&config);
        Self::with_source(Box::new(source), config)
    }

    /// A session over an arbitrary counter source.
    pub fn with_source(source: Box<dyn CounterSource>, config: SamplingConfig) -> Self {
        tracing::debug!(?config, "sampling session created");
        Self {
            config,
            source,
            clock: Box::new(SystemClock),
            policy: Box::new(DaemonHeuristic),
            prev_cpu: None,
            prev_cores: None,
        }
    }

    /// Replaces the clock that paces windows and stamps snapshots.
    pub fn with_clock(mut self, clock: Box<dyn SampleClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the background/app classification policy.
    pub fn with_category_policy(mut self, policy: Box<dyn CategoryPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// `true` once both CPU baselines are in place.
    pub fn is_warm(&self) -> bool {
        self.prev_cpu.is_some() && self.prev_cores.is_some()
    }

    /// Forgets the rolling CPU state; the next cycle warms up again.
    pub fn reset(&mut self) {
        self.prev_cpu = None;
        self.prev_cores = None;
    }

    /// Records CPU baselines and waits out the longest warm-up window.
    ///
    /// Optional: a cold session warms up on its own during the next
    /// measurement. Calling this first moves that cost to a known point.
    pub fn warm_up(&mut self) -> Result<(), MonitorError> {
        if self.is_warm() {
            return Ok(());
        }
        self.prev_cpu = Some(self.source.read_global_cpu()?);
        self.prev_cores = Some(self.source.read_per_core_cpu()?);
        let window = self.config.cpu_warmup().max(self.config.per_core_warmup());
        let elapsed = self.clock.wait(window);
        tracing::debug!(?elapsed, "cpu warm-up complete");
        Ok(())
    }

    /// Global CPU busy percentage since the previous call.
    pub fn cpu_usage(&mut self) -> Result<f64, MonitorError> {
        let prev = match self.prev_cpu {
            Some(prev) => prev,
            None => {
                let baseline = self.source.read_global_cpu()?;
                self.clock.wait(self.config.cpu_warmup());
                baseline
            }
        };
        let cur = self.source.read_global_cpu()?;
        self.prev_cpu = Some(cur);
        Ok(usage_percent(prev, cur))
    }

    /// Busy percentage of each core since the previous call.
    ///
    /// Re-warms when the number of cores differs from the stored baseline.
    pub fn per_core_usage(&mut self) -> Result<Vec<f64>, MonitorError> {
        let mut cur = self.source.read_per_core_cpu()?;
        let prev = match self.prev_cores.take() {
            Some(prev) if prev.len() == cur.len() => prev,
            stale => {
                if let Some(stale) = stale {
                    tracing::info!(
                        before = stale.len(),
                        now = cur.len(),
                        "core topology changed, re-warming per-core usage"
                    );
                }
                let baseline = cur;
                self.clock.wait(self.config.per_core_warmup());
                cur = self.source.read_per_core_cpu()?;
                baseline
            }
        };
        let usage = per_core_percentages(&prev, &cur);
        self.prev_cores = Some(cur);
        Ok(usage)
    }

    /// Runs one process accounting window.
    pub fn process_set(
        &mut self,
        logical_cores: u32,
        total_memory_kb: u64,
    ) -> Result<Vec<ProcessRecord>, MonitorError> {
        let baseline = process::enumerate(self.source.as_ref(), self.policy.as_ref())?;
        self.clock.wait(self.config.process_window());
        process::reconcile(
            baseline,
            self.source.as_ref(),
            self.reconcile_context(logical_cores, total_memory_kb),
        )
    }

    /// Runs one network + disk throughput window.
    pub fn io_rates(&mut self) -> (Vec<InterfaceRate>, Vec<DiskRecord>) {
        let before = self.io_baseline();
        let elapsed = self.clock.wait(self.config.io_window());
        self.io_finish(before, elapsed)
    }

    /// Collects one full [`SystemSnapshot`].
    ///
    /// Fails only if the process table or the aggregate CPU counters cannot
    /// be read. Every other miss degrades to an omission or an explicit
    /// "unavailable" value.
    pub fn collect_snapshot(&mut self) -> Result<SystemSnapshot, MonitorError> {
        let started = Instant::now();
        let cpu_info = self.source.read_cpu_info();
        let memory = self.memory_totals();

        let parts = if self.config.overlap_windows {
            self.sample_overlapped(&cpu_info, &memory)?
        } else {
            self.sample_sequential(&cpu_info, &memory)?
        };
        let battery = self.source.read_battery();

        let snapshot = SystemSnapshot {
            cpu: CpuSummary {
                usage_percent: parts.cpu_usage,
                model_name: cpu_info.model_name,
                frequency_mhz: cpu_info.frequency_mhz,
                logical_processors: cpu_info.logical_processors,
                running_processes: cpu_info.running_processes,
                per_core: parts
                    .per_core
                    .into_iter()
                    .enumerate()
                    .map(|(core_id, usage_percent)| CoreUsage {
                        core_id: core_id as u32,
                        usage_percent,
                    })
                    .collect(),
            },
            memory: MemorySummary {
                usage_percent: memory.usage_percent(),
                totals: memory,
            },
            processes: parts.processes,
            network: parts.network,
            disk: DiskReport::from_records(parts.disks),
            battery,
            timestamp: SystemSnapshot::format_timestamp(self.clock.now()),
        };

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            processes = snapshot.processes.len(),
            interfaces = snapshot.network.len(),
            "snapshot collected"
        );
        Ok(snapshot)
    }

    fn sample_sequential(
        &mut self,
        cpu_info: &CpuStaticInfo,
        memory: &MemoryTotals,
    ) -> Result<CycleParts, MonitorError> {
        let cpu_usage = self.cpu_usage()?;
        let per_core = self.per_core_usage()?;
        let cores = logical_cores(cpu_info, per_core.len());
        let processes = self.process_set(cores, memory.total_kb)?;
        let (network, disks) = self.io_rates();
        Ok(CycleParts {
            cpu_usage,
            per_core,
            processes,
            network,
            disks,
        })
    }

    fn sample_overlapped(
        &mut self,
        cpu_info: &CpuStaticInfo,
        memory: &MemoryTotals,
    ) -> Result<CycleParts, MonitorError> {
        let mut window = self.config.process_window().max(self.config.io_window());

        let cpu_before = match self.prev_cpu {
            Some(prev) => prev,
            None => {
                window = window.max(self.config.cpu_warmup());
                self.source.read_global_cpu()?
            }
        };
        let cores_now = self.source.read_per_core_cpu()?;
        let cores_before = match self.prev_cores.take() {
            Some(prev) if prev.len() == cores_now.len() => prev,
            _ => {
                window = window.max(self.config.per_core_warmup());
                cores_now
            }
        };
        let baseline = process::enumerate(self.source.as_ref(), self.policy.as_ref())?;
        let io_before = self.io_baseline();

        let elapsed = self.clock.wait(window);
        tracing::debug!(?window, ?elapsed, "overlapped sampling window");

        let cpu_after = self.source.read_global_cpu()?;
        let cores_after = self.source.read_per_core_cpu()?;
        let per_core = per_core_percentages(&cores_before, &cores_after);
        let cores = logical_cores(cpu_info, per_core.len());
        let processes = process::reconcile(
            baseline,
            self.source.as_ref(),
            self.reconcile_context(cores, memory.total_kb),
        )?;
        let (network, disks) = self.io_finish(io_before, elapsed);

        self.prev_cpu = Some(cpu_after);
        self.prev_cores = Some(cores_after);
        Ok(CycleParts {
            cpu_usage: usage_percent(cpu_before, cpu_after),
            per_core,
            processes,
            network,
            disks,
        })
    }

    fn memory_totals(&self) -> MemoryTotals {
        self.source.read_memory_totals().unwrap_or_else(|e| {
            tracing::warn!("memory totals unavailable: {e}");
            MemoryTotals::default()
        })
    }

    fn reconcile_context(&self, logical_cores: u32, total_memory_kb: u64) -> ReconcileContext {
        ReconcileContext {
            logical_cores,
            total_memory_kb,
            clock_ticks_per_second: self.source.clock_ticks_per_second(),
        }
    }

    fn io_baseline(&self) -> IoReading {
        IoReading {
            interfaces: self.source.read_interfaces().unwrap_or_else(|e| {
                tracing::warn!("network counters unavailable: {e}");
                Vec::new()
            }),
            disks: self.source.read_disks().unwrap_or_else(|e| {
                tracing::warn!("disk counters unavailable: {e}");
                Vec::new()
            }),
        }
    }

    fn io_finish(&self, before: IoReading, elapsed: Duration) -> (Vec<InterfaceRate>, Vec<DiskRecord>) {
        let after = self.io_baseline();
        let seconds = elapsed.as_secs_f64();
        (
            interface_rates(&before.interfaces, &after.interfaces, seconds),
            disk_records(&before.disks, after.disks, seconds),
        )
    }
}

struct IoReading {
    interfaces: Vec<InterfaceByteSample>,
    disks: Vec<DiskCounterSample>,
}

struct CycleParts {
    cpu_usage: f64,
    per_core: Vec<f64>,
    processes: Vec<ProcessRecord>,
    network: Vec<InterfaceRate>,
    disks: Vec<DiskRecord>,
}

/// Pairs cores by index. Cores without a baseline report `0`.
fn per_core_percentages(prev: &[GlobalCpuSample], cur: &[GlobalCpuSample]) -> Vec<f64> {
    cur.iter()
        .enumerate()
        .map(|(i, c)| prev.get(i).map_or(0.0, |p| usage_percent(*p, *c)))
        .collect()
}

fn logical_cores(info: &CpuStaticInfo, per_core_len: usize) -> u32 {
    if info.logical_processors > 0 {
        info.logical_processors
    } else {
        per_core_len.max(1) as u32
    }
}
