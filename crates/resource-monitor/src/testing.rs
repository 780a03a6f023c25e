// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! In-memory counter source and clock for unit tests.
//!
//! A [`FakeSource`] replays a list of [`FakeReading`]s. The paired
//! [`FakeClock`] moves it to the next reading every time the engine waits
//! out a window, so "before" and "after" reads see different data.

use crate::battery::BatteryStatus;
use crate::cpu::{CpuStaticInfo, GlobalCpuSample, PerCoreCpuSample};
use crate::disk::DiskCounterSample;
use crate::memory::MemoryTotals;
use crate::network::InterfaceByteSample;
use crate::process::{ProcessCounterSample, ProcessMeta, ProcessState};
use crate::reader::CounterSource;
use crate::session::SampleClock;
use crate::MonitorError;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) struct FakeReading {
    pub global: GlobalCpuSample,
    pub per_core: PerCoreCpuSample,
    pub processes: BTreeMap<i32, (ProcessMeta, ProcessCounterSample)>,
    pub interfaces: Vec<InterfaceByteSample>,
    pub disks: Vec<DiskCounterSample>,
    pub memory: Option<MemoryTotals>,
    pub process_table: bool,
}

impl FakeReading {
    pub fn new(global: GlobalCpuSample) -> Self {
        Self {
            global,
            per_core: Vec::new(),
            processes: BTreeMap::new(),
            interfaces: Vec::new(),
            disks: Vec::new(),
            memory: Some(MemoryTotals {
                total_kb: 8_192_000,
                available_kb: 4_096_000,
                ..Default::default()
            }),
            process_table: true,
        }
    }

    pub fn with_process(mut self, pid: i32, name: &str, uid: u32, cpu_ticks: u64, resident_kb: u64) -> Self {
        self.processes.insert(
            pid,
            (
                ProcessMeta {
                    name: name.to_string(),
                    uid,
                },
                ProcessCounterSample {
                    pid,
                    cpu_ticks,
                    resident_kb,
                    thread_count: 1,
                    state: ProcessState::Running,
                },
            ),
        );
        self
    }

    pub fn with_cores(mut self, cores: &[(u64, u64)]) -> Self {
        self.per_core = cores
            .iter()
            .map(|&(idle_ticks, total_ticks)| GlobalCpuSample {
                idle_ticks,
                total_ticks,
            })
            .collect();
        self
    }

    pub fn with_interface(mut self, name: &str, rx_bytes: u64, tx_bytes: u64) -> Self {
        self.interfaces.push(InterfaceByteSample {
            name: name.to_string(),
            rx_bytes,
            tx_bytes,
        });
        self
    }

    pub fn with_disk(mut self, device: &str, sectors_read: u64, sectors_written: u64) -> Self {
        self.disks.push(DiskCounterSample {
            device: device.to_string(),
            reads_completed: 0,
            writes_completed: 0,
            sectors_read,
            sectors_written,
            read_time_ms: 0,
            write_time_ms: 0,
        });
        self
    }

    pub fn without_memory(mut self) -> Self {
        self.memory = None;
        self
    }

    pub fn without_process_table(mut self) -> Self {
        self.process_table = false;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FakeSource {
    readings: Arc<Vec<FakeReading>>,
    phase: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn new(readings: Vec<FakeReading>) -> Self {
        assert!(!readings.is_empty());
        Self {
            readings: Arc::new(readings),
            phase: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Moves to the next reading; stays on the last one once reached.
    pub fn advance(&self) {
        let last = self.readings.len() - 1;
        let _ = self
            .phase
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |p| Some((p + 1).min(last)));
    }

    /// A clock whose waits advance this source.
    pub fn clock(&self) -> FakeClock {
        FakeClock {
            source: self.clone(),
            waits: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn current(&self) -> &FakeReading {
        &self.readings[self.phase.load(Ordering::SeqCst)]
    }
}

impl CounterSource for FakeSource {
    fn read_global_cpu(&self) -> Result<GlobalCpuSample, MonitorError> {
        Ok(self.current().global)
    }

    fn read_per_core_cpu(&self) -> Result<PerCoreCpuSample, MonitorError> {
        Ok(self.current().per_core.clone())
    }

    fn list_pids(&self) -> Result<Vec<i32>, MonitorError> {
        let reading = self.current();
        if !reading.process_table {
            return Err(MonitorError::NotAvailable {
                path: "/proc".to_string(),
            });
        }
        Ok(reading.processes.keys().copied().collect())
    }

    fn read_process_meta(&self, pid: i32) -> Option<ProcessMeta> {
        self.current().processes.get(&pid).map(|(meta, _)| meta.clone())
    }

    fn read_process_counters(&self, pid: i32) -> Option<ProcessCounterSample> {
        self.current().processes.get(&pid).map(|(_, counters)| *counters)
    }

    fn resolve_user(&self, uid: u32) -> Option<String> {
        Some(if uid == 0 {
            "root".to_string()
        } else {
            format!("user{uid}")
        })
    }

    fn read_interfaces(&self) -> Result<Vec<InterfaceByteSample>, MonitorError> {
        Ok(self.current().interfaces.clone())
    }

    fn read_disks(&self) -> Result<Vec<DiskCounterSample>, MonitorError> {
        Ok(self.current().disks.clone())
    }

    fn read_memory_totals(&self) -> Result<MemoryTotals, MonitorError> {
        self.current().memory.ok_or_else(|| MonitorError::NotAvailable {
            path: "meminfo".to_string(),
        })
    }

    fn read_cpu_info(&self) -> CpuStaticInfo {
        CpuStaticInfo {
            model_name: "Fake CPU".to_string(),
            frequency_mhz: 2400.0,
            logical_processors: self.current().per_core.len().max(1) as u32,
            running_processes: 1,
        }
    }

    fn read_battery(&self) -> BatteryStatus {
        BatteryStatus::unavailable()
    }

    fn clock_ticks_per_second(&self) -> u64 {
        100
    }
}

/// Records every requested window and reports it as the elapsed time.
#[derive(Debug, Clone)]
pub(crate) struct FakeClock {
    source: FakeSource,
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl FakeClock {
    pub fn waits(&self) -> Arc<Mutex<Vec<Duration>>> {
        Arc::clone(&self.waits)
    }
}

impl SampleClock for FakeClock {
    fn wait(&mut self, window: Duration) -> Duration {
        self.waits.lock().unwrap().push(window);
        self.source.advance();
        window
    }

    fn now(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap()
    }
}
