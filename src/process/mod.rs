//! Process tracking.
//!
//! This module provides:
//! - [`Process`]: one tracked OS process with its last two raw samples
//! - [`ProcessSampler`]: turns a pair of samples into rates
//! - [`ProcessRegistry`]: the set of live processes, kept in sync with the
//!   source's enumeration on every refresh

mod registry;
mod sampler;

pub use registry::{KillRequest, ProcessRegistry, RefreshReport};
pub use sampler::ProcessSampler;

use std::time::Instant;

use serde::Serialize;

use crate::source::ProcessCounters;

/// Raw counters tagged with the instant they were read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub counters: ProcessCounters,
    pub taken_at: Instant,
}

/// Derived per-process metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProcessMetrics {
    /// Share of total CPU capacity, 0 to 100.
    pub cpu_percent: f64,
    /// Resident memory in KB.
    pub memory_kb: u64,
    pub disk_mb_per_sec: f64,
    pub network_mbps: f64,
}

/// A tracked OS process.
#[derive(Debug, Clone)]
pub struct Process {
    pid: u32,
    name: String,
    previous: Option<Sample>,
    current: Sample,
    metrics: ProcessMetrics,
}

impl Process {
    /// Creates a process from its baseline sample. Rates stay zero until a
    /// second sample arrives; memory is absolute and shown right away.
    pub fn new(pid: u32, name: String, baseline: ProcessCounters, now: Instant) -> Self {
        Self {
            pid,
            name,
            previous: None,
            current: Sample {
                counters: baseline,
                taken_at: now,
            },
            metrics: ProcessMetrics {
                memory_kb: baseline.resident_bytes / 1024,
                ..ProcessMetrics::default()
            },
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &ProcessMetrics {
        &self.metrics
    }

    pub fn current(&self) -> &Sample {
        &self.current
    }

    pub fn previous(&self) -> Option<&Sample> {
        self.previous.as_ref()
    }

    /// True when the counters belong to a different process that reused
    /// this PID (start time changed).
    pub fn is_restarted(&self, counters: &ProcessCounters) -> bool {
        match (self.current.counters.start_ticks, counters.start_ticks) {
            (Some(before), Some(now)) => before != now,
            _ => false,
        }
    }
}
