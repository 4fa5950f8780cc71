//! Raw counter sources.
//!
//! A [`CounterSource`] hands out point-in-time readings of the operating
//! system's monotonically increasing counters. Nothing here computes rates;
//! that is the job of [`crate::process::ProcessSampler`] and
//! [`crate::system::SystemMetricsSampler`].
//!
//! - `procfs`: the Linux implementation reading `/proc` and `/sys`
//! - `scripted`: in-memory frames, used by tests and `--test-data-file`

pub mod procfs;
pub mod scripted;

pub use procfs::ProcFs;
pub use scripted::{Frame, ScriptedProcess, ScriptedSource, TestData};

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Raw per-process counters as reported by a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessCounters {
    /// CPU time consumed (user + kernel) in clock ticks.
    pub cpu_ticks: u64,
    /// Resident set size in bytes.
    pub resident_bytes: u64,
    /// Cumulative bytes read from and written to storage, if the platform
    /// exposes them for this process.
    pub disk_bytes: Option<u64>,
    /// Cumulative bytes sent and received over the network, if available.
    pub net_bytes: Option<u64>,
    /// Start time in clock ticks since boot. Used to detect PID reuse.
    pub start_ticks: Option<u64>,
}

/// Aggregate CPU time counters across all logical CPUs, in clock ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    /// Calculate total CPU time (all fields).
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    /// Non-active time: true idle plus time spent waiting for I/O.
    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }

    pub fn busy(&self) -> u64 {
        self.total().saturating_sub(self.idle_total())
    }
}

/// System-wide counters re-read on every tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemCounters {
    pub cpu: CpuTimes,
    pub memory_total_kb: u64,
    pub memory_available_kb: u64,
    pub memory_cached_kb: u64,
    pub uptime_seconds: f64,
    /// Current clock speed, averaged over cores.
    pub cpu_mhz: Option<f64>,
    pub temperature_celsius: Option<f64>,
}

/// Free-form hardware description, read once at startup and parsed by
/// [`crate::system::StaticSystemInfo::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareDescription {
    /// `/proc/cpuinfo`-style text.
    pub cpuinfo: String,
    /// `/proc/meminfo`-style text.
    pub meminfo: String,
}

/// Read-only access to raw OS counters.
pub trait CounterSource {
    /// Called once at the start of every refresh cycle, before any read.
    fn begin_tick(&mut self) {}

    /// All process IDs currently present, in enumeration order.
    fn process_ids(&self) -> Result<Vec<u32>, SourceError>;

    /// Display name of a process. Read once, at discovery.
    fn process_name(&self, pid: u32) -> Option<String>;

    /// Current raw counters of one process. [`SourceError::Vanished`] when
    /// the process has exited.
    fn process_counters(&self, pid: u32) -> Result<ProcessCounters, SourceError>;

    fn system_counters(&self) -> Result<SystemCounters, SourceError>;

    fn describe_hardware(&self) -> Result<HardwareDescription, SourceError>;

    /// Clock ticks per second used by the CPU counters.
    fn ticks_per_second(&self) -> f64;

    /// Number of logical CPUs the CPU counters are spread over.
    fn cpu_count(&self) -> usize;

    /// Ask the OS to terminate a process. Does not wait for it to exit, and
    /// a process that is already gone is not an error.
    fn terminate(&mut self, pid: u32) -> Result<(), SourceError>;
}

impl<T: CounterSource + ?Sized> CounterSource for Box<T> {
    fn begin_tick(&mut self) {
        (**self).begin_tick()
    }

    fn process_ids(&self) -> Result<Vec<u32>, SourceError> {
        (**self).process_ids()
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        (**self).process_name(pid)
    }

    fn process_counters(&self, pid: u32) -> Result<ProcessCounters, SourceError> {
        (**self).process_counters(pid)
    }

    fn system_counters(&self) -> Result<SystemCounters, SourceError> {
        (**self).system_counters()
    }

    fn describe_hardware(&self) -> Result<HardwareDescription, SourceError> {
        (**self).describe_hardware()
    }

    fn ticks_per_second(&self) -> f64 {
        (**self).ticks_per_second()
    }

    fn cpu_count(&self) -> usize {
        (**self).cpu_count()
    }

    fn terminate(&mut self, pid: u32) -> Result<(), SourceError> {
        (**self).terminate(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_times_busy_excludes_idle_and_iowait() {
        let times = CpuTimes {
            user: 100,
            nice: 10,
            system: 50,
            idle: 800,
            iowait: 20,
            irq: 5,
            softirq: 5,
            steal: 10,
        };
        assert_eq!(times.total(), 1000);
        assert_eq!(times.idle_total(), 820);
        assert_eq!(times.busy(), 180);
    }

    #[test]
    fn test_process_counters_deserialize_with_missing_fields() {
        let counters: ProcessCounters =
            serde_json::from_str(r#"{"cpu_ticks": 12, "resident_bytes": 4096}"#).unwrap();
        assert_eq!(counters.cpu_ticks, 12);
        assert_eq!(counters.disk_bytes, None);
        assert_eq!(counters.net_bytes, None);
    }
}
