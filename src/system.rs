//! System-wide metrics.
//!
//! [`StaticSystemInfo`] is parsed once from the source's hardware
//! description. [`SystemMetricsSampler`] recomputes the aggregate figures
//! (CPU load, memory, uptime, clock speed, temperature) on every refresh.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::format;
use crate::source::{CounterSource, CpuTimes, HardwareDescription};

static MODEL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^model name\s*:\s*(.*?)\s*$").expect("valid regex"));
static CPU_CORES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^cpu cores\s*:\s*(\d+)\s*$").expect("valid regex"));
static SIBLINGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^siblings\s*:\s*(\d+)\s*$").expect("valid regex"));
static MEM_TOTAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^MemTotal:\s*(\d+)\s*kB").expect("valid regex"));

/// Descriptive fields read once at startup. Any field the description does
/// not contain stays blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StaticSystemInfo {
    pub model_name: String,
    /// Rated speed as printed after `@` in the model name, e.g. `"3.60GHz"`.
    pub rated_speed: String,
    pub physical_cores: Option<u32>,
    pub logical_processors: Option<u32>,
    pub total_memory_kb: Option<u64>,
}

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

impl StaticSystemInfo {
    pub fn parse(description: &HardwareDescription) -> Self {
        let mut info = StaticSystemInfo::default();

        match capture(&MODEL_NAME, &description.cpuinfo) {
            Some(model) => match model.split_once(" @ ") {
                Some((name, speed)) => {
                    info.model_name = name.trim().to_string();
                    info.rated_speed = speed.trim().to_string();
                }
                None => info.model_name = model.trim().to_string(),
            },
            None => warn!("CPU model name not found in cpuinfo"),
        }

        info.physical_cores = capture(&CPU_CORES, &description.cpuinfo).and_then(|v| v.parse().ok());
        if info.physical_cores.is_none() {
            warn!("Physical core count not found in cpuinfo");
        }

        info.logical_processors =
            capture(&SIBLINGS, &description.cpuinfo).and_then(|v| v.parse().ok());
        if info.logical_processors.is_none() {
            warn!("Logical processor count not found in cpuinfo");
        }

        info.total_memory_kb = capture(&MEM_TOTAL, &description.meminfo).and_then(|v| v.parse().ok());
        if info.total_memory_kb.is_none() {
            warn!("MemTotal not found in meminfo");
        }

        info
    }
}

/// Aggregate system figures as of the last successful refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub info: StaticSystemInfo,
    /// Busy share of all logical CPUs, 0 to 100.
    pub cpu_percent: f64,
    pub cpu_speed_mhz: Option<f64>,
    pub memory_total_kb: u64,
    pub memory_used_kb: u64,
    pub memory_available_kb: u64,
    pub memory_cached_kb: u64,
    pub uptime_seconds: f64,
    pub temperature_celsius: Option<f64>,
    pub process_count: usize,
}

impl SystemSnapshot {
    pub fn uptime(&self) -> String {
        format::format_uptime(self.uptime_seconds)
    }

    pub fn cpu_speed(&self) -> String {
        self.cpu_speed_mhz
            .map(format::format_speed_mhz)
            .unwrap_or_else(|| "n/a".to_string())
    }

    pub fn temperature(&self) -> String {
        format::format_temperature(self.temperature_celsius)
    }
}

/// Busy share between two aggregate CPU readings.
///
/// `None` when no ticks elapsed (keep the previous value); zero when the
/// counters went backwards.
pub fn aggregate_cpu_percent(previous: &CpuTimes, current: &CpuTimes) -> Option<f64> {
    if current.total() < previous.total() || current.busy() < previous.busy() {
        return Some(0.0);
    }
    let delta_total = current.total() - previous.total();
    if delta_total == 0 {
        return None;
    }
    let delta_busy = current.busy() - previous.busy();
    Some((delta_busy as f64 / delta_total as f64 * 100.0).clamp(0.0, 100.0))
}

/// Recomputes the [`SystemSnapshot`] from aggregate counters.
#[derive(Debug, Clone)]
pub struct SystemMetricsSampler {
    previous_cpu: Option<CpuTimes>,
    snapshot: SystemSnapshot,
}

impl SystemMetricsSampler {
    /// Reads the static hardware description once. A source that cannot
    /// describe the hardware leaves every static field blank.
    pub fn new(source: &dyn CounterSource) -> Self {
        let info = match source.describe_hardware() {
            Ok(description) => StaticSystemInfo::parse(&description),
            Err(e) => {
                warn!("Hardware description unavailable: {}", e);
                StaticSystemInfo::default()
            }
        };
        debug!(?info, "Static system info");

        Self {
            previous_cpu: None,
            snapshot: SystemSnapshot {
                memory_total_kb: info.total_memory_kb.unwrap_or(0),
                info,
                ..SystemSnapshot::default()
            },
        }
    }

    pub fn info(&self) -> &StaticSystemInfo {
        &self.snapshot.info
    }

    pub fn snapshot(&self) -> &SystemSnapshot {
        &self.snapshot
    }

    /// Re-reads aggregate counters. On error the previous snapshot is kept
    /// and the error returned.
    pub fn refresh(&mut self, source: &dyn CounterSource) -> Result<&SystemSnapshot, SourceError> {
        let counters = source.system_counters()?;

        let cpu_percent = match &self.previous_cpu {
            None => 0.0,
            Some(previous) => {
                aggregate_cpu_percent(previous, &counters.cpu).unwrap_or(self.snapshot.cpu_percent)
            }
        };
        self.previous_cpu = Some(counters.cpu);

        let snapshot = &mut self.snapshot;
        snapshot.cpu_percent = cpu_percent;
        snapshot.cpu_speed_mhz = counters.cpu_mhz;
        snapshot.memory_total_kb = counters.memory_total_kb;
        snapshot.memory_available_kb = counters.memory_available_kb;
        snapshot.memory_used_kb = counters
            .memory_total_kb
            .saturating_sub(counters.memory_available_kb);
        snapshot.memory_cached_kb = counters.memory_cached_kb;
        snapshot.uptime_seconds = counters.uptime_seconds;
        snapshot.temperature_celsius = counters.temperature_celsius;

        Ok(&self.snapshot)
    }

    /// Records the number of tracked processes after a registry refresh.
    pub fn set_process_count(&mut self, count: usize) {
        self.snapshot.process_count = count;
    }
}
