//! System-wide counter parsing: `/proc/stat`, `/proc/meminfo`,
//! `/proc/uptime` and the `cpu MHz` lines of `/proc/cpuinfo`.

use crate::source::CpuTimes;

/// Memory figures from `/proc/meminfo`, in kB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total_kb: u64,
    pub available_kb: u64,
    pub cached_kb: u64,
}

/// Parses the aggregate `cpu` line of `/proc/stat`.
///
/// Format: `cpu  user nice system idle iowait irq softirq steal [guest guest_nice]`.
/// Kernels older than 2.6.11 lack `steal`, so missing trailing fields read as 0.
pub fn parse_cpu_times(content: &str) -> Option<CpuTimes> {
    let line = content.lines().find(|l| l.starts_with("cpu "))?;
    let values: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|v| v.parse::<u64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if values.len() < 4 {
        return None;
    }
    let field = |i: usize| values.get(i).copied().unwrap_or(0);
    Some(CpuTimes {
        user: field(0),
        nice: field(1),
        system: field(2),
        idle: field(3),
        iowait: field(4),
        irq: field(5),
        softirq: field(6),
        steal: field(7),
    })
}

/// Counts per-core `cpuN` lines of `/proc/stat`.
pub fn count_cpus(content: &str) -> usize {
    content
        .lines()
        .filter(|l| {
            l.strip_prefix("cpu")
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| c.is_ascii_digit())
        })
        .count()
}

fn meminfo_kb(content: &str, key: &str) -> Option<u64> {
    content.lines().find_map(|line| {
        let value = line.strip_prefix(key)?.strip_prefix(':')?;
        value.split_whitespace().next()?.parse().ok()
    })
}

/// Parses `MemTotal`, `MemAvailable` and `Cached` from `/proc/meminfo`.
///
/// Kernels before 3.14 have no `MemAvailable`; `MemFree` is used instead.
pub fn parse_meminfo(content: &str) -> Option<MemoryInfo> {
    let total_kb = meminfo_kb(content, "MemTotal")?;
    let available_kb =
        meminfo_kb(content, "MemAvailable").or_else(|| meminfo_kb(content, "MemFree"))?;
    let cached_kb = meminfo_kb(content, "Cached").unwrap_or(0);
    Some(MemoryInfo {
        total_kb,
        available_kb,
        cached_kb,
    })
}

/// Parses the first field of `/proc/uptime` (seconds since boot).
pub fn parse_uptime(content: &str) -> Option<f64> {
    content.split_whitespace().next()?.parse().ok()
}

/// Mean of all `cpu MHz` lines in `/proc/cpuinfo`.
pub fn parse_cpu_mhz(cpuinfo: &str) -> Option<f64> {
    let readings: Vec<f64> = cpuinfo
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            if key.trim() != "cpu MHz" {
                return None;
            }
            value.trim().parse::<f64>().ok()
        })
        .collect();
    if readings.is_empty() {
        return None;
    }
    Some(readings.iter().sum::<f64>() / readings.len() as f64)
}
