//! Sorted presentation of the tracked processes.
//!
//! Columns are described by a static table ([`COLUMNS`]) holding each
//! column's header, alignment, comparator, formatter and heat scale. The
//! [`SortedProcessView`] owns the active [`SortKey`] and reorders the
//! registry's collection after every refresh.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::format;
use crate::process::Process;

/// Table columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Name,
    Pid,
    Cpu,
    Memory,
    Disk,
    Network,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Name,
        Column::Pid,
        Column::Cpu,
        Column::Memory,
        Column::Disk,
        Column::Network,
    ];

    pub fn descriptor(self) -> &'static ColumnDescriptor {
        &COLUMNS[self as usize]
    }

    pub fn header(self) -> &'static str {
        self.descriptor().header
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Column::Name => "name",
            Column::Pid => "pid",
            Column::Cpu => "cpu",
            Column::Memory => "memory",
            Column::Disk => "disk",
            Column::Network => "network",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" | "process" => Ok(Column::Name),
            "pid" => Ok(Column::Pid),
            "cpu" => Ok(Column::Cpu),
            "memory" | "mem" => Ok(Column::Memory),
            "disk" => Ok(Column::Disk),
            "network" | "net" => Ok(Column::Network),
            other => Err(format!(
                "unknown column '{}' (expected name, pid, cpu, memory, disk or network)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortOrder {
    /// Applies the direction to an ascending comparison.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(format!(
                "unknown sort order '{}' (expected asc or desc)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: Column,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortKey {
    pub fn new(column: Column, order: SortOrder) -> Self {
        Self { column, order }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Static description of one table column.
pub struct ColumnDescriptor {
    pub column: Column,
    pub header: &'static str,
    pub alignment: Alignment,
    /// Ascending comparison.
    pub compare: fn(&Process, &Process) -> Ordering,
    pub format: fn(&Process) -> String,
    /// Numeric cell value.
    pub value: fn(&Process) -> f64,
    /// Value that saturates the heat scale; `None` for columns without one.
    pub heat_max: Option<f64>,
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("column", &self.column)
            .field("header", &self.header)
            .field("alignment", &self.alignment)
            .finish()
    }
}

impl ColumnDescriptor {
    pub fn heat_level(&self, process: &Process) -> u8 {
        match self.heat_max {
            Some(max) => format::heat_level((self.value)(process), max),
            None => 0,
        }
    }
}

fn compare_name(a: &Process, b: &Process) -> Ordering {
    let a = a.name().chars().flat_map(char::to_lowercase);
    let b = b.name().chars().flat_map(char::to_lowercase);
    a.cmp(b)
}

fn compare_pid(a: &Process, b: &Process) -> Ordering {
    a.pid().cmp(&b.pid())
}

fn compare_cpu(a: &Process, b: &Process) -> Ordering {
    cpu_value(a).total_cmp(&cpu_value(b))
}

fn compare_memory(a: &Process, b: &Process) -> Ordering {
    a.metrics().memory_kb.cmp(&b.metrics().memory_kb)
}

fn compare_disk(a: &Process, b: &Process) -> Ordering {
    disk_value(a).total_cmp(&disk_value(b))
}

fn compare_network(a: &Process, b: &Process) -> Ordering {
    network_value(a).total_cmp(&network_value(b))
}

fn pid_value(p: &Process) -> f64 {
    f64::from(p.pid())
}

fn cpu_value(p: &Process) -> f64 {
    p.metrics().cpu_percent
}

fn memory_value(p: &Process) -> f64 {
    p.metrics().memory_kb as f64
}

fn disk_value(p: &Process) -> f64 {
    p.metrics().disk_mb_per_sec
}

fn network_value(p: &Process) -> f64 {
    p.metrics().network_mbps
}

fn no_value(_: &Process) -> f64 {
    0.0
}

fn format_name(p: &Process) -> String {
    p.name().to_string()
}

fn format_pid(p: &Process) -> String {
    p.pid().to_string()
}

fn format_cpu(p: &Process) -> String {
    format::format_percent(cpu_value(p))
}

fn format_memory(p: &Process) -> String {
    format::format_memory_kb(p.metrics().memory_kb)
}

fn format_disk(p: &Process) -> String {
    format::format_disk_rate(disk_value(p))
}

fn format_network(p: &Process) -> String {
    format::format_network_rate(network_value(p))
}

/// Column table, indexed by `Column as usize`.
pub static COLUMNS: [ColumnDescriptor; 6] = [
    ColumnDescriptor {
        column: Column::Name,
        header: "Process Name",
        alignment: Alignment::Left,
        compare: compare_name,
        format: format_name,
        value: no_value,
        heat_max: None,
    },
    ColumnDescriptor {
        column: Column::Pid,
        header: "PID",
        alignment: Alignment::Center,
        compare: compare_pid,
        format: format_pid,
        value: pid_value,
        heat_max: None,
    },
    ColumnDescriptor {
        column: Column::Cpu,
        header: "CPU",
        alignment: Alignment::Right,
        compare: compare_cpu,
        format: format_cpu,
        value: cpu_value,
        heat_max: Some(100.0),
    },
    ColumnDescriptor {
        column: Column::Memory,
        header: "Memory",
        alignment: Alignment::Right,
        compare: compare_memory,
        format: format_memory,
        value: memory_value,
        heat_max: Some(131_072.0),
    },
    ColumnDescriptor {
        column: Column::Disk,
        header: "Disk",
        alignment: Alignment::Right,
        compare: compare_disk,
        format: format_disk,
        value: disk_value,
        heat_max: Some(50.0),
    },
    ColumnDescriptor {
        column: Column::Network,
        header: "Network",
        alignment: Alignment::Right,
        compare: compare_network,
        format: format_network,
        value: network_value,
        heat_max: Some(1.0),
    },
];

/// Orders the tracked processes by the active sort key.
///
/// Without a key the collection keeps discovery order. Sorting is stable,
/// but callers must not rely on the relative order of equal keys: it
/// depends on the order left by the previous refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortedProcessView {
    key: Option<SortKey>,
}

impl SortedProcessView {
    pub fn new(key: Option<SortKey>) -> Self {
        Self { key }
    }

    pub fn set_sort_key(&mut self, column: Column, order: SortOrder) {
        self.key = Some(SortKey::new(column, order));
    }

    pub fn sort_key(&self) -> Option<SortKey> {
        self.key
    }

    pub fn reorder(&self, processes: &mut [Process]) {
        let Some(key) = self.key else {
            return;
        };
        let compare = key.column.descriptor().compare;
        processes.sort_by(|a, b| key.order.apply(compare(a, b)));
    }
}

/// One rendered table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessRow {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_kb: u64,
    pub disk_mb_per_sec: f64,
    pub network_mbps: f64,
    /// Formatted cells, in [`Column::ALL`] order.
    pub cells: Vec<String>,
    /// Heat levels (0 to 4), in [`Column::ALL`] order.
    pub heat: Vec<u8>,
}

impl From<&Process> for ProcessRow {
    fn from(process: &Process) -> Self {
        let metrics = process.metrics();
        Self {
            pid: process.pid(),
            name: process.name().to_string(),
            cpu_percent: metrics.cpu_percent,
            memory_kb: metrics.memory_kb,
            disk_mb_per_sec: metrics.disk_mb_per_sec,
            network_mbps: metrics.network_mbps,
            cells: COLUMNS.iter().map(|c| (c.format)(process)).collect(),
            heat: COLUMNS.iter().map(|c| c.heat_level(process)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessSampler;
    use crate::source::ProcessCounters;
    use std::time::{Duration, Instant};

    /// Builds a process whose CPU share over one second equals `cpu_ticks` %.
    fn process(pid: u32, name: &str, cpu_ticks: u64) -> Process {
        let sampler = ProcessSampler::new(100.0, 1);
        let t0 = Instant::now();
        let mut p = Process::new(pid, name.into(), ProcessCounters::default(), t0);
        sampler.sample(
            &mut p,
            ProcessCounters {
                cpu_ticks,
                resident_bytes: 1024 * 1024,
                ..ProcessCounters::default()
            },
            t0 + Duration::from_secs(1),
        );
        p
    }

    fn pids(processes: &[Process]) -> Vec<u32> {
        processes.iter().map(Process::pid).collect()
    }

    #[test]
    fn test_columns_table_matches_enum_order() {
        for (i, column) in Column::ALL.iter().enumerate() {
            assert_eq!(COLUMNS[i].column, *column);
        }
        assert_eq!(Column::Name.header(), "Process Name");
        assert_eq!(Column::Pid.descriptor().alignment, Alignment::Center);
    }

    #[test]
    fn test_sort_by_cpu_both_directions() {
        let mut processes = vec![process(10, "a", 5), process(20, "b", 50), process(30, "c", 1)];

        let mut view = SortedProcessView::default();
        view.set_sort_key(Column::Cpu, SortOrder::Ascending);
        view.reorder(&mut processes);
        assert_eq!(pids(&processes), vec![30, 10, 20]);

        view.set_sort_key(Column::Cpu, SortOrder::Descending);
        view.reorder(&mut processes);
        assert_eq!(pids(&processes), vec![20, 10, 30]);
    }

    #[test]
    fn test_sort_by_name_is_case_insensitive() {
        let mut processes = vec![
            process(1, "zsh", 0),
            process(2, "Apache", 0),
            process(3, "bash", 0),
        ];
        let view = SortedProcessView::new(Some(SortKey::new(Column::Name, SortOrder::Ascending)));
        view.reorder(&mut processes);
        assert_eq!(pids(&processes), vec![2, 3, 1]);
    }

    #[test]
    fn test_names_differing_only_in_case_tie() {
        let mut processes = vec![process(1, "bash", 0), process(2, "Bash", 0)];

        let mut view = SortedProcessView::default();
        view.set_sort_key(Column::Name, SortOrder::Ascending);
        view.reorder(&mut processes);
        assert_eq!(pids(&processes), vec![1, 2]);

        view.set_sort_key(Column::Name, SortOrder::Descending);
        view.reorder(&mut processes);
        assert_eq!(pids(&processes), vec![1, 2]);
    }

    #[test]
    fn test_no_sort_key_keeps_order() {
        let mut processes = vec![process(3, "c", 9), process(1, "a", 1), process(2, "b", 5)];
        SortedProcessView::default().reorder(&mut processes);
        assert_eq!(pids(&processes), vec![3, 1, 2]);
    }

    #[test]
    fn test_parse_column_and_order() {
        assert_eq!("CPU".parse::<Column>(), Ok(Column::Cpu));
        assert_eq!("mem".parse::<Column>(), Ok(Column::Memory));
        assert!("threads".parse::<Column>().is_err());
        assert_eq!("desc".parse::<SortOrder>(), Ok(SortOrder::Descending));
        assert_eq!("Ascending".parse::<SortOrder>(), Ok(SortOrder::Ascending));
    }

    #[test]
    fn test_row_cells_and_heat() {
        let row = ProcessRow::from(&process(42, "worker", 50));
        assert_eq!(
            row.cells,
            vec!["worker", "42", "50.0 %", "1.0 MB", "0.0 MB/s", "0.0 Mbps"]
        );
        assert_eq!(row.heat, vec![0, 0, 2, 0, 0, 0]);
    }
}
