//! Herakles Top Library
//!
//! Live process and system resource sampling. Raw OS counters come from a
//! [`CounterSource`]; the engine turns consecutive readings into rates and
//! keeps the set of tracked processes in sync with the OS.
//!
//! # Features
//!
//! - **Process tracking**: discovery, re-sampling and removal on every refresh
//! - **Rates**: CPU %, resident memory, disk MB/s and network Mbps per process
//! - **System summary**: aggregate CPU load, memory, uptime, clock speed, temperature
//! - **Sorting**: any column, either direction, kept across refreshes
//!
//! # Usage
//!
//! ```rust
//! use herakles_top::{Column, Monitor, MonitorOptions, ProcessCounters, ScriptedSource, SortOrder};
//!
//! let mut source = ScriptedSource::with_clock(100.0, 1);
//! source.upsert_process(100, "worker", ProcessCounters::default());
//!
//! let mut monitor = Monitor::new(source, MonitorOptions::default());
//! monitor.set_sort(Column::Cpu, SortOrder::Descending);
//! let event = monitor.refresh();
//!
//! assert_eq!(event.process_count, 1);
//! for row in monitor.rows(Some(10)) {
//!     println!("{}", row.cells.join("  "));
//! }
//! ```
//!
//! On Linux, use [`ProcFs`] to read the live system instead.

pub mod error;
pub mod format;
pub mod monitor;
pub mod process;
pub mod source;
pub mod system;
pub mod view;

pub use error::SourceError;
pub use monitor::{Monitor, MonitorOptions, RefreshEvent};
pub use process::{KillRequest, Process, ProcessMetrics, ProcessRegistry, ProcessSampler};
pub use source::{
    CounterSource, CpuTimes, Frame, HardwareDescription, ProcFs, ProcessCounters, ScriptedProcess,
    ScriptedSource, SystemCounters, TestData,
};
pub use system::{StaticSystemInfo, SystemMetricsSampler, SystemSnapshot};
pub use view::{Column, ProcessRow, SortKey, SortOrder, SortedProcessView, COLUMNS};
