//! Refresh cycle orchestration.
//!
//! A [`Monitor`] owns the counter source, the system sampler and the
//! process registry. One call to [`Monitor::refresh`] is one full cycle:
//! system figures first, then the process set, then the sort. The caller
//! decides the cadence.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::process::{KillRequest, Process, ProcessRegistry, ProcessSampler};
use crate::source::CounterSource;
use crate::system::{SystemMetricsSampler, SystemSnapshot};
use crate::view::{Column, ProcessRow, SortKey, SortOrder};

/// Construction options. Unset fields fall back to what the source reports.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonitorOptions {
    pub ticks_per_second: Option<f64>,
    pub cpu_count: Option<usize>,
    pub sort_key: Option<SortKey>,
}

/// Published once per completed refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshEvent {
    /// Registry version after the cycle; 0 before the first success.
    pub version: u64,
    pub process_count: usize,
    pub discovered: usize,
    pub removed: usize,
    pub sampled_at: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    pub system_ok: bool,
    pub processes_ok: bool,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64() * 1000.0)
    }
}

pub struct Monitor<S> {
    source: S,
    system: SystemMetricsSampler,
    registry: ProcessRegistry,
    last_event: Option<RefreshEvent>,
}

impl<S: CounterSource> Monitor<S> {
    /// Reads the static hardware description and prepares an empty registry.
    /// No counters are sampled until the first [`Monitor::refresh`].
    pub fn new(source: S, options: MonitorOptions) -> Self {
        let ticks_per_second = options
            .ticks_per_second
            .unwrap_or_else(|| source.ticks_per_second());
        let cores = options.cpu_count.unwrap_or_else(|| source.cpu_count());
        let sampler = ProcessSampler::new(ticks_per_second, cores);
        debug!(
            "Monitor using {} ticks/s across {} logical CPU(s)",
            sampler.ticks_per_second(),
            sampler.cores()
        );

        let system = SystemMetricsSampler::new(&source);
        let registry = ProcessRegistry::new(sampler).with_sort_key(options.sort_key);

        Self {
            source,
            system,
            registry,
            last_event: None,
        }
    }

    pub fn refresh(&mut self) -> RefreshEvent {
        self.refresh_at(Instant::now())
    }

    /// Runs one cycle with `now` as the sample time.
    pub fn refresh_at(&mut self, now: Instant) -> RefreshEvent {
        let started = Instant::now();
        self.source.begin_tick();

        let system_ok = match self.system.refresh(&self.source) {
            Ok(_) => true,
            Err(e) => {
                warn!("System counters unavailable, keeping previous snapshot: {}", e);
                false
            }
        };

        let report = match self.registry.refresh(&self.source, now) {
            Ok(report) => Some(report),
            Err(e) => {
                error!("Process enumeration failed: {}", e);
                None
            }
        };
        self.system.set_process_count(self.registry.len());

        let event = RefreshEvent {
            version: self.registry.version(),
            process_count: self.registry.len(),
            discovered: report.map_or(0, |r| r.discovered),
            removed: report.map_or(0, |r| r.removed),
            sampled_at: Utc::now(),
            duration: started.elapsed(),
            system_ok,
            processes_ok: report.is_some(),
        };
        debug!(
            version = event.version,
            processes = event.process_count,
            discovered = event.discovered,
            removed = event.removed,
            "Refresh completed in {:?}",
            event.duration
        );
        self.last_event = Some(event.clone());
        event
    }

    pub fn processes(&self) -> &[Process] {
        self.registry.processes()
    }

    pub fn process(&self, pid: u32) -> Option<&Process> {
        self.registry.get(pid)
    }

    /// Formatted rows in view order, optionally truncated.
    pub fn rows(&self, limit: Option<usize>) -> Vec<ProcessRow> {
        let processes = self.registry.processes();
        let n = limit.unwrap_or(processes.len()).min(processes.len());
        processes[..n].iter().map(ProcessRow::from).collect()
    }

    pub fn system(&self) -> &SystemSnapshot {
        self.system.snapshot()
    }

    pub fn set_sort(&mut self, column: Column, order: SortOrder) {
        self.registry.set_sort(column, order);
    }

    pub fn sort_key(&self) -> Option<SortKey> {
        self.registry.sort_key()
    }

    pub fn kill_process(&mut self, pid: u32) -> KillRequest {
        self.registry.kill_process(&mut self.source, pid)
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    pub fn version(&self) -> u64 {
        self.registry.version()
    }

    pub fn last_event(&self) -> Option<&RefreshEvent> {
        self.last_event.as_ref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ProcessCounters, ScriptedSource, SystemCounters};

    #[test]
    fn test_refresh_event_counts() {
        let mut source = ScriptedSource::with_clock(100.0, 1);
        source.upsert_process(1, "init", ProcessCounters::default());
        source.upsert_process(2, "kthreadd", ProcessCounters::default());
        source.set_system(SystemCounters::default());

        let mut monitor = Monitor::new(source, MonitorOptions::default());
        let event = monitor.refresh();

        assert_eq!(event.version, 1);
        assert_eq!(event.process_count, 2);
        assert_eq!(event.discovered, 2);
        assert!(event.system_ok);
        assert!(event.processes_ok);
        assert_eq!(monitor.system().process_count, 2);
        assert_eq!(monitor.last_event(), Some(&event));
    }

    #[test]
    fn test_options_override_source_clock() {
        let source = ScriptedSource::with_clock(100.0, 1);
        let monitor = Monitor::new(
            source,
            MonitorOptions {
                ticks_per_second: Some(250.0),
                cpu_count: Some(8),
                sort_key: Some(SortKey::new(Column::Memory, SortOrder::Descending)),
            },
        );
        assert_eq!(monitor.registry().sampler().ticks_per_second(), 250.0);
        assert_eq!(monitor.registry().sampler().cores(), 8);
        assert_eq!(monitor.sort_key().map(|k| k.column), Some(Column::Memory));
    }

    #[test]
    fn test_rows_respect_limit() {
        let mut source = ScriptedSource::with_clock(100.0, 1);
        for pid in 1..=5 {
            source.upsert_process(pid, "p", ProcessCounters::default());
        }
        let mut monitor = Monitor::new(source, MonitorOptions::default());
        monitor.refresh();

        assert_eq!(monitor.rows(Some(3)).len(), 3);
        assert_eq!(monitor.rows(Some(50)).len(), 5);
        assert_eq!(monitor.rows(None).len(), 5);
    }

    #[test]
    fn test_boxed_dynamic_source() {
        let mut scripted = ScriptedSource::with_clock(100.0, 1);
        scripted.upsert_process(9, "boxed", ProcessCounters::default());
        let source: Box<dyn CounterSource + Send + Sync> = Box::new(scripted);

        let mut monitor = Monitor::new(source, MonitorOptions::default());
        monitor.refresh();
        assert_eq!(monitor.process(9).map(Process::name), Some("boxed"));
        assert_eq!(monitor.kill_process(9), KillRequest::Sent);
    }
}
