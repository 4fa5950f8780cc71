//! The set of tracked processes.

use std::time::Instant;

use ahash::AHashSet;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::process::{Process, ProcessSampler};
use crate::source::CounterSource;
use crate::view::{Column, SortKey, SortOrder, SortedProcessView};

/// Outcome of one successful registry refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub version: u64,
    /// Processes seen for the first time.
    pub discovered: usize,
    /// Processes dropped because they exited or their PID was reused.
    pub removed: usize,
    pub tracked: usize,
}

/// What happened to a termination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KillRequest {
    /// The signal was handed to the OS.
    Sent,
    /// Nothing was sent: the PID is not tracked, or the OS refused.
    Ignored,
}

/// Owns every tracked [`Process`] and keeps the set equal to the source's
/// most recent enumeration.
#[derive(Debug)]
pub struct ProcessRegistry {
    processes: Vec<Process>,
    known: AHashSet<u32>,
    sampler: ProcessSampler,
    view: SortedProcessView,
    version: u64,
}

impl ProcessRegistry {
    pub fn new(sampler: ProcessSampler) -> Self {
        Self {
            processes: Vec::new(),
            known: AHashSet::new(),
            sampler,
            view: SortedProcessView::default(),
            version: 0,
        }
    }

    pub fn with_sort_key(mut self, key: Option<SortKey>) -> Self {
        self.view = SortedProcessView::new(key);
        self
    }

    /// Runs one enumeration pass against `source`.
    ///
    /// Tracked processes that left the enumeration, or whose counters can no
    /// longer be read, are dropped; the rest are re-sampled. New PIDs get a
    /// baseline sample only. The collection is then re-sorted.
    ///
    /// A failed enumeration leaves the tracked set untouched.
    pub fn refresh(
        &mut self,
        source: &dyn CounterSource,
        now: Instant,
    ) -> Result<RefreshReport, SourceError> {
        let pids = source.process_ids()?;
        let listed: AHashSet<u32> = pids.iter().copied().collect();

        let sampler = self.sampler;
        let known = &mut self.known;
        let mut removed = 0;
        self.processes.retain_mut(|process| {
            let pid = process.pid();
            if !listed.contains(&pid) {
                debug!("Process {} ({}) exited", pid, process.name());
                known.remove(&pid);
                removed += 1;
                return false;
            }
            match source.process_counters(pid) {
                Ok(counters) if process.is_restarted(&counters) => {
                    debug!("PID {} was reused, dropping {}", pid, process.name());
                    known.remove(&pid);
                    removed += 1;
                    false
                }
                Ok(counters) => {
                    sampler.sample(process, counters, now);
                    true
                }
                Err(e) => {
                    debug!("Dropping process {}: {}", pid, e);
                    known.remove(&pid);
                    removed += 1;
                    false
                }
            }
        });

        let mut discovered = 0;
        for pid in pids {
            if self.known.contains(&pid) {
                continue;
            }
            let counters = match source.process_counters(pid) {
                Ok(c) => c,
                Err(e) => {
                    debug!("Skipping new process {}: {}", pid, e);
                    continue;
                }
            };
            let name = source.process_name(pid).unwrap_or_default();
            self.known.insert(pid);
            self.processes.push(Process::new(pid, name, counters, now));
            discovered += 1;
        }

        self.view.reorder(&mut self.processes);
        self.version += 1;

        Ok(RefreshReport {
            version: self.version,
            discovered,
            removed,
            tracked: self.processes.len(),
        })
    }

    /// Sets the sort key and re-sorts right away.
    pub fn set_sort(&mut self, column: Column, order: SortOrder) {
        self.view.set_sort_key(column, order);
        self.view.reorder(&mut self.processes);
    }

    pub fn sort_key(&self) -> Option<SortKey> {
        self.view.sort_key()
    }

    /// Requests termination of a tracked process without waiting for it to
    /// exit. Its removal shows up on a later refresh.
    pub fn kill_process(&self, source: &mut dyn CounterSource, pid: u32) -> KillRequest {
        if !self.known.contains(&pid) {
            debug!("Kill request for untracked pid {} ignored", pid);
            return KillRequest::Ignored;
        }
        match source.terminate(pid) {
            Ok(()) => {
                info!("Sent termination request to process {}", pid);
                KillRequest::Sent
            }
            Err(e) => {
                warn!("Could not terminate process {}: {}", pid, e);
                KillRequest::Ignored
            }
        }
    }

    /// Tracked processes in view order.
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn get(&self, pid: u32) -> Option<&Process> {
        if !self.known.contains(&pid) {
            return None;
        }
        self.processes.iter().find(|p| p.pid() == pid)
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.known.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Number of successful refreshes so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn sampler(&self) -> &ProcessSampler {
        &self.sampler
    }
}
