//! Scripted counter source.
//!
//! Replays a list of frames, one per refresh cycle, instead of reading the
//! live system. Used by the test suite and by `--test-data-file`, so the
//! whole binary can be exercised without a real `/proc`.
//!
//! A test data file is JSON:
//!
//! ```json
//! {
//!   "ticks_per_second": 100,
//!   "cpu_count": 1,
//!   "cpuinfo": "model name\t: Example CPU @ 3.00GHz\n",
//!   "frames": [
//!     { "processes": [ { "pid": 100, "name": "worker", "counters": { "cpu_ticks": 0 } } ] },
//!     { "processes": [ { "pid": 100, "name": "worker", "counters": { "cpu_ticks": 50 } } ] }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SourceError;
use crate::source::{CounterSource, HardwareDescription, ProcessCounters, SystemCounters};

/// One process as it appears in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedProcess {
    pub pid: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub counters: ProcessCounters,
}

/// The state of the system during one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    pub processes: Vec<ScriptedProcess>,
    pub system: SystemCounters,
}

fn default_ticks_per_second() -> f64 {
    100.0
}

fn default_cpu_count() -> usize {
    1
}

/// Complete scripted scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestData {
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: f64,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    #[serde(default)]
    pub cpuinfo: String,
    #[serde(default)]
    pub meminfo: String,
    #[serde(default)]
    pub frames: Vec<Frame>,
}

impl Default for TestData {
    fn default() -> Self {
        Self {
            ticks_per_second: default_ticks_per_second(),
            cpu_count: default_cpu_count(),
            cpuinfo: String::new(),
            meminfo: String::new(),
            frames: Vec::new(),
        }
    }
}

/// Replays [`TestData`] frames; the last frame repeats forever.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    data: TestData,
    cursor: usize,
    started: bool,
    terminated: AHashSet<u32>,
    unreadable: AHashSet<u32>,
    signals: Vec<u32>,
}

impl ScriptedSource {
    pub fn new(mut data: TestData) -> Self {
        if data.frames.is_empty() {
            data.frames.push(Frame::default());
        }
        Self {
            data,
            cursor: 0,
            started: false,
            terminated: AHashSet::new(),
            unreadable: AHashSet::new(),
            signals: Vec::new(),
        }
    }

    /// Empty single-frame source, to be filled with [`Self::upsert_process`].
    pub fn with_clock(ticks_per_second: f64, cpu_count: usize) -> Self {
        Self::new(TestData {
            ticks_per_second,
            cpu_count,
            ..TestData::default()
        })
    }

    /// Loads a JSON test data file.
    pub fn from_file(path: &Path) -> Result<Self, SourceError> {
        let content = fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
        let data: TestData =
            serde_json::from_str(&content).map_err(|e| SourceError::parse(path, e.to_string()))?;
        debug!(
            "Loaded {} test data frame(s) from {}",
            data.frames.len(),
            path.display()
        );
        Ok(Self::new(data))
    }

    pub fn data(&self) -> &TestData {
        &self.data
    }

    /// Index of the frame the current cycle reads from.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn frame(&self) -> &Frame {
        &self.data.frames[self.cursor]
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.data.frames[self.cursor]
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.data.frames.push(frame);
    }

    /// Inserts or replaces a process in the current frame.
    pub fn upsert_process(&mut self, pid: u32, name: &str, counters: ProcessCounters) {
        let frame = self.frame_mut();
        match frame.processes.iter_mut().find(|p| p.pid == pid) {
            Some(existing) => {
                existing.name = name.to_string();
                existing.counters = counters;
            }
            None => frame.processes.push(ScriptedProcess {
                pid,
                name: name.to_string(),
                counters,
            }),
        }
    }

    pub fn remove_process(&mut self, pid: u32) {
        self.frame_mut().processes.retain(|p| p.pid != pid);
    }

    pub fn set_system(&mut self, system: SystemCounters) {
        self.frame_mut().system = system;
    }

    /// Keeps `pid` in the enumeration but fails its counter reads, as when a
    /// process exits between the directory scan and the file reads.
    pub fn mark_unreadable(&mut self, pid: u32) {
        self.unreadable.insert(pid);
    }

    /// PIDs that received a termination request, in order.
    pub fn signals(&self) -> &[u32] {
        &self.signals
    }

    fn find(&self, pid: u32) -> Option<&ScriptedProcess> {
        self.frame().processes.iter().find(|p| p.pid == pid)
    }
}

impl CounterSource for ScriptedSource {
    fn begin_tick(&mut self) {
        if !self.started {
            self.started = true;
        } else if self.cursor + 1 < self.data.frames.len() {
            self.cursor += 1;
        }

        let frame = &mut self.data.frames[self.cursor];
        // once a killed PID leaves the scenario, a later frame may reuse it
        self.terminated
            .retain(|pid| frame.processes.iter().any(|p| p.pid == *pid));
        let terminated = &self.terminated;
        frame.processes.retain(|p| !terminated.contains(&p.pid));
    }

    fn process_ids(&self) -> Result<Vec<u32>, SourceError> {
        Ok(self.frame().processes.iter().map(|p| p.pid).collect())
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        self.find(pid).map(|p| p.name.clone())
    }

    fn process_counters(&self, pid: u32) -> Result<ProcessCounters, SourceError> {
        if self.unreadable.contains(&pid) {
            return Err(SourceError::Vanished(pid));
        }
        self.find(pid)
            .map(|p| p.counters)
            .ok_or(SourceError::Vanished(pid))
    }

    fn system_counters(&self) -> Result<SystemCounters, SourceError> {
        Ok(self.frame().system.clone())
    }

    fn describe_hardware(&self) -> Result<HardwareDescription, SourceError> {
        Ok(HardwareDescription {
            cpuinfo: self.data.cpuinfo.clone(),
            meminfo: self.data.meminfo.clone(),
        })
    }

    fn ticks_per_second(&self) -> f64 {
        self.data.ticks_per_second
    }

    fn cpu_count(&self) -> usize {
        self.data.cpu_count
    }

    fn terminate(&mut self, pid: u32) -> Result<(), SourceError> {
        self.signals.push(pid);
        if self.find(pid).is_some() {
            self.terminated.insert(pid);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(cpu_ticks: u64) -> ProcessCounters {
        ProcessCounters {
            cpu_ticks,
            ..ProcessCounters::default()
        }
    }

    #[test]
    fn test_frames_advance_and_last_repeats() {
        let mut source = ScriptedSource::with_clock(100.0, 1);
        source.upsert_process(1, "init", counters(0));
        let mut second = source.frame().clone();
        second.processes[0].counters.cpu_ticks = 10;
        source.push_frame(second);

        source.begin_tick();
        assert_eq!(source.cursor(), 0);
        source.begin_tick();
        assert_eq!(source.cursor(), 1);
        source.begin_tick();
        assert_eq!(source.cursor(), 1);
        assert_eq!(source.process_counters(1).unwrap().cpu_ticks, 10);
    }

    #[test]
    fn test_terminate_removes_pid_from_later_frames() {
        let mut source = ScriptedSource::with_clock(100.0, 1);
        source.upsert_process(1, "init", counters(0));
        source.upsert_process(2, "victim", counters(0));
        source.begin_tick();

        source.terminate(2).unwrap();
        assert_eq!(source.process_ids().unwrap(), vec![1, 2]);

        source.begin_tick();
        assert_eq!(source.process_ids().unwrap(), vec![1]);
        assert_eq!(source.signals(), &[2]);
    }

    #[test]
    fn test_killed_pid_can_be_reused_by_a_later_frame() {
        let mut source = ScriptedSource::with_clock(100.0, 1);
        source.upsert_process(1, "init", counters(0));
        source.upsert_process(2, "victim", counters(0));
        let both = source.frame().clone();
        source.push_frame(both.clone());
        let mut without = both.clone();
        without.processes.retain(|p| p.pid != 2);
        source.push_frame(without);
        let mut reused = both;
        reused.processes[1].name = "newcomer".into();
        source.push_frame(reused);

        source.begin_tick();
        source.terminate(2).unwrap();

        // still listed by the scenario, but killed
        source.begin_tick();
        assert_eq!(source.process_ids().unwrap(), vec![1]);

        source.begin_tick();
        assert_eq!(source.process_ids().unwrap(), vec![1]);

        source.begin_tick();
        assert_eq!(source.process_ids().unwrap(), vec![1, 2]);
        assert_eq!(source.process_name(2).as_deref(), Some("newcomer"));
    }

    #[test]
    fn test_unreadable_pid_stays_enumerated() {
        let mut source = ScriptedSource::with_clock(100.0, 1);
        source.upsert_process(5, "flaky", counters(3));
        source.mark_unreadable(5);
        assert_eq!(source.process_ids().unwrap(), vec![5]);
        assert!(source.process_counters(5).unwrap_err().is_vanished());
    }

    #[test]
    fn test_deserialize_test_data_defaults() {
        let data: TestData = serde_json::from_str(
            r#"{"frames": [{"processes": [{"pid": 100, "name": "worker"}]}]}"#,
        )
        .unwrap();
        assert_eq!(data.ticks_per_second, 100.0);
        assert_eq!(data.cpu_count, 1);
        assert_eq!(data.frames[0].processes[0].counters.cpu_ticks, 0);
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = ScriptedSource::from_file(&path).unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
    }
}
