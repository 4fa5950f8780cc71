//! Scripted scenarios loaded from JSON test data files.

use std::fs;
use std::time::{Duration, Instant};

use herakles_top::{Monitor, MonitorOptions, ScriptedSource, SourceError};

const SCENARIO: &str = r#"{
  "ticks_per_second": 100,
  "cpu_count": 2,
  "cpuinfo": "model name\t: Replay CPU @ 1.80GHz\nsiblings\t: 2\ncpu cores\t: 2\n",
  "meminfo": "MemTotal: 4096000 kB\n",
  "frames": [
    {
      "processes": [
        {"pid": 1, "name": "init", "counters": {"cpu_ticks": 0, "resident_bytes": 1048576}},
        {"pid": 2, "name": "worker", "counters": {"cpu_ticks": 0, "disk_bytes": 0, "start_ticks": 10}}
      ],
      "system": {"cpu": {"user": 0, "idle": 0}, "memory_total_kb": 4096000, "memory_available_kb": 1024000}
    },
    {
      "processes": [
        {"pid": 1, "name": "init", "counters": {"cpu_ticks": 20, "resident_bytes": 1048576}},
        {"pid": 2, "name": "worker", "counters": {"cpu_ticks": 100, "disk_bytes": 2097152, "start_ticks": 10}}
      ],
      "system": {"cpu": {"user": 120, "idle": 80}, "memory_total_kb": 4096000, "memory_available_kb": 1024000, "cpu_mhz": 800.0}
    },
    {
      "processes": [
        {"pid": 2, "name": "worker", "counters": {"cpu_ticks": 100, "disk_bytes": 2097152, "start_ticks": 10}}
      ]
    }
  ]
}"#;

fn write_scenario(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("testdata.json");
    fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn test_replays_frames_in_order() {
    let (_dir, path) = write_scenario(SCENARIO);
    let source = ScriptedSource::from_file(&path).unwrap();
    assert_eq!(source.data().frames.len(), 3);

    let mut monitor = Monitor::new(source, MonitorOptions::default());
    assert_eq!(monitor.system().info.model_name, "Replay CPU");
    assert_eq!(monitor.system().info.rated_speed, "1.80GHz");

    let t0 = Instant::now();
    monitor.refresh_at(t0);
    monitor.refresh_at(t0 + Duration::from_secs(1));

    let worker = monitor.process(2).unwrap().metrics();
    assert!((worker.cpu_percent - 50.0).abs() < 1e-6);
    assert!((worker.disk_mb_per_sec - 2.0).abs() < 1e-6);
    assert!((monitor.process(1).unwrap().metrics().cpu_percent - 10.0).abs() < 1e-6);
    assert!((monitor.system().cpu_percent - 60.0).abs() < 1e-6);
    assert_eq!(monitor.system().cpu_speed(), "800 MHz");
    assert_eq!(monitor.system().memory_used_kb, 3_072_000);

    let event = monitor.refresh_at(t0 + Duration::from_secs(2));
    assert_eq!(event.removed, 1);
    assert!(monitor.process(1).is_none());

    // the last frame repeats
    let event = monitor.refresh_at(t0 + Duration::from_secs(3));
    assert_eq!(event.process_count, 1);
    assert_eq!(monitor.process(2).unwrap().metrics().cpu_percent, 0.0);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ScriptedSource::from_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SourceError::Io { .. }));
}

#[test]
fn test_malformed_json_is_a_parse_error() {
    let (_dir, path) = write_scenario("{ \"frames\": [ ");
    let err = ScriptedSource::from_file(&path).unwrap_err();
    assert!(matches!(err, SourceError::Parse { .. }));
    assert!(err.to_string().contains("testdata.json"));
}

#[test]
fn test_empty_scenario_has_no_processes() {
    let (_dir, path) = write_scenario("{}");
    let mut monitor = Monitor::new(
        ScriptedSource::from_file(&path).unwrap(),
        MonitorOptions::default(),
    );
    let event = monitor.refresh();
    assert_eq!(event.process_count, 0);
    assert!(event.processes_ok);
}
