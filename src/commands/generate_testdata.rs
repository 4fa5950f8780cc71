//! Generate testdata command implementation.
//!
//! Writes a synthetic scenario for `--test-data-file`: a fixed set of
//! processes whose counters grow by random amounts from frame to frame,
//! with a few processes exiting and new ones starting along the way.

use herakles_top::{CpuTimes, Frame, ProcessCounters, ScriptedProcess, SystemCounters, TestData};
use rand::Rng;
use std::fs;
use std::path::Path;
use tracing::debug;

// Constants for byte conversions
const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * MB;

const TICKS_PER_SECOND: f64 = 100.0;
const CPU_COUNT: usize = 4;
const MEMORY_TOTAL_KB: u64 = 16 * 1024 * 1024;

/// Ticks one frame represents on every CPU, assuming a one second refresh.
const TICKS_PER_FRAME: u64 = TICKS_PER_SECOND as u64;

/// Names handed out to synthetic processes, suffixed with the PID.
const NAMES: &[&str] = &[
    "nginx", "postgres", "redis-server", "java", "python3", "node", "sshd", "containerd",
    "kworker", "systemd-journald",
];

const SAMPLE_CPUINFO: &str = "processor\t: 0\n\
model name\t: Synthetic CPU Model 3000 @ 3.00GHz\n\
siblings\t: 4\n\
cpu cores\t: 2\n\
cpu MHz\t\t: 2995.000\n";

/// Generates a synthetic test data JSON file.
pub fn command_generate_testdata(
    output: &Path,
    processes: usize,
    frames: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    debug!(
        "Generating test data: processes={}, frames={}, output={}",
        processes,
        frames,
        output.display()
    );

    let mut rng = rand::thread_rng();
    let data = generate_test_data(&mut rng, processes, frames.max(1));

    let json_content = serde_json::to_string_pretty(&data)?;
    fs::write(output, &json_content)?;

    println!(
        "✅ Generated test data: {} frames with {} processes each in {}",
        data.frames.len(),
        processes,
        output.display()
    );

    Ok(())
}

/// Builds the scenario. Every counter is monotonic for a given PID; a
/// replaced process gets a fresh PID.
pub fn generate_test_data(rng: &mut impl Rng, processes: usize, frames: usize) -> TestData {
    let mut next_pid: u32 = 1000;
    let mut live: Vec<ScriptedProcess> = (0..processes)
        .map(|_| {
            let process = random_process(rng, next_pid, 0);
            next_pid += 1;
            process
        })
        .collect();

    let mut system = SystemCounters {
        cpu: CpuTimes {
            user: 10_000,
            system: 4_000,
            idle: 100_000,
            ..CpuTimes::default()
        },
        memory_total_kb: MEMORY_TOTAL_KB,
        memory_available_kb: MEMORY_TOTAL_KB / 2,
        memory_cached_kb: MEMORY_TOTAL_KB / 8,
        uptime_seconds: 86_400.0,
        cpu_mhz: Some(2995.0),
        temperature_celsius: Some(45.0),
    };

    let mut out = Vec::with_capacity(frames);
    for frame in 0..frames {
        if frame > 0 {
            let mut busy = 0;
            for process in &mut live {
                let ticks = rng.gen_range(0..=TICKS_PER_FRAME / 2);
                busy += ticks;
                advance(rng, &mut process.counters, ticks);
            }

            // Replace one process every few frames
            if frame % 3 == 0 && !live.is_empty() {
                let slot = rng.gen_range(0..live.len());
                live[slot] = random_process(rng, next_pid, frame as u64 * TICKS_PER_FRAME);
                next_pid += 1;
            }

            let capacity = TICKS_PER_FRAME * CPU_COUNT as u64;
            let busy = busy.min(capacity);
            system.cpu.user += busy * 3 / 4;
            system.cpu.system += busy - busy * 3 / 4;
            system.cpu.idle += capacity - busy;
            system.uptime_seconds += 1.0;
            system.memory_available_kb = rng.gen_range(MEMORY_TOTAL_KB / 4..MEMORY_TOTAL_KB * 3 / 4);
            system.temperature_celsius = Some(rng.gen_range(40.0..75.0));
        }

        out.push(Frame {
            processes: live.clone(),
            system: system.clone(),
        });
    }

    TestData {
        ticks_per_second: TICKS_PER_SECOND,
        cpu_count: CPU_COUNT,
        cpuinfo: SAMPLE_CPUINFO.repeat(CPU_COUNT),
        meminfo: format!("MemTotal:       {} kB\n", MEMORY_TOTAL_KB),
        frames: out,
    }
}

fn random_process(rng: &mut impl Rng, pid: u32, start_ticks: u64) -> ScriptedProcess {
    let name = NAMES[rng.gen_range(0..NAMES.len())];
    ScriptedProcess {
        pid,
        name: format!("{}-{}", name, pid),
        counters: ProcessCounters {
            cpu_ticks: rng.gen_range(0..10_000),
            // RSS: 10 MB - 2 GB
            resident_bytes: rng.gen_range(10 * MB..2 * GB),
            disk_bytes: Some(rng.gen_range(0..GB)),
            net_bytes: Some(rng.gen_range(0..GB)),
            start_ticks: Some(start_ticks),
        },
    }
}

fn advance(rng: &mut impl Rng, counters: &mut ProcessCounters, ticks: u64) {
    counters.cpu_ticks += ticks;
    counters.resident_bytes = rng.gen_range(10 * MB..2 * GB);
    if let Some(disk) = counters.disk_bytes.as_mut() {
        *disk += rng.gen_range(0..20 * MB);
    }
    if let Some(net) = counters.net_bytes.as_mut() {
        *net += rng.gen_range(0..5 * MB);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap;

    #[test]
    fn test_counters_are_monotonic_per_pid() {
        let data = generate_test_data(&mut rand::thread_rng(), 8, 12);
        assert_eq!(data.frames.len(), 12);

        let mut last: AHashMap<u32, ProcessCounters> = AHashMap::new();
        let mut last_cpu = CpuTimes::default();
        for frame in &data.frames {
            assert_eq!(frame.processes.len(), 8);
            for p in &frame.processes {
                if let Some(prev) = last.get(&p.pid) {
                    assert!(p.counters.cpu_ticks >= prev.cpu_ticks);
                    assert!(p.counters.disk_bytes >= prev.disk_bytes);
                    assert!(p.counters.net_bytes >= prev.net_bytes);
                    assert_eq!(p.counters.start_ticks, prev.start_ticks);
                }
                last.insert(p.pid, p.counters);
            }
            assert!(frame.system.cpu.total() >= last_cpu.total());
            last_cpu = frame.system.cpu;
        }
    }

    #[test]
    fn test_written_file_loads_as_scripted_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testdata.json");
        command_generate_testdata(&path, 5, 4).unwrap();

        let source = herakles_top::ScriptedSource::from_file(&path).unwrap();
        assert_eq!(source.data().frames.len(), 4);
        assert_eq!(source.data().cpu_count, CPU_COUNT);
    }
}
