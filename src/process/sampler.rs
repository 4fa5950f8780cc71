//! Rate computation from consecutive process samples.

use std::time::Instant;

use crate::process::{Process, ProcessMetrics, Sample};
use crate::source::ProcessCounters;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BITS_PER_MEGABIT: f64 = 1_000_000.0;

/// Converts raw counter deltas into per-second metrics.
///
/// CPU usage is normalized to the whole machine: one fully busy core on a
/// four-core host reads 25 %.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSampler {
    ticks_per_second: f64,
    cores: usize,
}

impl ProcessSampler {
    pub fn new(ticks_per_second: f64, cores: usize) -> Self {
        Self {
            ticks_per_second: if ticks_per_second > 0.0 {
                ticks_per_second
            } else {
                100.0
            },
            cores: cores.max(1),
        }
    }

    pub fn ticks_per_second(&self) -> f64 {
        self.ticks_per_second
    }

    pub fn cores(&self) -> usize {
        self.cores
    }

    /// Records a new sample for `process` and recomputes its metrics.
    ///
    /// The process's current sample becomes the previous one. A counter that
    /// went backwards turns this sample into a fresh baseline with all rates
    /// at zero. Otherwise elapsed time of zero (or a clock that went
    /// backwards) keeps the previous rates.
    pub fn sample(
        &self,
        process: &mut Process,
        counters: ProcessCounters,
        now: Instant,
    ) -> ProcessMetrics {
        let previous = std::mem::replace(
            &mut process.current,
            Sample {
                counters,
                taken_at: now,
            },
        );
        process.previous = Some(previous);

        let memory_kb = counters.resident_bytes / 1024;
        let elapsed = now
            .checked_duration_since(previous.taken_at)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        let metrics = if rolled_back(&previous.counters, &counters) {
            ProcessMetrics {
                memory_kb,
                ..ProcessMetrics::default()
            }
        } else if elapsed <= 0.0 {
            ProcessMetrics {
                memory_kb,
                ..process.metrics
            }
        } else {
            let prev = &previous.counters;
            ProcessMetrics {
                cpu_percent: self.cpu_percent(counters.cpu_ticks - prev.cpu_ticks, elapsed),
                memory_kb,
                disk_mb_per_sec: byte_rate(prev.disk_bytes, counters.disk_bytes, elapsed)
                    / BYTES_PER_MB,
                network_mbps: byte_rate(prev.net_bytes, counters.net_bytes, elapsed) * 8.0
                    / BITS_PER_MEGABIT,
            }
        };

        process.metrics = metrics;
        metrics
    }

    fn cpu_percent(&self, delta_ticks: u64, elapsed: f64) -> f64 {
        let capacity = elapsed * self.ticks_per_second * self.cores as f64;
        (delta_ticks as f64 / capacity * 100.0).clamp(0.0, 100.0)
    }
}

fn rolled_back(previous: &ProcessCounters, current: &ProcessCounters) -> bool {
    let went_back = |before: Option<u64>, after: Option<u64>| match (before, after) {
        (Some(b), Some(a)) => a < b,
        _ => false,
    };
    current.cpu_ticks < previous.cpu_ticks
        || went_back(previous.disk_bytes, current.disk_bytes)
        || went_back(previous.net_bytes, current.net_bytes)
}

/// Bytes per second between two optional counters; zero when either side
/// is unavailable.
fn byte_rate(before: Option<u64>, after: Option<u64>, elapsed: f64) -> f64 {
    match (before, after) {
        (Some(b), Some(a)) if a >= b => (a - b) as f64 / elapsed,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn counters(cpu_ticks: u64, disk: Option<u64>, net: Option<u64>) -> ProcessCounters {
        ProcessCounters {
            cpu_ticks,
            resident_bytes: 2048 * 1024,
            disk_bytes: disk,
            net_bytes: net,
            start_ticks: Some(1),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // -------------------------------------------------------------------------
    // Tests for rate formulas
    // -------------------------------------------------------------------------

    #[test]
    fn test_cpu_percent_single_core() {
        let sampler = ProcessSampler::new(100.0, 1);
        let t0 = Instant::now();
        let mut process = Process::new(1, "p".into(), counters(0, None, None), t0);

        let metrics = sampler.sample(&mut process, counters(50, None, None), t0 + Duration::from_secs(1));
        assert!(approx(metrics.cpu_percent, 50.0));
        assert_eq!(metrics.memory_kb, 2048);
    }

    #[test]
    fn test_cpu_percent_normalized_by_cores_and_clamped() {
        let sampler = ProcessSampler::new(100.0, 4);
        let t0 = Instant::now();
        let mut process = Process::new(1, "p".into(), counters(0, None, None), t0);

        let metrics = sampler.sample(&mut process, counters(100, None, None), t0 + Duration::from_secs(1));
        assert!(approx(metrics.cpu_percent, 25.0));

        // more ticks than capacity (counter granularity) never exceeds 100
        let metrics = sampler.sample(&mut process, counters(1000, None, None), t0 + Duration::from_secs(2));
        assert!(approx(metrics.cpu_percent, 100.0));
    }

    #[test]
    fn test_disk_and_network_rates() {
        let sampler = ProcessSampler::new(100.0, 1);
        let t0 = Instant::now();
        let mut process = Process::new(1, "p".into(), counters(0, Some(0), Some(0)), t0);

        let metrics = sampler.sample(
            &mut process,
            counters(0, Some(4 * 1024 * 1024), Some(2_000_000)),
            t0 + Duration::from_secs(2),
        );
        assert!(approx(metrics.disk_mb_per_sec, 2.0));
        assert!(approx(metrics.network_mbps, 8.0));
    }

    #[test]
    fn test_unavailable_counters_give_zero_rates() {
        let sampler = ProcessSampler::new(100.0, 1);
        let t0 = Instant::now();
        let mut process = Process::new(1, "p".into(), counters(0, None, Some(10)), t0);

        let metrics = sampler.sample(&mut process, counters(10, Some(1 << 30), None), t0 + Duration::from_secs(1));
        assert_eq!(metrics.disk_mb_per_sec, 0.0);
        assert_eq!(metrics.network_mbps, 0.0);
        assert!(approx(metrics.cpu_percent, 10.0));
    }

    // -------------------------------------------------------------------------
    // Tests for edge cases
    // -------------------------------------------------------------------------

    #[test]
    fn test_zero_elapsed_keeps_previous_rates() {
        let sampler = ProcessSampler::new(100.0, 1);
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);
        let mut process = Process::new(1, "p".into(), counters(0, None, None), t0);
        sampler.sample(&mut process, counters(30, None, None), t1);

        let mut bigger = counters(90, None, None);
        bigger.resident_bytes = 4096 * 1024;
        let metrics = sampler.sample(&mut process, bigger, t1);

        assert!(approx(metrics.cpu_percent, 30.0));
        assert_eq!(metrics.memory_kb, 4096);
    }

    #[test]
    fn test_counter_rollback_is_fresh_baseline() {
        let sampler = ProcessSampler::new(100.0, 1);
        let t0 = Instant::now();
        let mut process = Process::new(1, "p".into(), counters(500, Some(1000), None), t0);
        sampler.sample(&mut process, counters(550, Some(2000), None), t0 + Duration::from_secs(1));

        let metrics = sampler.sample(&mut process, counters(5, Some(3000), None), t0 + Duration::from_secs(2));
        assert_eq!(metrics.cpu_percent, 0.0);
        assert_eq!(metrics.disk_mb_per_sec, 0.0);

        // the rolled-back sample is the new baseline
        let metrics = sampler.sample(&mut process, counters(15, Some(3000), None), t0 + Duration::from_secs(3));
        assert!(approx(metrics.cpu_percent, 10.0));
    }

    #[test]
    fn test_rollback_without_elapsed_time_still_resets() {
        let sampler = ProcessSampler::new(100.0, 1);
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);
        let mut process = Process::new(1, "p".into(), counters(100, None, None), t0);
        let metrics = sampler.sample(&mut process, counters(140, None, None), t1);
        assert!(approx(metrics.cpu_percent, 40.0));

        let metrics = sampler.sample(&mut process, counters(3, None, None), t1);
        assert_eq!(metrics.cpu_percent, 0.0);
        assert_eq!(metrics.memory_kb, 2048);
    }

    #[test]
    fn test_disk_rollback_zeroes_all_rates() {
        let sampler = ProcessSampler::new(100.0, 1);
        let t0 = Instant::now();
        let mut process = Process::new(1, "p".into(), counters(0, Some(5000), None), t0);

        let metrics = sampler.sample(&mut process, counters(40, Some(100), None), t0 + Duration::from_secs(1));
        assert_eq!(metrics.cpu_percent, 0.0);
        assert_eq!(metrics.disk_mb_per_sec, 0.0);
    }

    #[test]
    fn test_samples_rotate() {
        let sampler = ProcessSampler::new(100.0, 1);
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(500);
        let mut process = Process::new(1, "p".into(), counters(1, None, None), t0);
        sampler.sample(&mut process, counters(2, None, None), t1);

        assert_eq!(process.previous().map(|s| s.counters.cpu_ticks), Some(1));
        assert_eq!(process.current().counters.cpu_ticks, 2);
        assert_eq!(process.current().taken_at, t1);
    }

    #[test]
    fn test_invalid_clock_parameters_fall_back() {
        let sampler = ProcessSampler::new(0.0, 0);
        assert_eq!(sampler.ticks_per_second(), 100.0);
        assert_eq!(sampler.cores(), 1);
    }
}
