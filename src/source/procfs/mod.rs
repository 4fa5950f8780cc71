//! Linux `/proc` and `/sys` counter source.

pub mod process;
pub mod system;
pub mod thermal;

use std::fs;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::source::{CounterSource, HardwareDescription, ProcessCounters, SystemCounters};

pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_SYS_ROOT: &str = "/sys";

/// Get system clock ticks per second (usually 100, but can vary).
fn get_clk_tck() -> f64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_CLK_TCK
        // Returns -1 on error, 0 if undefined - both are handled by the > 0 check
        unsafe {
            let tck = libc::sysconf(libc::_SC_CLK_TCK);
            if tck > 0 {
                return tck as f64;
            }
        }
    }
    100.0
}

/// System clock ticks per second (for CPU time calculation).
pub static CLK_TCK: Lazy<f64> = Lazy::new(get_clk_tck);

fn online_cpus() -> usize {
    // SAFETY: sysconf has no preconditions; non-positive results are rejected
    let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if n > 0 {
        n as usize
    } else {
        1
    }
}

/// Counter source backed by the Linux proc and sys filesystems.
#[derive(Debug, Clone)]
pub struct ProcFs {
    proc_root: PathBuf,
    sys_root: PathBuf,
    ticks_per_second: f64,
    cpu_count: usize,
    read_thermal: bool,
}

impl ProcFs {
    pub fn new() -> Self {
        Self::with_roots(DEFAULT_PROC_ROOT, DEFAULT_SYS_ROOT)
    }

    /// Source reading from alternative roots, e.g. a fixture tree or a
    /// host `/proc` mounted into a container.
    pub fn with_roots(proc_root: impl Into<PathBuf>, sys_root: impl Into<PathBuf>) -> Self {
        let proc_root = proc_root.into();
        let cpu_count = fs::read_to_string(proc_root.join("stat"))
            .ok()
            .map(|content| system::count_cpus(&content))
            .filter(|n| *n > 0)
            .unwrap_or_else(online_cpus);

        Self {
            proc_root,
            sys_root: sys_root.into(),
            ticks_per_second: *CLK_TCK,
            cpu_count,
            read_thermal: true,
        }
    }

    pub fn with_thermal(mut self, enabled: bool) -> Self {
        self.read_thermal = enabled;
        self
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    pub fn sys_root(&self) -> &Path {
        &self.sys_root
    }

    fn read_root_file(&self, name: &str) -> Result<String, SourceError> {
        let path = self.proc_root.join(name);
        fs::read_to_string(&path).map_err(|e| SourceError::io(&path, e))
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for ProcFs {
    fn process_ids(&self) -> Result<Vec<u32>, SourceError> {
        process::list_pids(&self.proc_root)
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        process::read_process_name(&process::pid_path(&self.proc_root, pid))
    }

    fn process_counters(&self, pid: u32) -> Result<ProcessCounters, SourceError> {
        let proc_path = process::pid_path(&self.proc_root, pid);
        let stat = process::read_stat(pid, &proc_path)?;
        let resident_bytes = process::read_resident_bytes(pid, &proc_path)?;

        Ok(ProcessCounters {
            cpu_ticks: stat.cpu_ticks,
            resident_bytes,
            disk_bytes: process::read_io_bytes(&proc_path),
            // /proc/<pid>/net/dev is per network namespace, not per process
            net_bytes: None,
            start_ticks: Some(stat.start_ticks),
        })
    }

    fn system_counters(&self) -> Result<SystemCounters, SourceError> {
        let stat = self.read_root_file("stat")?;
        let cpu = system::parse_cpu_times(&stat)
            .ok_or_else(|| SourceError::parse(&self.proc_root.join("stat"), "missing cpu line"))?;

        let meminfo = self.read_root_file("meminfo")?;
        let memory = system::parse_meminfo(&meminfo).ok_or_else(|| {
            SourceError::parse(&self.proc_root.join("meminfo"), "missing MemTotal")
        })?;

        let uptime_seconds = match self.read_root_file("uptime") {
            Ok(content) => system::parse_uptime(&content).unwrap_or(0.0),
            Err(e) => {
                warn!("{}", e);
                0.0
            }
        };

        let cpu_mhz = self
            .read_root_file("cpuinfo")
            .ok()
            .and_then(|content| system::parse_cpu_mhz(&content));

        let temperature_celsius = if self.read_thermal {
            thermal::hottest(&self.sys_root)
        } else {
            None
        };

        Ok(SystemCounters {
            cpu,
            memory_total_kb: memory.total_kb,
            memory_available_kb: memory.available_kb,
            memory_cached_kb: memory.cached_kb,
            uptime_seconds,
            cpu_mhz,
            temperature_celsius,
        })
    }

    fn describe_hardware(&self) -> Result<HardwareDescription, SourceError> {
        Ok(HardwareDescription {
            cpuinfo: self.read_root_file("cpuinfo")?,
            meminfo: self.read_root_file("meminfo")?,
        })
    }

    fn ticks_per_second(&self) -> f64 {
        self.ticks_per_second
    }

    fn cpu_count(&self) -> usize {
        self.cpu_count
    }

    fn terminate(&mut self, pid: u32) -> Result<(), SourceError> {
        // 0 and negative values address process groups
        let raw = match i32::try_from(pid) {
            Ok(raw) if raw > 0 => raw,
            _ => {
                debug!("Refusing to signal invalid pid {}", pid);
                return Ok(());
            }
        };

        match signal::kill(Pid::from_raw(raw), Signal::SIGTERM) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => {
                debug!("Process {} already exited", pid);
                Ok(())
            }
            Err(source) => Err(SourceError::Signal { pid, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_clk_tck_is_positive() {
        assert!(*CLK_TCK > 0.0);
    }

    #[test]
    fn test_cpu_count_from_proc_stat() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("stat"),
            "cpu  1 0 1 10 0 0 0 0\ncpu0 1 0 1 5 0 0 0 0\ncpu1 0 0 0 5 0 0 0 0\ncpu2 0 0 0 0 0 0 0 0\n",
        )
        .unwrap();
        let source = ProcFs::with_roots(dir.path(), dir.path());
        assert_eq!(source.cpu_count(), 3);
    }

    #[test]
    fn test_missing_proc_root_fails_enumeration() {
        let dir = tempdir().unwrap();
        let source = ProcFs::with_roots(dir.path().join("missing"), dir.path());
        assert!(source.process_ids().is_err());
        assert!(source.system_counters().is_err());
    }

    #[test]
    fn test_terminate_invalid_pid_is_noop() {
        let mut source = ProcFs::new();
        assert!(source.terminate(0).is_ok());
        assert!(source.terminate(u32::MAX).is_ok());
    }
}
