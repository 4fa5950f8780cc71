//! Startup requirement validation for herakles-top.
//!
//! Makes sure the configured counter source can be read before the refresh
//! loop starts. Only an unreadable process list is fatal; missing optional
//! counters degrade individual columns and are reported as warnings.

use nix::unistd::geteuid;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use herakles_top::source::procfs::{thermal, DEFAULT_PROC_ROOT, DEFAULT_SYS_ROOT};

use crate::config::Config;

/// Validate all runtime requirements
pub fn validate_requirements(config: &Config, all: bool) -> Result<(), ValidationError> {
    if config.test_data_file.is_some() {
        info!("Using scripted test data, skipping /proc checks");
        return Ok(());
    }

    info!("🔍 Validating runtime requirements...");
    let proc_root = config
        .proc_root
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT));
    let sys_root = config
        .sys_root
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SYS_ROOT));

    check_user_privileges();
    check_proc_access(&proc_root)?;

    if all {
        check_io_counters(&proc_root);
        if config.enable_thermal.unwrap_or(true) {
            check_thermal_sensors(&sys_root);
        }
    }

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Check if running with sufficient privileges
fn check_user_privileges() {
    if !geteuid().is_root() {
        warn!("⚠️  Not running as root - disk counters of other users' processes are unreadable");
    } else {
        info!("✅ Running as root (uid=0)");
    }
}

/// The process list and system counters must be readable.
fn check_proc_access(proc_root: &Path) -> Result<(), ValidationError> {
    let entries = fs::read_dir(proc_root).map_err(|e| ValidationError::ProcUnreadable {
        path: proc_root.to_path_buf(),
        reason: e.to_string(),
    })?;

    let pids = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().parse::<u32>().is_ok())
        .count();
    if pids == 0 {
        return Err(ValidationError::NoProcesses(proc_root.to_path_buf()));
    }
    info!("✅ {} lists {} processes", proc_root.display(), pids);

    let stat = proc_root.join("stat");
    if let Err(e) = fs::metadata(&stat) {
        return Err(ValidationError::ProcUnreadable {
            path: stat,
            reason: e.to_string(),
        });
    }
    Ok(())
}

/// Per-process I/O counters of foreign processes need root or CAP_SYS_PTRACE.
fn check_io_counters(proc_root: &Path) {
    let test_file = proc_root.join("1").join("io");
    match fs::read_to_string(&test_file) {
        Ok(_) => info!("✅ {} readable: disk rates available", test_file.display()),
        Err(e) => {
            warn!("⚠️  Cannot read {}: {}", test_file.display(), e);
            warn!("   Disk rates will show 0 for processes owned by other users");
            warn!("   Run as root or grant: setcap cap_sys_ptrace+ep /path/to/binary");
        }
    }
}

fn check_thermal_sensors(sys_root: &Path) {
    let sensors = thermal::collect_temperatures(sys_root);
    if sensors.is_empty() {
        warn!(
            "⚠️  No thermal sensors found under {} - temperature will show n/a",
            sys_root.display()
        );
    } else {
        info!("✅ {} thermal sensor(s) found", sensors.len());
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Cannot read {}: {reason}", .path.display())]
    ProcUnreadable { path: PathBuf, reason: String },

    #[error("No process directories found in {}", .0.display())]
    NoProcesses(PathBuf),
}
