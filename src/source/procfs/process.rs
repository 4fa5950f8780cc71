//! Per-process counter parsing for `/proc/<pid>`.
//!
//! Reads `stat` (CPU ticks, start time), `status` (resident set) and `io`
//! (storage bytes). Name lookup prefers `comm` and falls back to the
//! basename of `cmdline[0]`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SourceError;

/// Fields of interest from `/proc/<pid>/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatFields {
    /// utime + stime, in clock ticks.
    pub cpu_ticks: u64,
    /// starttime, in clock ticks since boot.
    pub start_ticks: u64,
}

/// Scans a proc root for numeric (PID) directory entries.
pub fn list_pids(root: &Path) -> Result<Vec<u32>, SourceError> {
    let entries = fs::read_dir(root).map_err(|e| SourceError::io(root, e))?;
    let mut out = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = match name.to_str() {
            Some(v) => v,
            None => continue,
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if let Ok(pid) = name.parse::<u32>() {
            out.push(pid);
        }
    }
    Ok(out)
}

/// Parses the contents of `/proc/<pid>/stat`.
///
/// The command name (field 2) may contain spaces and parentheses, so fields
/// are counted from after the last `)`.
pub fn parse_stat(content: &str) -> Option<StatFields> {
    let rest = &content[content.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    // fields[0] is field 3 (state); utime=14, stime=15, starttime=22
    if fields.len() <= 19 {
        return None;
    }
    let utime: u64 = fields[11].parse().ok()?;
    let stime: u64 = fields[12].parse().ok()?;
    let start_ticks: u64 = fields[19].parse().ok()?;
    Some(StatFields {
        cpu_ticks: utime.saturating_add(stime),
        start_ticks,
    })
}

pub fn read_stat(pid: u32, proc_path: &Path) -> Result<StatFields, SourceError> {
    let path = proc_path.join("stat");
    let content =
        fs::read_to_string(&path).map_err(|e| SourceError::from_process_io(pid, &path, e))?;
    parse_stat(&content).ok_or_else(|| SourceError::parse(&path, "malformed stat line"))
}

/// Parses kilobyte values from `/proc` lines (`"  1234 kB"`).
pub fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// Reads VmRSS from `/proc/<pid>/status`, in bytes.
///
/// Kernel threads have no VmRSS line; they report 0.
pub fn read_resident_bytes(pid: u32, proc_path: &Path) -> Result<u64, SourceError> {
    let path = proc_path.join("status");
    let content =
        fs::read_to_string(&path).map_err(|e| SourceError::from_process_io(pid, &path, e))?;

    for line in content.lines() {
        if let Some(v) = line.strip_prefix("VmRSS:") {
            return parse_kb_value(v)
                .map(|kb| kb * 1024)
                .ok_or_else(|| SourceError::parse(&path, "malformed VmRSS value"));
        }
    }
    Ok(0)
}

/// Reads storage I/O from `/proc/<pid>/io` as `read_bytes + write_bytes`.
///
/// Reading another user's `io` file needs root or CAP_SYS_PTRACE, so any
/// failure yields `None`.
pub fn read_io_bytes(proc_path: &Path) -> Option<u64> {
    let path = proc_path.join("io");
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            debug!("Cannot read {}: {}", path.display(), e);
            return None;
        }
    };

    let mut read_bytes: Option<u64> = None;
    let mut write_bytes: Option<u64> = None;
    for line in content.lines() {
        if let Some(v) = line.strip_prefix("read_bytes:") {
            read_bytes = v.trim().parse().ok();
        } else if let Some(v) = line.strip_prefix("write_bytes:") {
            write_bytes = v.trim().parse().ok();
        }
        if read_bytes.is_some() && write_bytes.is_some() {
            break;
        }
    }

    Some(read_bytes?.saturating_add(write_bytes?))
}

/// Reads process name from comm file or extracts it from cmdline.
pub fn read_process_name(proc_path: &Path) -> Option<String> {
    if let Ok(s) = fs::read_to_string(proc_path.join("comm")) {
        let t = s.trim();
        if !t.is_empty() {
            return Some(t.into());
        }
    }

    let content = fs::read(proc_path.join("cmdline")).ok()?;
    let first = content.split(|&b| b == 0u8).next()?;
    let first = std::str::from_utf8(first).ok()?;
    Path::new(first)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

pub fn pid_path(root: &Path, pid: u32) -> PathBuf {
    root.join(pid.to_string())
}
