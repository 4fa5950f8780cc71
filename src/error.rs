//! Error types for counter sources.
//!
//! Every error here is recoverable from the engine's point of view: a
//! vanished or unreadable process is dropped from the tracked set, a failed
//! system read keeps the previous snapshot, and the next tick retries.

use std::io;
use std::path::{Path, PathBuf};

/// Errors raised while reading raw counters.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("process {0} no longer exists")]
    Vanished(u32),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("failed to signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: nix::Error,
    },
}

impl SourceError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        SourceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn parse(path: &Path, reason: impl Into<String>) -> Self {
        SourceError::Parse {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Maps an I/O error on a per-process file, turning "the process is gone"
    /// (ENOENT, ESRCH) into [`SourceError::Vanished`].
    pub fn from_process_io(pid: u32, path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound || source.raw_os_error() == Some(libc::ESRCH) {
            SourceError::Vanished(pid)
        } else {
            SourceError::io(path, source)
        }
    }

    pub fn is_vanished(&self) -> bool {
        matches!(self, SourceError::Vanished(_))
    }
}
