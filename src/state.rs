//! Application state management.
//!
//! This module defines the shared application state that is passed to HTTP
//! handlers and driven by the background refresh ticker.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use herakles_top::source::procfs::{DEFAULT_PROC_ROOT, DEFAULT_SYS_ROOT};
use herakles_top::{CounterSource, Monitor, MonitorOptions, ProcFs, RefreshEvent, ScriptedSource};
use tokio::sync::{watch, RwLock};
use tracing::info;

use crate::config::Config;

/// Counter source chosen at startup.
pub type DynSource = Box<dyn CounterSource + Send + Sync>;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests and background tasks.
pub struct AppState {
    /// Written only by the ticker; a refresh cycle holds the write lock for
    /// its whole duration.
    pub monitor: RwLock<Monitor<DynSource>>,
    /// Latest completed refresh.
    pub events: watch::Receiver<RefreshEvent>,
    pub config: Arc<Config>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        monitor: Monitor<DynSource>,
        config: Config,
    ) -> (SharedState, watch::Sender<RefreshEvent>) {
        let (tx, rx) = watch::channel(RefreshEvent::default());
        let state = Arc::new(AppState {
            monitor: RwLock::new(monitor),
            events: rx,
            config: Arc::new(config),
            start_time: Instant::now(),
        });
        (state, tx)
    }

    pub fn latest_event(&self) -> RefreshEvent {
        self.events.borrow().clone()
    }
}

/// Builds the counter source from configuration: scripted frames when a
/// test data file is configured, the live proc filesystem otherwise.
pub fn build_source(config: &Config) -> anyhow::Result<DynSource> {
    if let Some(path) = &config.test_data_file {
        let source = ScriptedSource::from_file(path)
            .with_context(|| format!("Failed to load test data from {}", path.display()))?;
        info!(
            "Using scripted test data: {} frame(s) from {}",
            source.data().frames.len(),
            path.display()
        );
        return Ok(Box::new(source));
    }

    let proc_root = config
        .proc_root
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT));
    let sys_root = config
        .sys_root
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SYS_ROOT));
    info!(
        "Reading counters from {} and {}",
        proc_root.display(),
        sys_root.display()
    );
    let source = ProcFs::with_roots(proc_root, sys_root)
        .with_thermal(config.enable_thermal.unwrap_or(true));
    Ok(Box::new(source))
}

pub fn build_monitor(config: &Config) -> anyhow::Result<Monitor<DynSource>> {
    let source = build_source(config)?;
    let options = MonitorOptions {
        ticks_per_second: config.ticks_per_second,
        cpu_count: config.cpu_count,
        sort_key: config.sort_key(),
    };
    Ok(Monitor::new(source, options))
}
