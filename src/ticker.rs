//! Background refresh loop.
//!
//! Drives the monitor on a fixed period: an immediate baseline refresh, one
//! extra refresh after the warmup delay so rates show up quickly, then one
//! refresh per interval. A slow cycle delays the next tick instead of
//! overlapping it.

use std::time::Duration;

use herakles_top::RefreshEvent;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::state::SharedState;

/// Runs one refresh cycle under the monitor's write lock and publishes the
/// resulting event.
#[instrument(skip(state, events))]
pub async fn refresh_once(state: &SharedState, events: &watch::Sender<RefreshEvent>) -> RefreshEvent {
    let event = {
        let mut monitor = state.monitor.write().await;
        monitor.refresh()
    };

    if !event.processes_ok {
        warn!("Refresh {} kept the previous process set", event.version);
    }
    debug!(
        "Refresh {} published: {} processes in {:.1} ms",
        event.version,
        event.process_count,
        event.duration.as_secs_f64() * 1000.0
    );
    events.send_replace(event.clone());
    event
}

/// Refreshes forever on the configured cadence.
pub async fn run(state: SharedState, events: watch::Sender<RefreshEvent>) {
    let period = state.config.refresh_interval();
    let warmup = state.config.warmup_delay();
    info!(
        "Refreshing every {} ms (warmup {} ms)",
        period.as_millis(),
        warmup.as_millis()
    );

    let start = Instant::now();
    refresh_once(&state, &events).await;

    if warmup > Duration::ZERO && warmup < period {
        time::sleep(warmup).await;
        refresh_once(&state, &events).await;
    }

    let mut interval = time::interval_at(start + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        refresh_once(&state, &events).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::AppState;
    use herakles_top::{Monitor, MonitorOptions, ProcessCounters, ScriptedSource};

    fn state_with_scripted_source() -> (SharedState, watch::Sender<RefreshEvent>) {
        let mut source = ScriptedSource::with_clock(100.0, 1);
        source.upsert_process(1, "init", ProcessCounters::default());
        let monitor = Monitor::new(
            Box::new(source) as crate::state::DynSource,
            MonitorOptions::default(),
        );
        let config = Config {
            refresh_interval_ms: Some(200),
            warmup_delay_ms: Some(20),
            ..Config::default()
        };
        AppState::new(monitor, config)
    }

    #[tokio::test]
    async fn test_refresh_once_publishes_event() {
        let (state, tx) = state_with_scripted_source();
        let mut rx = state.events.clone();

        let event = refresh_once(&state, &tx).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().version, event.version);
        assert_eq!(state.latest_event().process_count, 1);
    }

    #[tokio::test]
    async fn test_run_produces_warmup_and_periodic_refreshes() {
        let (state, tx) = state_with_scripted_source();
        let mut rx = state.events.clone();
        tokio::spawn(run(state.clone(), tx));

        for expected in 1..=3u64 {
            rx.changed().await.unwrap();
            assert_eq!(rx.borrow_and_update().version, expected);
        }
    }
}
