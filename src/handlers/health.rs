//! Health check endpoint handler.
//!
//! Reports whether the refresh loop has completed a cycle and whether the
//! last cycle could enumerate processes.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use herakles_top::RefreshEvent;
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::state::SharedState;

// Time conversion constants
const SECONDS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Footer text for human-readable HTTP endpoints.
pub const FOOTER_TEXT: &str = "Project: https://github.com/cansp-dev/herakles-top — More info: https://www.herakles.now — Support: exporter@herakles.now";

/// Maps the latest refresh event to an HTTP status and a short message.
pub fn health_status(event: &RefreshEvent) -> (StatusCode, &'static str) {
    if event.version == 0 {
        (StatusCode::SERVICE_UNAVAILABLE, "Starting - no refresh completed yet")
    } else if !event.processes_ok {
        (StatusCode::SERVICE_UNAVAILABLE, "Process enumeration failed")
    } else if !event.system_ok {
        (StatusCode::OK, "OK - system counters stale")
    } else {
        (StatusCode::OK, "OK")
    }
}

fn format_service_uptime(uptime_seconds: u64) -> String {
    let uptime_hours = uptime_seconds as f64 / SECONDS_PER_HOUR;
    if uptime_hours < 1.0 {
        format!("{:.1} minutes", uptime_hours * MINUTES_PER_HOUR)
    } else if uptime_hours < HOURS_PER_DAY {
        format!("{:.1} hours", uptime_hours)
    } else {
        format!("{:.1} days", uptime_hours / HOURS_PER_DAY)
    }
}

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let event = state.latest_event();
    let (status, message) = health_status(&event);
    let uptime_str = format_service_uptime(state.start_time.elapsed().as_secs());

    let mut table = String::new();
    writeln!(table, "{:20} | {:>24}", "Field", "Value").ok();
    writeln!(table, "{}", "-".repeat(47)).ok();
    writeln!(table, "{:20} | {:>24}", "version", event.version).ok();
    writeln!(table, "{:20} | {:>24}", "processes", event.process_count).ok();
    writeln!(table, "{:20} | {:>24}", "discovered", event.discovered).ok();
    writeln!(table, "{:20} | {:>24}", "removed", event.removed).ok();
    writeln!(
        table,
        "{:20} | {:>24}",
        "duration_ms",
        format!("{:.2}", event.duration.as_secs_f64() * 1000.0)
    )
    .ok();
    writeln!(
        table,
        "{:20} | {:>24}",
        "sampled_at",
        event.sampled_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
    .ok();
    writeln!(table, "{:20} | {:>24}", "system_ok", event.system_ok).ok();
    writeln!(table, "{:20} | {:>24}", "processes_ok", event.processes_ok).ok();

    debug!("Health check: {} - {}", status, message);
    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!("{message}\n\nUptime: {uptime_str}\n\n{table}\n{FOOTER_TEXT}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_until_first_refresh() {
        let (status, _) = health_status(&RefreshEvent::default());
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_enumeration_failure_is_unhealthy() {
        let event = RefreshEvent {
            version: 3,
            processes_ok: false,
            system_ok: true,
            ..RefreshEvent::default()
        };
        assert_eq!(health_status(&event).0, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_stale_system_counters_still_healthy() {
        let event = RefreshEvent {
            version: 3,
            processes_ok: true,
            system_ok: false,
            ..RefreshEvent::default()
        };
        assert_eq!(health_status(&event), (StatusCode::OK, "OK - system counters stale"));
    }

    #[test]
    fn test_format_service_uptime() {
        assert_eq!(format_service_uptime(90), "1.5 minutes");
        assert_eq!(format_service_uptime(7200), "2.0 hours");
        assert_eq!(format_service_uptime(172_800), "2.0 days");
    }
}
