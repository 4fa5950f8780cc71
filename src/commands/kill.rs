//! Kill command implementation.

use herakles_top::KillRequest;

use crate::config::Config;
use crate::state::build_monitor;

/// Sends one termination request. The PID must show up in a fresh
/// enumeration, exactly as for requests coming through the HTTP API.
pub fn command_kill(config: &Config, pid: u32) -> anyhow::Result<()> {
    let mut monitor = build_monitor(config)?;
    monitor.refresh();

    let name = monitor
        .process(pid)
        .map(|p| p.name().to_string())
        .unwrap_or_default();
    match monitor.kill_process(pid) {
        KillRequest::Sent => println!("✅ Termination requested for {} ({})", pid, name),
        KillRequest::Ignored => println!("⚠️  No termination request sent to {}", pid),
    }
    Ok(())
}
