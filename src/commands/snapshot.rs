//! Snapshot command implementation.
//!
//! Takes a baseline, waits for the warmup delay, takes a second sample and
//! prints the result once.

use herakles_top::{ProcessRow, SortKey, SystemSnapshot};
use serde::Serialize;
use tracing::debug;

use crate::cli::SnapshotFormat;
use crate::config::Config;
use crate::render::{render_process_table, render_system_summary};
use crate::state::build_monitor;

#[derive(Serialize)]
struct SnapshotOutput<'a> {
    system: &'a SystemSnapshot,
    sort: Option<SortKey>,
    rows: Vec<ProcessRow>,
}

pub async fn command_snapshot(
    config: Config,
    limit: Option<usize>,
    format: SnapshotFormat,
) -> anyhow::Result<()> {
    let limit = limit.unwrap_or_else(|| config.top_n());
    let mut monitor = build_monitor(&config)?;

    monitor.refresh();
    tokio::time::sleep(config.warmup_delay()).await;
    let event = monitor.refresh();
    debug!("Snapshot taken after {:?}", event.duration);

    match format {
        SnapshotFormat::Text => {
            println!("{}", render_system_summary(monitor.system()));
            print!(
                "{}",
                render_process_table(&monitor.rows(Some(limit)), monitor.sort_key())
            );
        }
        SnapshotFormat::Json => {
            let output = SnapshotOutput {
                system: monitor.system(),
                sort: monitor.sort_key(),
                rows: monitor.rows(Some(limit)),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
