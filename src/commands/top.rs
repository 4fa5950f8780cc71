//! Top command implementation.
//!
//! Runs the refresh loop in the foreground and redraws the system summary
//! and process table after every completed refresh.

use std::io::{self, IsTerminal, Write};

use tokio::signal;
use tracing::{debug, info};

use crate::config::Config;
use crate::render::{render_process_table, render_system_summary};
use crate::state::{build_monitor, AppState, SharedState};
use crate::ticker;

/// Clears the terminal and moves the cursor home.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Renders one frame: summary, blank line, table.
pub async fn render_frame(state: &SharedState, limit: usize) -> String {
    let monitor = state.monitor.read().await;
    format!(
        "{}\n{}",
        render_system_summary(monitor.system()),
        render_process_table(&monitor.rows(Some(limit)), monitor.sort_key())
    )
}

/// Renders after every refresh until interrupted or `iterations` frames
/// have been drawn.
pub async fn command_top(
    config: Config,
    iterations: Option<usize>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let limit = limit.unwrap_or_else(|| config.top_n());
    let monitor = build_monitor(&config)?;
    let (state, events) = AppState::new(monitor, config);
    let mut rx = state.events.clone();

    let ticker_handle = tokio::spawn(ticker::run(state.clone(), events));
    let clear = io::stdout().is_terminal();
    let mut drawn = 0usize;

    info!("Rendering top {} processes", limit);
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let version = rx.borrow_and_update().version;
                debug!("Drawing frame for refresh {}", version);

                let frame = render_frame(&state, limit).await;
                let mut stdout = io::stdout().lock();
                if clear {
                    write!(stdout, "{}", CLEAR_SCREEN)?;
                }
                writeln!(stdout, "{}", frame)?;
                stdout.flush()?;

                drawn += 1;
                if iterations.is_some_and(|n| drawn >= n) {
                    break;
                }
            }
            _ = signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    ticker_handle.abort();
    Ok(())
}
