//! Plain-text rendering of the system summary and the process table.

use std::fmt::Write as FmtWrite;

use herakles_top::format::{format_gigabytes, format_percent};
use herakles_top::view::Alignment;
use herakles_top::{ProcessRow, SortKey, SortOrder, SystemSnapshot, COLUMNS};

const NAME_WIDTH: usize = 24;
const CELL_WIDTH: usize = 12;

fn pad(text: &str, width: usize, alignment: Alignment) -> String {
    match alignment {
        Alignment::Left => format!("{:<width$}", text, width = width),
        Alignment::Center => format!("{:^width$}", text, width = width),
        Alignment::Right => format!("{:>width$}", text, width = width),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('~');
    out
}

/// Renders the system summary block.
pub fn render_system_summary(system: &SystemSnapshot) -> String {
    let mut out = String::new();
    let info = &system.info;

    let model = if info.model_name.is_empty() {
        "unknown CPU"
    } else {
        info.model_name.as_str()
    };
    write!(out, "CPU:         {}", model).ok();
    if !info.rated_speed.is_empty() {
        write!(out, " @ {}", info.rated_speed).ok();
    }
    writeln!(out).ok();

    let count = |v: Option<u32>| v.map_or_else(|| "?".to_string(), |n| n.to_string());
    writeln!(
        out,
        "Cores:       {} physical / {} logical",
        count(info.physical_cores),
        count(info.logical_processors)
    )
    .ok();
    writeln!(
        out,
        "Load:        {}   Speed: {}   Temperature: {}",
        format_percent(system.cpu_percent),
        system.cpu_speed(),
        system.temperature()
    )
    .ok();
    writeln!(
        out,
        "Memory:      {} used / {} total   {} available   {} cached",
        format_gigabytes(system.memory_used_kb),
        format_gigabytes(system.memory_total_kb),
        format_gigabytes(system.memory_available_kb),
        format_gigabytes(system.memory_cached_kb)
    )
    .ok();
    writeln!(
        out,
        "Uptime:      {}   Processes: {}",
        system.uptime(),
        system.process_count
    )
    .ok();
    out
}

/// Renders process rows as a fixed-width table, marking the sort column.
pub fn render_process_table(rows: &[ProcessRow], sort: Option<SortKey>) -> String {
    let mut out = String::new();

    let mut header = String::new();
    for (i, column) in COLUMNS.iter().enumerate() {
        let width = if i == 0 { NAME_WIDTH } else { CELL_WIDTH };
        let mut title = column.header.to_string();
        if let Some(key) = sort.filter(|k| k.column == column.column) {
            title.push(match key.order {
                SortOrder::Ascending => '^',
                SortOrder::Descending => 'v',
            });
        }
        header.push_str(&pad(&title, width, column.alignment));
        header.push(' ');
    }
    writeln!(out, "{}", header.trim_end()).ok();
    writeln!(out, "{}", "-".repeat(NAME_WIDTH + (CELL_WIDTH + 1) * (COLUMNS.len() - 1))).ok();

    for row in rows {
        let mut line = String::new();
        for (i, (column, cell)) in COLUMNS.iter().zip(&row.cells).enumerate() {
            let width = if i == 0 { NAME_WIDTH } else { CELL_WIDTH };
            line.push_str(&pad(&truncate(cell, width), width, column.alignment));
            line.push(' ');
        }
        writeln!(out, "{}", line.trim_end()).ok();
    }

    if rows.is_empty() {
        writeln!(out, "(no processes)").ok();
    }
    out
}
