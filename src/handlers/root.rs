//! Root endpoint handler for the landing page.
//!
//! Shows version, the system summary and the top of the process table with
//! heat-coloured cells, plus links to the machine-readable endpoints.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use herakles_top::format::{format_gigabytes, format_percent};
use herakles_top::view::Alignment;
use herakles_top::{ProcessRow, SortKey, SortOrder, SystemSnapshot, COLUMNS};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

/// Background colours for heat levels 0..=4.
const HEAT_COLORS: [&str; 5] = ["transparent", "#fff3b0", "#ffd27f", "#ffaa44", "#ff4444"];

fn build_version() -> String {
    match option_env!("VERGEN_GIT_SHA") {
        Some(sha) => format!("{} ({})", env!("CARGO_PKG_VERSION"), sha),
        None => env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_table_html(rows: &[ProcessRow], sort: Option<SortKey>) -> String {
    let mut out = String::new();
    out.push_str("<table>\n<tr>");
    for column in COLUMNS.iter() {
        let marker = match sort {
            Some(key) if key.column == column.column => match key.order {
                SortOrder::Ascending => " &#9650;",
                SortOrder::Descending => " &#9660;",
            },
            _ => "",
        };
        write!(out, "<th>{}{}</th>", column.header, marker).ok();
    }
    out.push_str("</tr>\n");

    for row in rows {
        out.push_str("<tr>");
        for (i, column) in COLUMNS.iter().enumerate() {
            let align = match column.alignment {
                Alignment::Left => "left",
                Alignment::Center => "center",
                Alignment::Right => "right",
            };
            let heat = row.heat.get(i).copied().unwrap_or(0).min(4) as usize;
            let cell = row.cells.get(i).map(String::as_str).unwrap_or("");
            write!(
                out,
                r#"<td style="text-align:{};background:{}">{}</td>"#,
                align,
                HEAT_COLORS[heat],
                escape_html(cell)
            )
            .ok();
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
    out
}

fn render_summary_html(system: &SystemSnapshot) -> String {
    let item = |label: &str, value: &str| {
        format!(
            r#"<div class="info-item"><span class="info-label">{}</span><span class="info-value">{}</span></div>"#,
            label,
            escape_html(value)
        )
    };
    let mut out = String::new();
    out.push_str(&item("CPU", &format_percent(system.cpu_percent)));
    out.push_str(&item("Speed", &system.cpu_speed()));
    out.push_str(&item("Temperature", &system.temperature()));
    out.push_str(&item("Memory used", &format_gigabytes(system.memory_used_kb)));
    out.push_str(&item("System uptime", &system.uptime()));
    out.push_str(&item("Processes", &system.process_count.to_string()));
    out
}

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");

    let version = build_version();

    // Calculate actual uptime from service start time
    let uptime_secs = state.start_time.elapsed().as_secs();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;
    let uptime_str = format!("{}h {}m {}s", hours, minutes, seconds);

    let (model, summary, table) = {
        let monitor = state.monitor.read().await;
        let system = monitor.system();
        (
            escape_html(&system.info.model_name),
            render_summary_html(system),
            render_table_html(&monitor.rows(Some(state.config.top_n())), monitor.sort_key()),
        )
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta http-equiv="refresh" content="5">
    <title>Herakles Top</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 0;
            padding: 20px;
            background: #f5f5f5;
            line-height: 1.6;
        }}
        .container {{
            max-width: 1100px;
            margin: 0 auto;
            background: white;
            padding: 40px;
            border-radius: 8px;
            box-shadow: 0 2px 8px rgba(0,0,0,0.1);
        }}
        h1 {{
            color: #333;
            border-bottom: 3px solid #007bff;
            padding-bottom: 15px;
            margin-bottom: 10px;
        }}
        .subtitle {{ color: #666; font-size: 1.1em; margin-bottom: 30px; }}
        .info {{
            background: #e9ecef;
            padding: 15px;
            border-radius: 4px;
            margin: 20px 0;
            display: flex;
            justify-content: space-around;
            flex-wrap: wrap;
        }}
        .info-item {{ margin: 10px; }}
        .info-label {{ font-weight: 600; color: #555; display: block; font-size: 0.9em; }}
        .info-value {{ font-size: 1.2em; color: #007bff; }}
        table {{ width: 100%; border-collapse: collapse; font-family: 'Courier New', monospace; }}
        th {{ background: #343a40; color: white; padding: 6px 10px; }}
        td {{ padding: 4px 10px; border-bottom: 1px solid #eee; }}
        .endpoint-list {{ list-style: none; padding: 0; }}
        .endpoint-list li {{ margin: 8px 0; }}
        .endpoint-list a {{ color: #007bff; text-decoration: none; font-weight: 600; }}
        .footer {{
            margin-top: 40px;
            padding-top: 20px;
            border-top: 1px solid #ddd;
            color: #666;
            font-size: 0.9em;
            text-align: center;
        }}
    </style>
</head>
<body>
<div class="container">
    <h1>Herakles Top</h1>
    <p class="subtitle">{model}</p>

    <div class="info">
        <div class="info-item">
            <span class="info-label">Version</span>
            <span class="info-value">{version}</span>
        </div>
        <div class="info-item">
            <span class="info-label">Service uptime</span>
            <span class="info-value">{uptime}</span>
        </div>
        {summary}
    </div>

    {table}

    <h2>Endpoints</h2>
    <ul class="endpoint-list">
        <li><a href="/processes">/processes</a> sorted process table (JSON, <code>?limit=N</code>)</li>
        <li><a href="/processes.txt">/processes.txt</a> system summary and process table (text)</li>
        <li><a href="/system">/system</a> system summary (JSON)</li>
        <li><a href="/health">/health</a> refresh loop health (text)</li>
        <li><code>POST /sort</code> change sort column and order</li>
        <li><code>POST /processes/{{pid}}/kill</code> request process termination</li>
    </ul>

    <div class="footer">
        <p>{footer}</p>
    </div>
</div>
</body>
</html>"#,
        model = model,
        version = version,
        uptime = uptime_str,
        summary = summary,
        table = table,
        footer = FOOTER_TEXT
    );

    Html(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a & \"b\">"), "&lt;a &amp; &quot;b&quot;&gt;");
    }

    #[test]
    fn test_table_html_colours_hot_cells() {
        let row = ProcessRow {
            pid: 1,
            name: "busy".into(),
            cpu_percent: 99.0,
            memory_kb: 0,
            disk_mb_per_sec: 0.0,
            network_mbps: 0.0,
            cells: vec![
                "busy".into(),
                "1".into(),
                "99.0 %".into(),
                "0 KB".into(),
                "0.0 MB/s".into(),
                "0.0 Mbps".into(),
            ],
            heat: vec![0, 0, 4, 0, 0, 0],
        };
        let html = render_table_html(&[row], None);
        assert!(html.contains("background:#ff4444\">99.0 %"));
        assert!(html.contains("<th>Process Name</th>"));
    }
}
