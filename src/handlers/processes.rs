//! Process table endpoint handlers.
//!
//! The table is read from the monitor under its read lock, so a response
//! never mixes rows from two refresh cycles.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use herakles_top::{Column, KillRequest, ProcessRow, SortKey, SortOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::handlers::health::FOOTER_TEXT;
use crate::render::{render_process_table, render_system_summary};
use crate::state::SharedState;

/// Query parameters for the process table endpoints.
#[derive(Deserialize, Debug, Default)]
pub struct TableQuery {
    /// Maximum number of rows; all rows when absent.
    pub limit: Option<usize>,
}

/// JSON body of `GET /processes`.
#[derive(Serialize, Debug)]
pub struct ProcessesResponse {
    pub version: u64,
    pub sort: Option<SortKey>,
    pub total: usize,
    pub rows: Vec<ProcessRow>,
}

/// JSON body of `POST /sort`.
#[derive(Deserialize, Debug)]
pub struct SortRequest {
    pub column: Column,
    #[serde(default)]
    pub order: SortOrder,
}

/// JSON body answering a kill request.
#[derive(Serialize, Debug)]
pub struct KillResponse {
    pub pid: u32,
    pub result: KillRequest,
}

/// Handler for `GET /processes`.
#[instrument(skip(state))]
pub async fn processes_handler(
    State(state): State<SharedState>,
    Query(params): Query<TableQuery>,
) -> impl IntoResponse {
    debug!("Processing /processes request");
    let monitor = state.monitor.read().await;
    Json(ProcessesResponse {
        version: monitor.version(),
        sort: monitor.sort_key(),
        total: monitor.processes().len(),
        rows: monitor.rows(params.limit),
    })
}

/// Handler for `GET /processes.txt`.
#[instrument(skip(state))]
pub async fn processes_text_handler(
    State(state): State<SharedState>,
    Query(params): Query<TableQuery>,
) -> impl IntoResponse {
    debug!("Processing /processes.txt request");
    let limit = params.limit.unwrap_or_else(|| state.config.top_n());

    let body = {
        let monitor = state.monitor.read().await;
        format!(
            "{}\n{}\n{}",
            render_system_summary(monitor.system()),
            render_process_table(&monitor.rows(Some(limit)), monitor.sort_key()),
            FOOTER_TEXT
        )
    };

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        body,
    )
}

/// Handler for `POST /sort`. Reorders immediately; later refreshes keep
/// the new key.
#[instrument(skip(state))]
pub async fn sort_handler(
    State(state): State<SharedState>,
    Json(request): Json<SortRequest>,
) -> impl IntoResponse {
    debug!("Processing /sort request");
    let mut monitor = state.monitor.write().await;
    monitor.set_sort(request.column, request.order);
    info!("Sort changed to {} {}", request.column, request.order);
    Json(monitor.sort_key())
}

/// Handler for `POST /processes/{pid}/kill`.
///
/// Always answers 202: the request is fire-and-forget and the process
/// disappears from the table on a later refresh, if at all.
#[instrument(skip(state))]
pub async fn kill_handler(
    State(state): State<SharedState>,
    Path(pid): Path<u32>,
) -> impl IntoResponse {
    debug!("Processing kill request for pid {}", pid);
    let result = state.monitor.write().await.kill_process(pid);
    (StatusCode::ACCEPTED, Json(KillResponse { pid, result }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::{AppState, DynSource};
    use axum::body::to_bytes;
    use herakles_top::{Monitor, MonitorOptions, ProcessCounters, ScriptedSource};

    fn counters(cpu_ticks: u64, rss: u64) -> ProcessCounters {
        ProcessCounters {
            cpu_ticks,
            resident_bytes: rss,
            ..ProcessCounters::default()
        }
    }

    async fn state() -> SharedState {
        let mut source = ScriptedSource::with_clock(100.0, 1);
        source.upsert_process(10, "alpha", counters(0, 4096));
        source.upsert_process(20, "beta", counters(0, 8192));
        source.upsert_process(30, "gamma", counters(0, 1024));
        let mut monitor = Monitor::new(Box::new(source) as DynSource, MonitorOptions::default());
        monitor.refresh();
        let (state, _tx) = AppState::new(monitor, Config::default());
        state
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_sort_then_list() {
        let state = state().await;

        let response = sort_handler(
            State(state.clone()),
            Json(SortRequest {
                column: Column::Memory,
                order: SortOrder::Descending,
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = processes_handler(State(state), Query(TableQuery { limit: Some(2) }))
            .await
            .into_response();
        let json = body_json(response).await;
        assert_eq!(json["total"], 3);
        assert_eq!(json["sort"]["column"], "memory");
        let pids: Vec<u64> = json["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["pid"].as_u64().unwrap())
            .collect();
        assert_eq!(pids, vec![20, 10]);
    }

    #[tokio::test]
    async fn test_kill_is_accepted_for_tracked_and_unknown_pids() {
        let state = state().await;

        let response = kill_handler(State(state.clone()), Path(20)).await.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(response).await["result"], "sent");

        let response = kill_handler(State(state), Path(999)).await.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(response).await["result"], "ignored");
    }

    #[tokio::test]
    async fn test_text_table_contains_rows() {
        let state = state().await;
        let response = processes_text_handler(State(state), Query(TableQuery::default()))
            .await
            .into_response();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("Process Name"));
        assert!(text.contains("gamma"));
    }
}
