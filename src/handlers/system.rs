//! System summary endpoint handler.

use axum::{extract::State, response::IntoResponse, Json};
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the /system endpoint.
#[instrument(skip(state))]
pub async fn system_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /system request");
    let monitor = state.monitor.read().await;
    Json(monitor.system().clone())
}
