//! Monitoring control endpoints.
//!
//! Start/stop are forwarded to the service loop that owns the
//! `MonitorMachine`; handlers reply immediately and clients observe the
//! outcome (including media-access failures) through `/monitor/status`.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::monitor::MonitorStatusHandle;

#[derive(Clone)]
pub enum ApiCommand {
    StartMonitoring,
    StopMonitoring,
}

#[derive(Clone)]
pub struct MonitorApiState {
    pub tx: mpsc::Sender<ApiCommand>,
    pub status: MonitorStatusHandle,
}

pub fn router(state: MonitorApiState) -> Router {
    Router::new()
        .route("/start", post(start_monitoring))
        .route("/stop", post(stop_monitoring))
        .route("/status", get(monitor_status))
        .with_state(state)
}

async fn start_monitoring(
    State(state): State<MonitorApiState>,
) -> Result<Json<Value>, StatusCode> {
    info!("Start monitoring command received via API");
    send_command(&state, ApiCommand::StartMonitoring).await
}

async fn stop_monitoring(State(state): State<MonitorApiState>) -> Result<Json<Value>, StatusCode> {
    info!("Stop monitoring command received via API");
    send_command(&state, ApiCommand::StopMonitoring).await
}

async fn send_command(
    state: &MonitorApiState,
    command: ApiCommand,
) -> Result<Json<Value>, StatusCode> {
    match state.tx.send(command).await {
        Ok(_) => Ok(Json(json!({ "accepted": true }))),
        Err(e) => {
            error!("Failed to forward monitor command: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

async fn monitor_status(State(state): State<MonitorApiState>) -> Json<Value> {
    let status = state.status.get().await;
    Json(json!({
        "phase": status.phase.as_str(),
        "message": status.phase.message(),
        "uptime_seconds": status.uptime_seconds(),
        "settings": status.settings,
        "last_trigger": status.last_trigger,
        "last_error": status.last_error,
    }))
}
