//! Settings endpoints.
//!
//! Settings are only mutable while monitoring is stopped; the engine
//! snapshots them at session start, so a mid-session update would silently
//! not apply. Updates are rejected with 409 instead.

use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{Config, MonitorSettings, SettingsHandle};
use crate::monitor::{MonitorPhase, MonitorStatusHandle};

#[derive(Clone)]
pub struct SettingsApiState {
    pub settings: SettingsHandle,
    pub status: MonitorStatusHandle,
}

pub fn router(state: SettingsApiState) -> Router {
    Router::new()
        .route("/", get(get_settings).put(put_settings))
        .with_state(state)
}

async fn get_settings(State(state): State<SettingsApiState>) -> Json<MonitorSettings> {
    Json(state.settings.get().await)
}

async fn put_settings(
    State(state): State<SettingsApiState>,
    Json(new_settings): Json<MonitorSettings>,
) -> ApiResult<Json<Value>> {
    let phase = state.status.get().await.phase;
    if matches!(
        phase,
        MonitorPhase::RequestingPermissions | MonitorPhase::Monitoring | MonitorPhase::Recording
    ) {
        return Err(ApiError::conflict(
            "Settings cannot change while monitoring is running. Stop monitoring first.",
        ));
    }

    let new_settings = new_settings.clamped();
    state.settings.set(new_settings).await;

    // Persist so the next service start picks the same values up.
    let mut config = Config::load()?;
    config.monitor = new_settings;
    config.save()?;

    info!("Settings updated: {:?}", new_settings);
    Ok(Json(json!({ "updated": true, "settings": new_settings })))
}
