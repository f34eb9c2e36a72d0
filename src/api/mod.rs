//! REST API server for vigil.
//!
//! Provides HTTP endpoints for:
//! - Monitoring control (start, stop, status)
//! - The recordings collection (list, delete, cloud save, analyze)
//! - Detection settings

pub mod error;
pub mod routes;

use crate::config::Config;
use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tracing::info;

pub use routes::monitor::{ApiCommand, MonitorApiState};
pub use routes::settings::SettingsApiState;

pub struct ApiServer {
    port: u16,
    monitor_state: MonitorApiState,
    settings_state: SettingsApiState,
    store: crate::store::RecordingStore,
}

impl ApiServer {
    pub fn new(
        tx: tokio::sync::mpsc::Sender<ApiCommand>,
        status: crate::monitor::MonitorStatusHandle,
        settings: crate::config::SettingsHandle,
        store: crate::store::RecordingStore,
        config: &Config,
    ) -> Self {
        Self {
            port: config.api.port,
            monitor_state: MonitorApiState {
                tx,
                status: status.clone(),
            },
            settings_state: SettingsApiState { settings, status },
            store,
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            .route("/", get(status))
            .route("/version", get(version))
            .nest("/monitor", routes::monitor::router(self.monitor_state))
            .nest("/recordings", routes::recordings::router(self.store))
            .nest("/settings", routes::settings::router(self.settings_state))
            .layer(ServiceBuilder::new());

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("API server listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  GET    /                        - Service info");
        info!("  GET    /version                 - Version info");
        info!("  POST   /monitor/start           - Start monitoring");
        info!("  POST   /monitor/stop            - Stop monitoring");
        info!("  GET    /monitor/status          - Monitoring status");
        info!("  GET    /recordings              - List recordings");
        info!("  DELETE /recordings/:id          - Delete a recording");
        info!("  POST   /recordings/:id/save     - Save a recording to the cloud");
        info!("  POST   /recordings/:id/analyze  - Analyze a recording");
        info!("  GET    /settings                - Current detection settings");
        info!("  PUT    /settings                - Update detection settings");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "vigil",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "vigil"
    }))
}
