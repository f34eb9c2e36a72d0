//! Recording collection endpoints.
//!
//! Save and analyze are fire-and-forget: the handler validates the id,
//! spawns the store operation, and returns immediately. Progress is
//! observable through the recording's `cloud_status` / `analyzing` fields
//! in the list endpoint.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::store::RecordingStore;

pub fn router(store: RecordingStore) -> Router {
    Router::new()
        .route("/", get(list_recordings))
        .route("/:id", delete(delete_recording))
        .route("/:id/save", post(save_recording))
        .route("/:id/analyze", post(analyze_recording))
        .with_state(store)
}

async fn list_recordings(State(store): State<RecordingStore>) -> Json<Value> {
    let recordings = store.list().await;
    Json(json!({
        "count": recordings.len(),
        "recordings": recordings,
    }))
}

async fn delete_recording(
    State(store): State<RecordingStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    store.delete(id).await?;
    Ok(Json(json!({ "deleted": id })))
}

async fn save_recording(
    State(store): State<RecordingStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    require_exists(&store, id).await?;

    tokio::spawn(async move {
        if let Err(e) = store.save_to_drive(id).await {
            error!("Cloud save request for {} failed: {}", id, e);
        }
    });

    Ok(Json(json!({ "accepted": true, "id": id })))
}

async fn analyze_recording(
    State(store): State<RecordingStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    require_exists(&store, id).await?;

    tokio::spawn(async move {
        if let Err(e) = store.analyze(id).await {
            error!("Analysis request for {} failed: {}", id, e);
        }
    });

    Ok(Json(json!({ "accepted": true, "id": id })))
}

async fn require_exists(store: &RecordingStore, id: Uuid) -> ApiResult<()> {
    if store.get(id).await.is_none() {
        return Err(ApiError::not_found(format!("No recording with id {id}")));
    }
    Ok(())
}
