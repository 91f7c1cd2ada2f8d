use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Value};
use spots::models::SyncConfigUpdate;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/sync/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let status = state.spots.get_sync_status().await?;
    Ok(Json(json!({ "data": status })))
}

/// POST /api/sync/status
///
/// Wake the scheduler. Answers 409 while a sync is already running.
pub async fn trigger(State(state): State<Arc<AppState>>) -> Result<(StatusCode, Json<Value>), AppError> {
    if state.spots.trigger_manual_sync().await? {
        Ok((StatusCode::ACCEPTED, Json(json!({ "triggered": true }))))
    } else {
        Ok((StatusCode::CONFLICT, Json(json!({ "triggered": false }))))
    }
}

/// GET /api/sync/settings
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let config = state.spots.run(|s| s.get_sync_config()).await?;
    Ok(Json(json!({ "data": config })))
}

/// PUT /api/sync/settings
///
/// Body: any of `card_schedule`, `price_schedule` (`daily` / `weekly` /
/// `manual`) and `recent_months`.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SyncConfigUpdate>,
) -> Result<Json<Value>, AppError> {
    let config = state
        .spots
        .run(move |s| s.update_sync_config(&update))
        .await?;
    // Re-evaluate what is due under the new schedule.
    if let Err(e) = state.spots.trigger_manual_sync().await {
        tracing::warn!(error = %e, "Could not wake the sync scheduler");
    }
    Ok(Json(json!({ "data": config })))
}

/// POST /api/sync/import-set/:code
///
/// Import one set right away, outside the schedule.
pub async fn import_set(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Value>, AppError> {
    let report = state.spots.run(move |s| s.import_set(&code)).await?;
    Ok(Json(json!({ "data": report })))
}

/// GET /api/sync/imports
///
/// Import records of every mirrored set.
pub async fn list_imports(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let imports = state.spots.run(|s| s.list_set_imports()).await?;
    let count = imports.len();
    Ok(Json(json!({ "data": imports, "count": count })))
}
