use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Value};
use spots::models::{InventoryFilter, InventoryUpdate, NewInventoryEntry};

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/collection?set_code=mh3&for_trade=true
///
/// Owned cards grouped per card, with per-finish counts and latest prices.
pub async fn list_collection(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<InventoryFilter>,
) -> Result<Json<Value>, AppError> {
    let cards = state.spots.run(move |s| s.collection(&filter)).await?;
    let count = cards.len();
    Ok(Json(json!({ "data": cards, "count": count })))
}

/// POST /api/collection
///
/// Body: `{"card_id": 12, "is_foil": true}`. Adds one physical copy.
pub async fn add_entry(
    State(state): State<Arc<AppState>>,
    Json(entry): Json<NewInventoryEntry>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let entry = state.spots.run(move |s| s.add_inventory(&entry)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": entry }))))
}

/// PUT /api/collection/:id
///
/// A `location_id` of 0 clears the location.
pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<InventoryUpdate>,
) -> Result<Json<Value>, AppError> {
    let entry = state
        .spots
        .run(move |s| s.update_inventory(id, &update))
        .await?;
    Ok(Json(json!({ "data": entry })))
}

/// DELETE /api/collection/:id
pub async fn remove_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.spots.run(move |s| s.remove_inventory(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/collection/reset
pub async fn reset(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let removed = state.spots.run(|s| s.reset_inventory()).await?;
    Ok(Json(json!({ "removed": removed })))
}
