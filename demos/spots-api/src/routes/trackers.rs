use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Value};
use spots::models::{MemberRef, NewTracker, TrackerUpdate};

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/trackers
///
/// Every tracker, pinned ones first.
pub async fn list_trackers(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let trackers = state.spots.run(|s| s.list_trackers()).await?;
    let count = trackers.len();
    Ok(Json(json!({ "data": trackers, "count": count })))
}

/// POST /api/trackers
///
/// Body: `{"name": "...", "set_code": "mh3", "track_foil": false}`. A
/// tracker with a set code gets every card of the set as members.
pub async fn create_tracker(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewTracker>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let tracker = state.spots.run(move |s| s.create_tracker(&new)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": tracker }))))
}

/// GET /api/trackers/:id
///
/// The tracker, its progress and per-member ownership.
pub async fn get_tracker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let detail = state.spots.run(move |s| s.get_tracker_detail(id)).await?;
    Ok(Json(json!({ "data": detail })))
}

/// PUT /api/trackers/:id
pub async fn update_tracker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<TrackerUpdate>,
) -> Result<Json<Value>, AppError> {
    let tracker = state.spots.run(move |s| s.update_tracker(id, &update)).await?;
    Ok(Json(json!({ "data": tracker })))
}

/// DELETE /api/trackers/:id
pub async fn delete_tracker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.spots.run(move |s| s.delete_tracker(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/trackers/:id/export
///
/// Missing cards as plain-text deck-list lines.
pub async fn export_missing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<String, AppError> {
    Ok(state.spots.run(move |s| s.export_missing(id)).await?)
}

/// POST /api/trackers/:id/cards
///
/// Body: `{"card_id": 12}` or `{"external_id": "<catalog id>"}`.
pub async fn add_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(card): Json<MemberRef>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let member = state
        .spots
        .run(move |s| s.add_tracker_member(id, &card))
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": member }))))
}

/// DELETE /api/trackers/:id/cards/:card_id
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    Path((id, card_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    state
        .spots
        .run(move |s| s.remove_tracker_member(id, card_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/trackers/:id/cards/:card_id/exclude
///
/// Flip the member's exclusion flag.
pub async fn toggle_exclude(
    State(state): State<Arc<AppState>>,
    Path((id, card_id)): Path<(i64, i64)>,
) -> Result<Json<Value>, AppError> {
    let member = state
        .spots
        .run(move |s| s.toggle_member_exclusion(id, card_id))
        .await?;
    Ok(Json(json!({ "data": member })))
}
