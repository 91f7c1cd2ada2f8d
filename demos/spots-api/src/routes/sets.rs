use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/sets
///
/// Browsable paper sets from the catalog, newest first.
pub async fn list_sets(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let sets = state.spots.run(|s| s.list_sets()).await?;
    let count = sets.len();
    Ok(Json(json!({ "data": sets, "count": count })))
}

/// GET /api/sets/:code
pub async fn get_set(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Value>, AppError> {
    let set = state.spots.run(move |s| s.get_set(&code)).await?;
    Ok(Json(json!({ "data": set })))
}

/// GET /api/sets/:code/cards
///
/// Local cards of a set in collector-number order. The set is imported on
/// the first request.
pub async fn get_set_cards(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Value>, AppError> {
    let (cards, import) = state
        .spots
        .run(move |s| {
            let cards = s.set_cards(&code)?;
            let import = s.set_import(&code)?;
            Ok((cards, import))
        })
        .await?;
    let count = cards.len();
    Ok(Json(json!({ "data": cards, "count": count, "import": import })))
}
