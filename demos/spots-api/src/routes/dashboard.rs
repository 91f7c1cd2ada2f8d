use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/dashboard
///
/// Collection totals, tracker progress and the two rankings.
pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let dashboard = state.spots.run(|s| s.get_dashboard()).await?;
    Ok(Json(json!({ "data": dashboard })))
}
