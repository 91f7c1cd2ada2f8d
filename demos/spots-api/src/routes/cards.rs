use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use spots::queries::CardSearch;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "first_page")]
    pub page: u32,
}

fn first_page() -> u32 {
    1
}

/// GET /api/cards/search?q=bolt&page=1
///
/// Free-text catalog search. Upstream failures yield an empty page.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, AppError> {
    if params.q.trim().is_empty() {
        return Err(AppError::bad_request("Query parameter 'q' is required"));
    }
    let page = state
        .spots
        .run(move |s| Ok(s.search_cards(&params.q, params.page.max(1))))
        .await?;
    Ok(Json(json!({ "data": page })))
}

#[derive(Deserialize)]
pub struct AutocompleteParams {
    #[serde(default)]
    pub q: String,
}

/// GET /api/cards/autocomplete?q=light
pub async fn autocomplete(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AutocompleteParams>,
) -> Result<Json<Value>, AppError> {
    let names = state
        .spots
        .run(move |s| Ok(s.autocomplete(&params.q)))
        .await?;
    Ok(Json(json!({ "data": names })))
}

#[derive(Deserialize)]
pub struct BrowseParams {
    pub name: Option<String>,
    pub set: Option<String>,
    pub rarity: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// GET /api/cards/local?name=goblin&set=mh3&rarity=rare&limit=50&offset=0
///
/// Browse cards already mirrored locally. No catalog request is made.
pub async fn browse_local(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<Value>, AppError> {
    let search = CardSearch {
        name: params.name,
        set_code: params.set,
        rarity: params.rarity,
        limit: params.limit,
        offset: params.offset,
    };
    let cards = state.spots.run(move |s| s.browse_cards(&search)).await?;
    let count = cards.len();
    Ok(Json(json!({ "data": cards, "count": count })))
}
