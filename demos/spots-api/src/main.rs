mod error;
mod routes;
mod state;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use spots::{AsyncSpots, SchedulerConfig, Spots};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut builder = Spots::builder();
    if let Ok(path) = std::env::var("SPOTS_DB") {
        builder = builder.database_path(path);
    }
    let spots = AsyncSpots::open(builder)
        .await
        .expect("Failed to open the spots database");
    spots.start_scheduler(SchedulerConfig::default()).await;
    tracing::info!("Store ready, sync scheduler started");

    let state = Arc::new(AppState {
        spots: spots.clone(),
    });

    let app = Router::new()
        .route("/api/dashboard", get(routes::dashboard::get_dashboard))
        .route(
            "/api/trackers",
            get(routes::trackers::list_trackers).post(routes::trackers::create_tracker),
        )
        .route(
            "/api/trackers/{id}",
            get(routes::trackers::get_tracker)
                .put(routes::trackers::update_tracker)
                .delete(routes::trackers::delete_tracker),
        )
        .route("/api/trackers/{id}/export", get(routes::trackers::export_missing))
        .route("/api/trackers/{id}/cards", post(routes::trackers::add_member))
        .route(
            "/api/trackers/{id}/cards/{card_id}",
            delete(routes::trackers::remove_member),
        )
        .route(
            "/api/trackers/{id}/cards/{card_id}/exclude",
            post(routes::trackers::toggle_exclude),
        )
        .route("/api/sets", get(routes::sets::list_sets))
        .route("/api/sets/{code}", get(routes::sets::get_set))
        .route("/api/sets/{code}/cards", get(routes::sets::get_set_cards))
        .route("/api/cards/search", get(routes::cards::search))
        .route("/api/cards/autocomplete", get(routes::cards::autocomplete))
        .route("/api/cards/local", get(routes::cards::browse_local))
        .route(
            "/api/collection",
            get(routes::collection::list_collection).post(routes::collection::add_entry),
        )
        .route("/api/collection/reset", delete(routes::collection::reset))
        .route(
            "/api/collection/{id}",
            put(routes::collection::update_entry).delete(routes::collection::remove_entry),
        )
        .route(
            "/api/sync/status",
            get(routes::sync::get_status).post(routes::sync::trigger),
        )
        .route(
            "/api/sync/settings",
            get(routes::sync::get_settings).put(routes::sync::update_settings),
        )
        .route("/api/sync/import-set/{code}", post(routes::sync::import_set))
        .route("/api/sync/imports", get(routes::sync::list_imports))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = std::env::var("SPOTS_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .unwrap();

    if let Err(e) = spots.shutdown().await {
        tracing::warn!(error = %e, "Scheduler did not stop cleanly");
    }
}
