/// Shared application state available to all route handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// Async facade over the store and catalog. Owns the background sync
    /// scheduler and dispatches blocking work to the thread pool.
    pub spots: spots::AsyncSpots,
}
