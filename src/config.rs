use std::path::PathBuf;
use std::time::Duration;

pub const SCRYFALL_API: &str = "https://api.scryfall.com";
pub const USER_AGENT: &str = concat!("spots/", env!("CARGO_PKG_VERSION"));

/// Minimum spacing between two outbound catalog requests.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(75);
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// How long the scheduler sleeps between due-checks when nobody triggers it.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const ERROR_COOLDOWN: Duration = Duration::from_secs(5 * 60);

pub const DEFAULT_RECENT_MONTHS: u32 = 3;

pub const DATABASE_FILE: &str = "spots.duckdb";

/// Set types that hold collectible paper cards. Everything else (tokens,
/// memorabilia, alchemy, ...) is skipped by the recent-set sync.
pub fn collectible_set_types() -> &'static [&'static str] {
    &["core", "expansion", "draft_innovation", "masters", "commander"]
}

/// Set types offered when browsing the catalog. Adds un-sets on top of the
/// collectible types.
pub fn browsable_set_types() -> &'static [&'static str] {
    &[
        "core",
        "expansion",
        "draft_innovation",
        "masters",
        "commander",
        "funny",
    ]
}

pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("spots")
    } else {
        PathBuf::from(".spots-data")
    }
}
