//! Card collection tracker core.
//!
//! Mirrors card and price data from a Scryfall-compatible catalog into a
//! local DuckDB store, keeps an inventory of owned physical copies, and
//! computes completion progress for "trackers" (set or hand-picked card
//! goals).
//!
//! # Quick start
//!
//! ```no_run
//! use spots::models::NewTracker;
//! use spots::Spots;
//!
//! let spots = Spots::builder().build().unwrap();
//!
//! // Mirror a set and track it
//! let report = spots.import_set("mh3").unwrap();
//! let tracker = spots.create_tracker(&NewTracker::for_set("Modern Horizons 3", "mh3")).unwrap();
//!
//! let detail = spots.get_tracker_detail(tracker.id).unwrap();
//! println!("{} cards, {}% done", report.fetched, detail.progress.completion_percentage);
//! ```

pub mod async_client;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod progress;
pub mod queries;
pub mod reconcile;
pub mod scheduler;
pub mod sql_builder;
pub mod store;

pub use async_client::AsyncSpots;
pub use catalog::{CatalogSource, RateLimiter, ScryfallClient};
pub use error::{Result, SpotsError};
pub use reconcile::Reconciler;
pub use scheduler::{SchedulerConfig, SchedulerHandle, SyncScheduler};
pub use sql_builder::SqlBuilder;
pub use store::Store;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use models::{
    CatalogCard, CollectionCard, Dashboard, ImportReport, InventoryEntry, InventoryFilter,
    InventoryUpdate, MemberRef, NewInventoryEntry, NewTracker, PriceHistory, SearchPage, SetImport,
    SetSummary, SyncConfigUpdate, SyncState, SyncStatus, Tracker, TrackerDetail, TrackerMember,
    TrackerUpdate,
};
use progress::OwnershipIndex;

// ---------------------------------------------------------------------------
// SpotsBuilder
// ---------------------------------------------------------------------------

enum DatabaseLocation {
    Default,
    Path(PathBuf),
    InMemory,
}

/// Builder for configuring and constructing a [`Spots`] instance.
///
/// Use [`Spots::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](SpotsBuilder::build).
pub struct SpotsBuilder {
    database: DatabaseLocation,
    catalog_base_url: Option<String>,
    timeout: Duration,
    min_request_interval: Duration,
    price_history: PriceHistory,
    catalog: Option<Arc<dyn CatalogSource>>,
}

impl Default for SpotsBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseLocation::Default,
            catalog_base_url: None,
            timeout: config::HTTP_TIMEOUT,
            min_request_interval: config::MIN_REQUEST_INTERVAL,
            price_history: PriceHistory::default(),
            catalog: None,
        }
    }
}

impl SpotsBuilder {
    /// Store the database in this file.
    ///
    /// If not set, `spots.duckdb` in the platform data directory is used
    /// (e.g. `~/.local/share/spots` on Linux).
    pub fn database_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.database = DatabaseLocation::Path(path.as_ref().to_path_buf());
        self
    }

    /// Keep everything in memory; nothing survives the process.
    pub fn in_memory(mut self) -> Self {
        self.database = DatabaseLocation::InMemory;
        self
    }

    /// API root of the catalog service. Defaults to the public Scryfall API.
    pub fn catalog_base_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_base_url = Some(url.into());
        self
    }

    /// HTTP request timeout for catalog calls. Defaults to 60 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Minimum spacing between catalog requests. Defaults to 75 ms.
    pub fn min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }

    /// What a re-import does to existing price snapshots.
    pub fn price_history(mut self, policy: PriceHistory) -> Self {
        self.price_history = policy;
        self
    }

    /// Use a custom catalog instead of the HTTP client. The URL, timeout and
    /// interval settings are ignored.
    pub fn catalog(mut self, catalog: Arc<dyn CatalogSource>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Open the store (applying the schema) and set up the catalog client.
    ///
    /// No network request is made here; the HTTP client is created on first
    /// use.
    pub fn build(self) -> Result<Spots> {
        let store = match self.database {
            DatabaseLocation::InMemory => Store::open_in_memory()?,
            DatabaseLocation::Path(path) => Store::open(path)?,
            DatabaseLocation::Default => {
                Store::open(config::default_data_dir().join(config::DATABASE_FILE))?
            }
        };

        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => {
                let mut client = ScryfallClient::new()
                    .timeout(self.timeout)
                    .rate_limiter(Arc::new(RateLimiter::new(self.min_request_interval)));
                if let Some(url) = self.catalog_base_url {
                    client = client.base_url(url);
                }
                Arc::new(client)
            }
        };

        Ok(Spots {
            store,
            catalog,
            price_history: self.price_history,
        })
    }
}

// ---------------------------------------------------------------------------
// Spots
// ---------------------------------------------------------------------------

/// The main entry point: local store plus catalog access.
///
/// Exposes table-level query interfaces as lightweight borrowing wrappers
/// (`cards()`, `trackers()`, ...) and the application operations on top of
/// them. `Spots` is `Send + Sync` and is shared with the background
/// scheduler behind an `Arc`.
pub struct Spots {
    store: Store,
    catalog: Arc<dyn CatalogSource>,
    price_history: PriceHistory,
}

impl Spots {
    /// Create a new builder for configuring the instance.
    pub fn builder() -> SpotsBuilder {
        SpotsBuilder::default()
    }

    // -- Query accessors ---------------------------------------------------

    pub fn cards(&self) -> queries::CardQuery<'_> {
        queries::CardQuery::new(&self.store)
    }

    pub fn prices(&self) -> queries::PriceQuery<'_> {
        queries::PriceQuery::new(&self.store)
    }

    pub fn inventory(&self) -> queries::InventoryQuery<'_> {
        queries::InventoryQuery::new(&self.store)
    }

    pub fn trackers(&self) -> queries::TrackerQuery<'_> {
        queries::TrackerQuery::new(&self.store)
    }

    /// Sync schedule and status. The status writers belong to the scheduler.
    pub fn sync_state(&self) -> queries::SyncStateQuery<'_> {
        queries::SyncStateQuery::new(&self.store)
    }

    pub fn set_imports(&self) -> queries::SetImportQuery<'_> {
        queries::SetImportQuery::new(&self.store)
    }

    /// A reconciler over this instance's store and catalog.
    pub fn reconciler(&self) -> Reconciler<'_, dyn CatalogSource> {
        Reconciler::new(&self.store, self.catalog.as_ref()).price_history(self.price_history)
    }

    pub fn catalog(&self) -> &dyn CatalogSource {
        self.catalog.as_ref()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // -- Dashboard and progress --------------------------------------------

    /// Collection totals, progress of every collecting tracker that has
    /// non-excluded members, and the near-complete and most-valuable
    /// rankings.
    pub fn get_dashboard(&self) -> Result<Dashboard> {
        let entries = self.inventory().all()?;
        let prices = self.prices().latest_all()?;
        let owned_cards = self.cards().owned()?;
        let owned = OwnershipIndex::from_entries(&entries);
        let mut members = self.trackers().members_by_tracker()?;

        let tracker_progress: Vec<_> = self
            .trackers()
            .list()?
            .into_iter()
            .filter(|t| t.is_collecting)
            .filter_map(|t| {
                let members = members.remove(&t.id)?;
                if members.iter().all(|m| m.is_excluded) {
                    return None;
                }
                Some(progress::tracker_progress(&t, &members, &owned))
            })
            .collect();

        Ok(Dashboard {
            totals: progress::dashboard_totals(&entries, &prices),
            near_complete: progress::near_complete(&tracker_progress, progress::DEFAULT_RANKING_LIMIT),
            top_valuable: progress::top_valuable(
                &entries,
                &prices,
                &owned_cards,
                progress::DEFAULT_RANKING_LIMIT,
            ),
            tracker_progress,
        })
    }

    /// A tracker with its progress and the ownership of every member.
    pub fn get_tracker_detail(&self, tracker_id: i64) -> Result<TrackerDetail> {
        let tracker = self.trackers().require(tracker_id)?;
        let members = self.trackers().members(tracker_id)?;
        let cards = self.cards().for_tracker(tracker_id)?;
        let owned = OwnershipIndex::from_entries(&self.inventory().all()?);

        Ok(TrackerDetail {
            progress: progress::tracker_progress(&tracker, &members, &owned),
            members: progress::member_status(&members, &cards, &owned),
            tracker,
        })
    }

    /// Missing non-foil cards of a tracker as deck-list lines.
    pub fn export_missing(&self, tracker_id: i64) -> Result<String> {
        let detail = self.get_tracker_detail(tracker_id)?;
        Ok(progress::missing_list(&detail.members))
    }

    // -- Catalog -----------------------------------------------------------

    pub fn import_set(&self, set_code: &str) -> Result<ImportReport> {
        self.reconciler().import_set(set_code)
    }

    /// Browsable paper sets, newest first.
    pub fn list_sets(&self) -> Result<Vec<SetSummary>> {
        let browsable = config::browsable_set_types();
        let mut sets: Vec<SetSummary> = self
            .catalog
            .list_sets()?
            .into_iter()
            .filter(|s| !s.digital && browsable.contains(&s.set_type.as_str()))
            .collect();
        sets.sort_by(|a, b| b.released_at.cmp(&a.released_at).then_with(|| a.name.cmp(&b.name)));
        Ok(sets)
    }

    pub fn get_set(&self, set_code: &str) -> Result<SetSummary> {
        let code = reconcile::normalize_set_code(set_code)?;
        self.catalog.get_set(&code)
    }

    /// Local cards of a set in collector-number order, importing the set
    /// first when nothing of it is local yet.
    pub fn set_cards(&self, set_code: &str) -> Result<Vec<CatalogCard>> {
        let code = reconcile::normalize_set_code(set_code)?;
        if self.cards().count_in_set(&code)? == 0 {
            self.import_set(&code)?;
        }
        self.cards().by_set(&code)
    }

    pub fn search_cards(&self, query: &str, page: u32) -> SearchPage {
        self.catalog.search_cards(query, page)
    }

    pub fn autocomplete(&self, query: &str) -> Vec<String> {
        if query.trim().len() < 2 {
            return Vec::new();
        }
        self.catalog.autocomplete(query)
    }

    /// Filtered, paged listing of the local catalog, ordered by name.
    pub fn browse_cards(&self, search: &queries::CardSearch) -> Result<Vec<CatalogCard>> {
        self.cards().search(search)
    }

    /// Import records of every set mirrored so far, by set code.
    pub fn list_set_imports(&self) -> Result<Vec<SetImport>> {
        self.set_imports().list()
    }

    pub fn set_import(&self, set_code: &str) -> Result<Option<SetImport>> {
        let code = reconcile::normalize_set_code(set_code)?;
        self.set_imports().get(&code)
    }

    /// Wipe the local catalog along with everything that references it:
    /// prices, inventory, tracker members and import records. Trackers and
    /// sync settings are kept.
    pub fn reset_catalog(&self) -> Result<()> {
        self.store.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute_batch(
                "DELETE FROM tracker_members;
                 DELETE FROM inventory;
                 DELETE FROM price_snapshots;
                 DELETE FROM cards;
                 DELETE FROM set_imports;",
            )?;
            tx.commit()?;
            Ok(())
        })?;
        tracing::info!("Catalog reset");
        Ok(())
    }

    // -- Sync settings -----------------------------------------------------

    pub fn get_sync_status(&self) -> Result<SyncStatus> {
        Ok(self.sync_state().load()?.status_view())
    }

    pub fn get_sync_config(&self) -> Result<SyncState> {
        self.sync_state().load()
    }

    pub fn update_sync_config(&self, update: &SyncConfigUpdate) -> Result<SyncState> {
        self.sync_state().update_config(update)
    }

    // -- Trackers ----------------------------------------------------------

    /// Create a tracker. A set-bound tracker imports its set once and gets
    /// every local card of it as a member.
    pub fn create_tracker(&self, new: &NewTracker) -> Result<Tracker> {
        let tracker = self.trackers().create(new, Utc::now())?;
        if let Some(ref set_code) = tracker.set_code {
            let report = self.import_set(set_code)?;
            let added = self.trackers().add_set_members(tracker.id, set_code)?;
            tracing::info!(
                tracker = tracker.id,
                set = %set_code,
                members = added,
                complete = report.complete,
                "Created set tracker"
            );
        }
        Ok(tracker)
    }

    pub fn list_trackers(&self) -> Result<Vec<Tracker>> {
        self.trackers().list()
    }

    pub fn update_tracker(&self, tracker_id: i64, update: &TrackerUpdate) -> Result<Tracker> {
        self.trackers().update(tracker_id, update)
    }

    pub fn delete_tracker(&self, tracker_id: i64) -> Result<()> {
        self.trackers().delete(tracker_id)
    }

    /// Add a card to a tracker. A card named by catalog id that is not local
    /// yet is fetched, and its set imported, first.
    pub fn add_tracker_member(&self, tracker_id: i64, card: &MemberRef) -> Result<TrackerMember> {
        let card_id = match card {
            MemberRef::CardId(id) => *id,
            MemberRef::ExternalId(external_id) => self.local_card_id(external_id)?,
        };
        self.trackers().add_member(tracker_id, card_id)
    }

    fn local_card_id(&self, external_id: &str) -> Result<i64> {
        if let Some(card) = self.cards().get_by_external_id(external_id)? {
            return Ok(card.id);
        }
        let printing = self.catalog.get_card_by_id(external_id)?;
        self.import_set(&printing.set_code)?;
        if let Some(card) = self.cards().get_by_external_id(external_id)? {
            return Ok(card.id);
        }
        // The set import can stop early; store this printing on its own.
        Ok(self.cards().upsert(&printing, Utc::now())?.card_id)
    }

    pub fn remove_tracker_member(&self, tracker_id: i64, card_id: i64) -> Result<()> {
        self.trackers().remove_member(tracker_id, card_id)
    }

    pub fn toggle_member_exclusion(&self, tracker_id: i64, card_id: i64) -> Result<TrackerMember> {
        self.trackers().toggle_exclude(tracker_id, card_id)
    }

    // -- Inventory ---------------------------------------------------------

    pub fn add_inventory(&self, entry: &NewInventoryEntry) -> Result<InventoryEntry> {
        self.inventory().add(entry)
    }

    pub fn update_inventory(&self, entry_id: i64, update: &InventoryUpdate) -> Result<InventoryEntry> {
        self.inventory().update(entry_id, update)
    }

    pub fn remove_inventory(&self, entry_id: i64) -> Result<()> {
        self.inventory().remove(entry_id)
    }

    pub fn list_inventory(&self, filter: &InventoryFilter) -> Result<Vec<InventoryEntry>> {
        self.inventory().list(filter)
    }

    /// The owned collection grouped per card.
    pub fn collection(&self, filter: &InventoryFilter) -> Result<Vec<CollectionCard>> {
        self.inventory().grouped(filter)
    }

    pub fn reset_inventory(&self) -> Result<usize> {
        self.inventory().reset()
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Spots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.store.path() {
            Some(path) => write!(f, "Spots(database={})", path.display()),
            None => write!(f, "Spots(database=:memory:)"),
        }
    }
}
