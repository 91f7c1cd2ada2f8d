//! The singleton sync-state row (id = 1).

use chrono::{DateTime, Utc};

use crate::error::{Result, SpotsError};
use crate::models::{SyncConfigUpdate, SyncState};
use crate::store::{timestamp, Store};

const STATE_COLUMNS: &str = "card_schedule, price_schedule, recent_months, last_card_sync, \
     last_price_sync, is_syncing, status";

/// Query interface for the sync schedule and status.
///
/// Only the scheduler calls the `mark_*`/`finish_*`/`fail` writers;
/// [`update_config`](Self::update_config) touches the schedule fields alone.
pub struct SyncStateQuery<'a> {
    store: &'a Store,
}

impl<'a> SyncStateQuery<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Result<SyncState> {
        self.store
            .query_one(
                &format!("SELECT {} FROM sync_state WHERE id = 1", STATE_COLUMNS),
                &[],
            )?
            .ok_or_else(|| SpotsError::NotFound("Sync state".into()))
    }

    pub fn update_config(&self, update: &SyncConfigUpdate) -> Result<SyncState> {
        if update.recent_months == Some(0) {
            return Err(SpotsError::InvalidArgument(
                "recent_months must be at least 1".into(),
            ));
        }
        let card_schedule = update.card_schedule.map(|s| s.as_str());
        let price_schedule = update.price_schedule.map(|s| s.as_str());
        let recent_months = update.recent_months.map(i64::from);

        self.store.run(
            "UPDATE sync_state SET \
                card_schedule = COALESCE(?, card_schedule), \
                price_schedule = COALESCE(?, price_schedule), \
                recent_months = COALESCE(CAST(? AS INTEGER), recent_months) \
             WHERE id = 1",
            &[&card_schedule, &price_schedule, &recent_months],
        )?;
        self.load()
    }

    pub fn mark_syncing(&self, status: &str) -> Result<()> {
        self.store.run(
            "UPDATE sync_state SET is_syncing = true, status = ? WHERE id = 1",
            &[&status],
        )?;
        Ok(())
    }

    /// Stamp a finished card sync. `status` carries any issues worth showing.
    pub fn finish_card_sync(&self, at: DateTime<Utc>, status: Option<&str>) -> Result<()> {
        self.store.run(
            "UPDATE sync_state SET is_syncing = false, last_card_sync = ?, status = ? WHERE id = 1",
            &[&timestamp(at), &status],
        )?;
        Ok(())
    }

    pub fn finish_price_sync(&self, at: DateTime<Utc>, status: Option<&str>) -> Result<()> {
        self.store.run(
            "UPDATE sync_state SET is_syncing = false, last_price_sync = ?, status = ? WHERE id = 1",
            &[&timestamp(at), &status],
        )?;
        Ok(())
    }

    /// Clear the syncing flag after an error, keeping the message as status.
    pub fn fail(&self, message: &str) -> Result<()> {
        self.store.run(
            "UPDATE sync_state SET is_syncing = false, status = ? WHERE id = 1",
            &[&message],
        )?;
        Ok(())
    }

    /// Clear a syncing flag left behind by a process that died mid-sync.
    /// Returns `true` when a stale flag was found.
    pub fn clear_stale(&self) -> Result<bool> {
        let cleared = self.store.run(
            "UPDATE sync_state SET is_syncing = false, status = NULL WHERE id = 1 AND is_syncing",
            &[],
        )?;
        Ok(cleared > 0)
    }
}
