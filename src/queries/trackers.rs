//! Trackers and their card membership.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{Result, SpotsError};
use crate::models::{NewTracker, Tracker, TrackerMember, TrackerUpdate};
use crate::store::{query_rows, rows_into, timestamp, Store};

const TRACKER_COLUMNS: &str =
    "id, name, set_code, track_foil, track_non_foil, is_collecting, is_pinned, created_at";
const MEMBER_COLUMNS: &str = "id, tracker_id, card_id, is_excluded";

// ---------------------------------------------------------------------------
// TrackerQuery
// ---------------------------------------------------------------------------

/// Query interface for the `trackers` and `tracker_members` tables.
pub struct TrackerQuery<'a> {
    store: &'a Store,
}

impl<'a> TrackerQuery<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    // -- Trackers ----------------------------------------------------------

    /// Insert a tracker row. Set membership is populated separately.
    pub fn create(&self, new: &NewTracker, now: DateTime<Utc>) -> Result<Tracker> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(SpotsError::InvalidArgument("Tracker name must not be empty".into()));
        }
        let set_code = new
            .set_code
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty());
        let created_at = timestamp(now);

        let rows = self.store.query(
            &format!(
                "INSERT INTO trackers (name, set_code, track_foil, track_non_foil, is_collecting, \
                 is_pinned, created_at) VALUES (?, ?, ?, ?, true, false, ?) RETURNING {}",
                TRACKER_COLUMNS
            ),
            &[&name, &set_code, &new.track_foil, &new.track_non_foil, &created_at],
        )?;
        rows_into::<Tracker>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| SpotsError::Internal("Tracker insert returned no row".into()))
    }

    pub fn get(&self, id: i64) -> Result<Option<Tracker>> {
        self.store.query_one(
            &format!("SELECT {} FROM trackers WHERE id = ?", TRACKER_COLUMNS),
            &[&id],
        )
    }

    /// Like [`get`](Self::get) but a missing tracker is `NotFound`.
    pub fn require(&self, id: i64) -> Result<Tracker> {
        self.get(id)?
            .ok_or_else(|| SpotsError::NotFound(format!("Tracker {}", id)))
    }

    /// All trackers, pinned first, then by name.
    pub fn list(&self) -> Result<Vec<Tracker>> {
        self.store.query_into(
            &format!(
                "SELECT {} FROM trackers ORDER BY is_pinned DESC, name ASC, id ASC",
                TRACKER_COLUMNS
            ),
            &[],
        )
    }

    pub fn update(&self, id: i64, update: &TrackerUpdate) -> Result<Tracker> {
        let mut tracker = self.require(id)?;
        if let Some(ref name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(SpotsError::InvalidArgument("Tracker name must not be empty".into()));
            }
            tracker.name = name.to_string();
        }
        if let Some(track_foil) = update.track_foil {
            tracker.track_foil = track_foil;
        }
        if let Some(track_non_foil) = update.track_non_foil {
            tracker.track_non_foil = track_non_foil;
        }
        if let Some(is_collecting) = update.is_collecting {
            tracker.is_collecting = is_collecting;
        }
        if let Some(is_pinned) = update.is_pinned {
            tracker.is_pinned = is_pinned;
        }

        self.store.run(
            "UPDATE trackers SET name = ?, track_foil = ?, track_non_foil = ?, is_collecting = ?, \
             is_pinned = ? WHERE id = ?",
            &[
                &tracker.name,
                &tracker.track_foil,
                &tracker.track_non_foil,
                &tracker.is_collecting,
                &tracker.is_pinned,
                &id,
            ],
        )?;
        Ok(tracker)
    }

    /// Delete a tracker and its members.
    pub fn delete(&self, id: i64) -> Result<()> {
        self.store.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM tracker_members WHERE tracker_id = ?", duckdb::params![id])?;
            let removed = tx.execute("DELETE FROM trackers WHERE id = ?", duckdb::params![id])?;
            if removed == 0 {
                return Err(SpotsError::NotFound(format!("Tracker {}", id)));
            }
            tx.commit()?;
            Ok(())
        })
    }

    // -- Members -----------------------------------------------------------

    pub fn members(&self, tracker_id: i64) -> Result<Vec<TrackerMember>> {
        self.store.query_into(
            &format!(
                "SELECT {} FROM tracker_members WHERE tracker_id = ? ORDER BY id",
                MEMBER_COLUMNS
            ),
            &[&tracker_id],
        )
    }

    /// Members of every tracker, grouped by tracker id.
    pub fn members_by_tracker(&self) -> Result<HashMap<i64, Vec<TrackerMember>>> {
        let members: Vec<TrackerMember> = self.store.query_into(
            &format!("SELECT {} FROM tracker_members ORDER BY id", MEMBER_COLUMNS),
            &[],
        )?;
        let mut grouped: HashMap<i64, Vec<TrackerMember>> = HashMap::new();
        for member in members {
            grouped.entry(member.tracker_id).or_default().push(member);
        }
        Ok(grouped)
    }

    /// Add a local card to a tracker.
    ///
    /// Fails with `NotFound` for an unknown tracker or card and with
    /// `Conflict` when the card is already a member.
    pub fn add_member(&self, tracker_id: i64, card_id: i64) -> Result<TrackerMember> {
        let rows = self.store.with_conn(|conn| {
            let tx = conn.transaction()?;
            if query_rows(&tx, "SELECT id FROM trackers WHERE id = ?", &[&tracker_id])?.is_empty() {
                return Err(SpotsError::NotFound(format!("Tracker {}", tracker_id)));
            }
            if query_rows(&tx, "SELECT id FROM cards WHERE id = ?", &[&card_id])?.is_empty() {
                return Err(SpotsError::NotFound(format!("Card {}", card_id)));
            }
            let existing = query_rows(
                &tx,
                "SELECT id FROM tracker_members WHERE tracker_id = ? AND card_id = ?",
                &[&tracker_id, &card_id],
            )?;
            if !existing.is_empty() {
                return Err(SpotsError::Conflict(format!(
                    "Card {} is already in tracker {}",
                    card_id, tracker_id
                )));
            }
            let rows = query_rows(
                &tx,
                &format!(
                    "INSERT INTO tracker_members (tracker_id, card_id, is_excluded) \
                     VALUES (?, ?, false) RETURNING {}",
                    MEMBER_COLUMNS
                ),
                &[&tracker_id, &card_id],
            )?;
            tx.commit()?;
            Ok(rows)
        })?;
        rows_into::<TrackerMember>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| SpotsError::Internal("Member insert returned no row".into()))
    }

    /// Add every local card of a set that is not yet a member. Returns the
    /// number of members added.
    pub fn add_set_members(&self, tracker_id: i64, set_code: &str) -> Result<usize> {
        self.store.run(
            "INSERT INTO tracker_members (tracker_id, card_id, is_excluded) \
             SELECT ?, id, false FROM cards \
             WHERE set_code = ? \
               AND id NOT IN (SELECT card_id FROM tracker_members WHERE tracker_id = ?) \
             ORDER BY id",
            &[&tracker_id, &set_code, &tracker_id],
        )
    }

    pub fn remove_member(&self, tracker_id: i64, card_id: i64) -> Result<()> {
        let removed = self.store.run(
            "DELETE FROM tracker_members WHERE tracker_id = ? AND card_id = ?",
            &[&tracker_id, &card_id],
        )?;
        if removed == 0 {
            return Err(SpotsError::NotFound(format!(
                "Card {} in tracker {}",
                card_id, tracker_id
            )));
        }
        Ok(())
    }

    /// Flip a member's exclusion flag and return the updated member.
    pub fn toggle_exclude(&self, tracker_id: i64, card_id: i64) -> Result<TrackerMember> {
        let changed = self.store.run(
            "UPDATE tracker_members SET is_excluded = NOT is_excluded \
             WHERE tracker_id = ? AND card_id = ?",
            &[&tracker_id, &card_id],
        )?;
        if changed == 0 {
            return Err(SpotsError::NotFound(format!(
                "Card {} in tracker {}",
                card_id, tracker_id
            )));
        }
        self.store
            .query_one(
                &format!(
                    "SELECT {} FROM tracker_members WHERE tracker_id = ? AND card_id = ?",
                    MEMBER_COLUMNS
                ),
                &[&tracker_id, &card_id],
            )?
            .ok_or_else(|| SpotsError::NotFound(format!("Card {} in tracker {}", card_id, tracker_id)))
    }
}
