//! Price snapshot recording and current-price lookups.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{PriceHistory, PricePoint, PriceSnapshot};
use crate::store::{query_rows, timestamp, Store};

/// Newest snapshot per card: max `observed_at`, ties broken by max id.
const LATEST_SNAPSHOTS: &str = r#"
    SELECT id, card_id, price, foil_price, observed_at
    FROM (
        SELECT *, row_number() OVER (
            PARTITION BY card_id ORDER BY observed_at DESC, id DESC
        ) AS rn
        FROM price_snapshots
    )
    WHERE rn = 1
"#;

// ---------------------------------------------------------------------------
// PriceQuery
// ---------------------------------------------------------------------------

/// Query interface for the `price_snapshots` table.
pub struct PriceQuery<'a> {
    store: &'a Store,
}

impl<'a> PriceQuery<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Record an observation for a card under the given history policy.
    ///
    /// With [`PriceHistory::OverwriteLatest`] the newest snapshot's prices and
    /// timestamp are replaced in place, and a snapshot is inserted only when
    /// the card has none yet.
    pub fn record(
        &self,
        card_id: i64,
        point: PricePoint,
        observed_at: DateTime<Utc>,
        policy: PriceHistory,
    ) -> Result<()> {
        let observed = timestamp(observed_at);
        self.store.with_conn(|conn| {
            let tx = conn.transaction()?;

            let latest = match policy {
                PriceHistory::Append => None,
                PriceHistory::OverwriteLatest => query_rows(
                    &tx,
                    "SELECT id FROM price_snapshots WHERE card_id = ? \
                     ORDER BY observed_at DESC, id DESC LIMIT 1",
                    &[&card_id],
                )?
                .into_iter()
                .next()
                .and_then(|r| r.get("id").and_then(|v| v.as_i64())),
            };

            match latest {
                Some(id) => {
                    tx.execute(
                        "UPDATE price_snapshots SET price = ?, foil_price = ?, observed_at = ? WHERE id = ?",
                        duckdb::params![point.price, point.foil_price, observed, id],
                    )?;
                }
                None => {
                    tx.execute(
                        "INSERT INTO price_snapshots (card_id, price, foil_price, observed_at) \
                         VALUES (?, ?, ?, ?)",
                        duckdb::params![card_id, point.price, point.foil_price, observed],
                    )?;
                }
            }

            tx.commit()?;
            Ok(())
        })
    }

    /// The current price of a card, if it was ever priced.
    pub fn latest(&self, card_id: i64) -> Result<Option<PriceSnapshot>> {
        self.store.query_one(
            &format!("SELECT * FROM ({}) WHERE card_id = ?", LATEST_SNAPSHOTS),
            &[&card_id],
        )
    }

    /// Current price of every priced card, keyed by card id.
    pub fn latest_all(&self) -> Result<HashMap<i64, PriceSnapshot>> {
        let snapshots: Vec<PriceSnapshot> = self.store.query_into(LATEST_SNAPSHOTS, &[])?;
        Ok(snapshots.into_iter().map(|s| (s.card_id, s)).collect())
    }

    /// All snapshots of a card, oldest first.
    pub fn history(&self, card_id: i64) -> Result<Vec<PriceSnapshot>> {
        self.store.query_into(
            "SELECT id, card_id, price, foil_price, observed_at FROM price_snapshots \
             WHERE card_id = ? ORDER BY observed_at ASC, id ASC",
            &[&card_id],
        )
    }
}
