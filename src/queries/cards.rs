//! Local catalog queries and the card upsert used by reconciliation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use duckdb::ToSql;

use crate::error::{Result, SpotsError};
use crate::models::{CatalogCard, Printing, UpsertOutcome};
use crate::sql_builder::SqlBuilder;
use crate::store::{query_rows, timestamp, Store};

/// Columns of `cards` in [`CatalogCard`] field order.
pub(crate) const CARD_COLUMNS: &str = "id, external_id, name, set_code, set_name, collector_number, \
     rarity, type_line, mana_cost, oracle_text, image_uri, image_uri_small, image_uri_art_crop, \
     lang, updated_at";

// ---------------------------------------------------------------------------
// CardSearch
// ---------------------------------------------------------------------------

/// Filters for browsing the local catalog.
///
/// All fields are optional. When `None`, the corresponding filter is skipped.
#[derive(Debug, Clone, Default)]
pub struct CardSearch {
    /// Case-insensitive substring of the card name.
    pub name: Option<String>,
    pub set_code: Option<String>,
    pub rarity: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

// ---------------------------------------------------------------------------
// CardQuery
// ---------------------------------------------------------------------------

/// Query interface for the locally mirrored catalog.
pub struct CardQuery<'a> {
    store: &'a Store,
}

impl<'a> CardQuery<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    // -- Single card lookup ------------------------------------------------

    pub fn get(&self, id: i64) -> Result<Option<CatalogCard>> {
        self.store.query_one(
            &format!("SELECT {} FROM cards WHERE id = ?", CARD_COLUMNS),
            &[&id],
        )
    }

    /// Like [`get`](Self::get) but a missing card is `NotFound`.
    pub fn require(&self, id: i64) -> Result<CatalogCard> {
        self.get(id)?
            .ok_or_else(|| SpotsError::NotFound(format!("Card {}", id)))
    }

    pub fn get_by_external_id(&self, external_id: &str) -> Result<Option<CatalogCard>> {
        self.store.query_one(
            &format!("SELECT {} FROM cards WHERE external_id = ?", CARD_COLUMNS),
            &[&external_id],
        )
    }

    // -- Listings ----------------------------------------------------------

    /// All local cards of a set, in collector-number order.
    pub fn by_set(&self, set_code: &str) -> Result<Vec<CatalogCard>> {
        let mut cards: Vec<CatalogCard> = self.store.query_into(
            &format!("SELECT {} FROM cards WHERE set_code = ?", CARD_COLUMNS),
            &[&set_code],
        )?;
        cards.sort_by(|a, b| {
            a.collector_sort_key()
                .cmp(&b.collector_sort_key())
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(cards)
    }

    /// Cards belonging to a tracker, in collector-number order.
    pub fn for_tracker(&self, tracker_id: i64) -> Result<Vec<CatalogCard>> {
        let mut cards: Vec<CatalogCard> = self.store.query_into(
            &format!(
                "SELECT {} FROM cards WHERE id IN \
                 (SELECT card_id FROM tracker_members WHERE tracker_id = ?)",
                CARD_COLUMNS
            ),
            &[&tracker_id],
        )?;
        cards.sort_by(|a, b| {
            a.set_code
                .cmp(&b.set_code)
                .then_with(|| a.collector_sort_key().cmp(&b.collector_sort_key()))
        });
        Ok(cards)
    }

    /// Cards with at least one owned copy, keyed by id.
    pub fn owned(&self) -> Result<HashMap<i64, CatalogCard>> {
        let cards: Vec<CatalogCard> = self.store.query_into(
            &format!(
                "SELECT {} FROM cards WHERE id IN (SELECT DISTINCT card_id FROM inventory)",
                CARD_COLUMNS
            ),
            &[],
        )?;
        Ok(cards.into_iter().map(|c| (c.id, c)).collect())
    }

    /// Browse the local catalog with optional filters, ordered by name.
    pub fn search(&self, params: &CardSearch) -> Result<Vec<CatalogCard>> {
        let mut qb = SqlBuilder::new("cards");
        qb.select(&[CARD_COLUMNS]);

        if let Some(ref name) = params.name {
            qb.where_like("name", &format!("%{}%", name));
        }
        if let Some(ref set_code) = params.set_code {
            qb.where_eq("set_code", &set_code.to_lowercase());
        }
        if let Some(ref rarity) = params.rarity {
            qb.where_eq("rarity", rarity);
        }

        qb.order_by(&["name ASC", "set_code ASC", "collector_number ASC"]);
        qb.limit(params.limit.unwrap_or(100));
        if let Some(offset) = params.offset {
            qb.offset(offset);
        }

        let (sql, sql_params) = qb.build();
        self.store.execute_into(&sql, &sql_params)
    }

    /// Distinct set codes present locally, sorted.
    pub fn set_codes(&self) -> Result<Vec<String>> {
        let (sql, params) = SqlBuilder::new("cards")
            .select(&["set_code"])
            .distinct()
            .order_by(&["set_code ASC"])
            .build();
        let rows = self.store.execute(&sql, &params)?;
        Ok(rows
            .into_iter()
            .filter_map(|r| r.get("set_code").and_then(|v| v.as_str()).map(String::from))
            .collect())
    }

    pub fn count(&self) -> Result<i64> {
        self.store.count("cards")
    }

    pub fn count_in_set(&self, set_code: &str) -> Result<i64> {
        let value = self
            .store
            .query_scalar("SELECT COUNT(*) FROM cards WHERE set_code = ?", &[&set_code])?;
        Ok(value.and_then(|v| v.as_i64()).unwrap_or(0))
    }

    // -- Reconciliation ----------------------------------------------------

    /// Insert a printing or overwrite the mutable fields of the card with the
    /// same external id. One transaction per card; the external id itself is
    /// never rewritten.
    pub fn upsert(&self, printing: &Printing, now: DateTime<Utc>) -> Result<UpsertOutcome> {
        let updated_at = timestamp(now);
        self.store.with_conn(|conn| {
            let tx = conn.transaction()?;

            let existing = query_rows(
                &tx,
                "SELECT id FROM cards WHERE external_id = ?",
                &[&printing.external_id],
            )?
            .into_iter()
            .next()
            .and_then(|r| r.get("id").and_then(|v| v.as_i64()));

            let outcome = match existing {
                Some(card_id) => {
                    let params: [&dyn ToSql; 14] = [
                        &printing.name,
                        &printing.set_code,
                        &printing.set_name,
                        &printing.collector_number,
                        &printing.rarity,
                        &printing.type_line,
                        &printing.mana_cost,
                        &printing.oracle_text,
                        &printing.image_uris.normal,
                        &printing.image_uris.small,
                        &printing.image_uris.art_crop,
                        &printing.lang,
                        &updated_at,
                        &card_id,
                    ];
                    tx.execute(
                        "UPDATE cards SET name = ?, set_code = ?, set_name = ?, collector_number = ?, \
                         rarity = ?, type_line = ?, mana_cost = ?, oracle_text = ?, image_uri = ?, \
                         image_uri_small = ?, image_uri_art_crop = ?, lang = ?, updated_at = ? \
                         WHERE id = ?",
                        params.as_slice(),
                    )?;
                    UpsertOutcome {
                        card_id,
                        inserted: false,
                    }
                }
                None => {
                    let params: [&dyn ToSql; 14] = [
                        &printing.external_id,
                        &printing.name,
                        &printing.set_code,
                        &printing.set_name,
                        &printing.collector_number,
                        &printing.rarity,
                        &printing.type_line,
                        &printing.mana_cost,
                        &printing.oracle_text,
                        &printing.image_uris.normal,
                        &printing.image_uris.small,
                        &printing.image_uris.art_crop,
                        &printing.lang,
                        &updated_at,
                    ];
                    let card_id = query_rows(
                        &tx,
                        "INSERT INTO cards (external_id, name, set_code, set_name, collector_number, \
                         rarity, type_line, mana_cost, oracle_text, image_uri, image_uri_small, \
                         image_uri_art_crop, lang, updated_at) \
                         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
                        params.as_slice(),
                    )?
                    .into_iter()
                    .next()
                    .and_then(|r| r.get("id").and_then(|v| v.as_i64()))
                    .ok_or_else(|| {
                        SpotsError::Internal(format!(
                            "Insert of card {} returned no id",
                            printing.external_id
                        ))
                    })?;
                    UpsertOutcome {
                        card_id,
                        inserted: true,
                    }
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
    }
}
