//! Owned-copy inventory: one row per physical card.

use std::collections::HashMap;

use crate::error::{Result, SpotsError};
use crate::models::{
    CollectionCard, InventoryEntry, InventoryFilter, InventoryUpdate, NewInventoryEntry,
};
use crate::queries::cards::CardQuery;
use crate::queries::prices::PriceQuery;
use crate::sql_builder::SqlBuilder;
use crate::store::{query_rows, Store};

const ENTRY_COLUMNS: &[&str] = &["i.id", "i.card_id", "i.is_foil", "i.location_id", "i.for_trade"];

// ---------------------------------------------------------------------------
// InventoryQuery
// ---------------------------------------------------------------------------

/// Query interface for the `inventory` table.
pub struct InventoryQuery<'a> {
    store: &'a Store,
}

impl<'a> InventoryQuery<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Add one physical copy. Fails with `NotFound` if the card is not local.
    pub fn add(&self, entry: &NewInventoryEntry) -> Result<InventoryEntry> {
        let location_id = entry.location_id.filter(|id| *id != 0);
        let rows = self.store.with_conn(|conn| {
            let tx = conn.transaction()?;
            let exists = !query_rows(&tx, "SELECT id FROM cards WHERE id = ?", &[&entry.card_id])?
                .is_empty();
            if !exists {
                return Err(SpotsError::NotFound(format!("Card {}", entry.card_id)));
            }
            let rows = query_rows(
                &tx,
                "INSERT INTO inventory (card_id, is_foil, location_id, for_trade) \
                 VALUES (?, ?, ?, ?) RETURNING id, card_id, is_foil, location_id, for_trade",
                &[&entry.card_id, &entry.is_foil, &location_id, &entry.for_trade],
            )?;
            tx.commit()?;
            Ok(rows)
        })?;
        crate::store::rows_into::<InventoryEntry>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| SpotsError::Internal("Inventory insert returned no row".into()))
    }

    pub fn get(&self, id: i64) -> Result<Option<InventoryEntry>> {
        self.store.query_one(
            "SELECT id, card_id, is_foil, location_id, for_trade FROM inventory WHERE id = ?",
            &[&id],
        )
    }

    /// Change the location or trade flag of a copy. A location of `0` clears it.
    pub fn update(&self, id: i64, update: &InventoryUpdate) -> Result<InventoryEntry> {
        let mut entry = self
            .get(id)?
            .ok_or_else(|| SpotsError::NotFound(format!("Inventory entry {}", id)))?;

        if let Some(location_id) = update.location_id {
            entry.location_id = (location_id != 0).then_some(location_id);
        }
        if let Some(for_trade) = update.for_trade {
            entry.for_trade = for_trade;
        }

        self.store.run(
            "UPDATE inventory SET location_id = ?, for_trade = ? WHERE id = ?",
            &[&entry.location_id, &entry.for_trade, &id],
        )?;
        Ok(entry)
    }

    pub fn remove(&self, id: i64) -> Result<()> {
        let removed = self.store.run("DELETE FROM inventory WHERE id = ?", &[&id])?;
        if removed == 0 {
            return Err(SpotsError::NotFound(format!("Inventory entry {}", id)));
        }
        Ok(())
    }

    /// Entries matching the filter, ordered by card name then entry id.
    pub fn list(&self, filter: &InventoryFilter) -> Result<Vec<InventoryEntry>> {
        let mut qb = SqlBuilder::new("inventory i");
        qb.select(ENTRY_COLUMNS)
            .join("JOIN cards c ON c.id = i.card_id");

        if let Some(ref set_code) = filter.set_code {
            qb.where_eq("c.set_code", &set_code.to_lowercase());
        }
        if let Some(ref name) = filter.name {
            qb.where_like("c.name", &format!("%{}%", name));
        }
        if let Some(card_id) = filter.card_id {
            qb.where_clause("i.card_id = CAST(? AS BIGINT)", &[&card_id.to_string()]);
        }
        if let Some(location_id) = filter.location_id {
            qb.where_clause("i.location_id = CAST(? AS BIGINT)", &[&location_id.to_string()]);
        }
        if let Some(for_trade) = filter.for_trade {
            qb.where_clause("i.for_trade = CAST(? AS BOOLEAN)", &[&for_trade.to_string()]);
        }
        qb.order_by(&["c.name ASC", "i.id ASC"]);

        let (sql, params) = qb.build();
        self.store.execute_into(&sql, &params)
    }

    /// Every owned copy.
    pub fn all(&self) -> Result<Vec<InventoryEntry>> {
        self.store.query_into(
            "SELECT id, card_id, is_foil, location_id, for_trade FROM inventory ORDER BY id",
            &[],
        )
    }

    /// Filtered entries consolidated per card with standard/foil counts and
    /// the card's current prices.
    pub fn grouped(&self, filter: &InventoryFilter) -> Result<Vec<CollectionCard>> {
        let entries = self.list(filter)?;
        let cards = CardQuery::new(self.store).owned()?;
        let prices = PriceQuery::new(self.store).latest_all()?;

        let mut order: Vec<i64> = Vec::new();
        let mut by_card: HashMap<i64, Vec<InventoryEntry>> = HashMap::new();
        for entry in entries {
            let slot = by_card.entry(entry.card_id).or_insert_with(|| {
                order.push(entry.card_id);
                Vec::new()
            });
            slot.push(entry);
        }

        let mut grouped = Vec::with_capacity(order.len());
        for card_id in order {
            let (Some(card), Some(entries)) = (cards.get(&card_id), by_card.remove(&card_id)) else {
                continue;
            };
            let foil_count = entries.iter().filter(|e| e.is_foil).count();
            let price = prices.get(&card_id);
            grouped.push(CollectionCard {
                card: card.clone(),
                price: price.and_then(|p| p.price),
                foil_price: price.and_then(|p| p.foil_price),
                standard_count: entries.len() - foil_count,
                foil_count,
                entries,
            });
        }
        Ok(grouped)
    }

    /// Delete every owned copy. Returns how many were removed.
    pub fn reset(&self) -> Result<usize> {
        let removed = self.store.run("DELETE FROM inventory", &[])?;
        tracing::info!(removed, "Inventory reset");
        Ok(removed)
    }
}
