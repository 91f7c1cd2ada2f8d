use serde::{Deserialize, Serialize};

use super::card::CatalogCard;

// ---------------------------------------------------------------------------
// InventoryEntry — One physical owned copy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub id: i64,
    pub card_id: i64,
    pub is_foil: bool,
    pub location_id: Option<i64>,
    pub for_trade: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewInventoryEntry {
    pub card_id: i64,
    #[serde(default)]
    pub is_foil: bool,
    pub location_id: Option<i64>,
    #[serde(default)]
    pub for_trade: bool,
}

/// Partial update of an entry. `location_id: Some(0)` clears the location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryUpdate {
    pub location_id: Option<i64>,
    pub for_trade: Option<bool>,
}

/// Filters for the collection listings. `None` skips the filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryFilter {
    pub set_code: Option<String>,
    pub location_id: Option<i64>,
    pub card_id: Option<i64>,
    pub name: Option<String>,
    pub for_trade: Option<bool>,
}

// ---------------------------------------------------------------------------
// CollectionCard — All copies of one card, consolidated for display
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionCard {
    pub card: CatalogCard,
    pub price: Option<f64>,
    pub foil_price: Option<f64>,
    pub standard_count: usize,
    pub foil_count: usize,
    pub entries: Vec<InventoryEntry>,
}
