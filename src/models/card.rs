use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ImageUris — Card artwork links (absent for some reprint formats)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageUris {
    #[serde(rename = "image_uri", default)]
    pub normal: Option<String>,
    #[serde(rename = "image_uri_small", default)]
    pub small: Option<String>,
    #[serde(rename = "image_uri_art_crop", default)]
    pub art_crop: Option<String>,
}

// ---------------------------------------------------------------------------
// QuotedPrices — Prices exactly as the catalog quotes them (decimal strings)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotedPrices {
    pub eur: Option<String>,
    pub eur_foil: Option<String>,
}

// ---------------------------------------------------------------------------
// Printing — One card printing as delivered by the catalog service
// ---------------------------------------------------------------------------

/// A catalog printing translated into the local vocabulary but not yet
/// persisted. Carries the raw quoted prices so reconciliation can decide how
/// to parse them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Printing {
    pub external_id: String,
    pub name: String,
    pub set_code: String,
    pub set_name: String,
    pub collector_number: String,
    pub rarity: String,
    pub type_line: Option<String>,
    pub mana_cost: Option<String>,
    pub oracle_text: Option<String>,
    #[serde(flatten)]
    pub image_uris: ImageUris,
    pub lang: String,
    pub prices: QuotedPrices,
}

// ---------------------------------------------------------------------------
// CatalogCard — A printing mirrored into the local store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogCard {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    pub set_code: String,
    pub set_name: String,
    pub collector_number: String,
    pub rarity: String,
    pub type_line: Option<String>,
    pub mana_cost: Option<String>,
    pub oracle_text: Option<String>,
    #[serde(flatten)]
    pub image_uris: ImageUris,
    pub lang: String,
    pub updated_at: DateTime<Utc>,
}

impl CatalogCard {
    /// Sort key that orders collector numbers numerically first ("2" before
    /// "10"), then non-numeric ones ("12a", "★") by text, with blanks last.
    pub fn collector_sort_key(&self) -> (bool, u64, String) {
        collector_sort_key(&self.collector_number)
    }
}

pub(crate) fn collector_sort_key(number: &str) -> (bool, u64, String) {
    let blank = number.trim().is_empty();
    let numeric = number.parse::<u64>().unwrap_or(u64::MAX);
    (blank, numeric, number.to_string())
}

// ---------------------------------------------------------------------------
// UpsertOutcome — Result of reconciling one printing into the card table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub card_id: i64,
    pub inserted: bool,
}
