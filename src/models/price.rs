use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PriceSnapshot — One point-in-time price observation for a card
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub id: i64,
    pub card_id: i64,
    pub price: Option<f64>,
    pub foil_price: Option<f64>,
    pub observed_at: DateTime<Utc>,
}

impl PriceSnapshot {
    /// The price matching a finish: foil price for foil copies, regular price
    /// otherwise. No fallback between the two.
    pub fn for_finish(&self, is_foil: bool) -> Option<f64> {
        if is_foil {
            self.foil_price
        } else {
            self.price
        }
    }

    /// Value of one physical copy for collection totals: the foil price when
    /// the copy is foil and a foil price is known, else the regular price.
    pub fn copy_value(&self, is_foil: bool) -> Option<f64> {
        if is_foil {
            self.foil_price.or(self.price)
        } else {
            self.price
        }
    }
}

// ---------------------------------------------------------------------------
// PricePoint — Parsed prices ready to be recorded
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PricePoint {
    pub price: Option<f64>,
    pub foil_price: Option<f64>,
}

impl PricePoint {
    pub fn from_quoted(quoted: &super::QuotedPrices) -> Self {
        Self {
            price: parse_price(quoted.eur.as_deref()),
            foil_price: parse_price(quoted.eur_foil.as_deref()),
        }
    }
}

/// Parse a catalog price string. `str::parse` is locale-invariant; anything
/// absent, unparsable or non-finite is `None`, never zero.
pub fn parse_price(raw: Option<&str>) -> Option<f64> {
    let value = raw?.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

// ---------------------------------------------------------------------------
// PriceHistory — What recording a new observation does to existing rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceHistory {
    /// Overwrite the newest snapshot in place; insert only the first one.
    #[default]
    OverwriteLatest,
    /// Insert a new snapshot on every observation.
    Append,
}
