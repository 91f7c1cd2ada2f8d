use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::card::Printing;

// ---------------------------------------------------------------------------
// SetSummary — Summary info for a set as listed by the catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetSummary {
    pub code: String,
    pub name: String,
    pub set_type: String,
    pub released_at: Option<String>,
    pub digital: bool,
    pub card_count: i64,
    pub icon_svg_uri: Option<String>,
}

impl SetSummary {
    /// Parsed release date, `None` when absent or not an ISO date.
    pub fn release_date(&self) -> Option<NaiveDate> {
        self.released_at
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }
}

// ---------------------------------------------------------------------------
// PagedCards — Outcome of walking a set's paginated card listing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagedCards {
    pub cards: Vec<Printing>,
    pub pages: usize,
    /// `false` when pagination stopped before the catalog said it was done.
    pub complete: bool,
}

// ---------------------------------------------------------------------------
// SearchPage — One page of free-text search results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub cards: Vec<Printing>,
    pub total_cards: i64,
    pub has_more: bool,
}

// ---------------------------------------------------------------------------
// SetImport — Bookkeeping row written after every set import
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetImport {
    pub set_code: String,
    pub last_imported_at: DateTime<Utc>,
    pub card_count: i64,
    pub complete: bool,
}
