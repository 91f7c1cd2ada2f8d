use serde::{Deserialize, Serialize};

use super::card::CatalogCard;

// ---------------------------------------------------------------------------
// TrackerProgress — Completion figures for one tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerProgress {
    pub tracker_id: i64,
    pub tracker_name: String,
    pub set_code: Option<String>,
    pub track_foil: bool,
    pub track_non_foil: bool,
    /// Active (non-excluded) member count.
    pub total_cards: usize,
    /// Numerator of `completion_percentage`.
    pub collected_cards: usize,
    pub non_foil_collected: usize,
    pub foil_collected: usize,
    pub completion_percentage: f64,
    pub non_foil_percentage: f64,
    pub foil_percentage: f64,
}

// ---------------------------------------------------------------------------
// NearCompleteItem — One tracked dimension of a tracker, ranked
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearCompleteItem {
    pub tracker_id: i64,
    pub tracker_name: String,
    pub set_code: Option<String>,
    pub is_foil: bool,
    pub completion_percentage: f64,
    pub collected: usize,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// ValuableCard — An owned (card, finish) combination and its unit price
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuableCard {
    pub card_id: i64,
    pub card_name: String,
    pub set_code: String,
    pub set_name: String,
    pub is_foil: bool,
    pub price: f64,
}

// ---------------------------------------------------------------------------
// DashboardTotals / Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardTotals {
    /// One per physical copy.
    pub total_cards: usize,
    /// Distinct cards owned in any finish.
    pub unique_cards: usize,
    pub approx_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub totals: DashboardTotals,
    pub tracker_progress: Vec<TrackerProgress>,
    pub near_complete: Vec<NearCompleteItem>,
    pub top_valuable: Vec<ValuableCard>,
}

// ---------------------------------------------------------------------------
// Tracker detail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberStatus {
    pub member_id: i64,
    pub card: CatalogCard,
    pub is_excluded: bool,
    pub owned_quantity: usize,
    pub owned_foil_quantity: usize,
    pub is_collected: bool,
    pub is_foil_collected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerDetail {
    pub tracker: super::tracker::Tracker,
    pub progress: TrackerProgress,
    pub members: Vec<MemberStatus>,
}
