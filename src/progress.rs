//! Completion and collection-value calculations.
//!
//! Everything here is a pure function over already-loaded rows; the facade
//! loads a snapshot of the store and hands it in.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::models::{
    CatalogCard, DashboardTotals, InventoryEntry, MemberStatus, NearCompleteItem, PriceSnapshot,
    Tracker, TrackerMember, TrackerProgress, ValuableCard,
};

pub const DEFAULT_RANKING_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// OwnershipIndex
// ---------------------------------------------------------------------------

/// Owned copy counts per card, split by finish.
#[derive(Debug, Clone, Default)]
pub struct OwnershipIndex {
    counts: HashMap<i64, (usize, usize)>,
}

impl OwnershipIndex {
    pub fn from_entries(entries: &[InventoryEntry]) -> Self {
        let mut counts: HashMap<i64, (usize, usize)> = HashMap::new();
        for entry in entries {
            let slot = counts.entry(entry.card_id).or_default();
            if entry.is_foil {
                slot.1 += 1;
            } else {
                slot.0 += 1;
            }
        }
        Self { counts }
    }

    pub fn non_foil(&self, card_id: i64) -> usize {
        self.counts.get(&card_id).map_or(0, |c| c.0)
    }

    pub fn foil(&self, card_id: i64) -> usize {
        self.counts.get(&card_id).map_or(0, |c| c.1)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percentage(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    round1(numerator as f64 * 100.0 / denominator as f64)
}

/// Effective `(non_foil, foil)` tracking. A tracker tracking neither finish
/// counts as non-foil only.
fn tracked_finishes(track_non_foil: bool, track_foil: bool) -> (bool, bool) {
    if !track_non_foil && !track_foil {
        (true, false)
    } else {
        (track_non_foil, track_foil)
    }
}

// ---------------------------------------------------------------------------
// Tracker progress
// ---------------------------------------------------------------------------

/// Completion of one tracker against the owned inventory.
///
/// Excluded members count for nothing. Tracking both finishes doubles the
/// denominator and counts each owned finish separately; tracking one finish
/// counts only copies of that finish.
pub fn tracker_progress(
    tracker: &Tracker,
    members: &[TrackerMember],
    owned: &OwnershipIndex,
) -> TrackerProgress {
    let active: Vec<i64> = members
        .iter()
        .filter(|m| !m.is_excluded)
        .map(|m| m.card_id)
        .collect();
    let total = active.len();
    let non_foil_collected = active.iter().filter(|id| owned.non_foil(**id) > 0).count();
    let foil_collected = active.iter().filter(|id| owned.foil(**id) > 0).count();

    let (collected, denominator) = match tracked_finishes(tracker.track_non_foil, tracker.track_foil) {
        (true, true) => (non_foil_collected + foil_collected, total * 2),
        (false, true) => (foil_collected, total),
        _ => (non_foil_collected, total),
    };

    TrackerProgress {
        tracker_id: tracker.id,
        tracker_name: tracker.name.clone(),
        set_code: tracker.set_code.clone(),
        track_foil: tracker.track_foil,
        track_non_foil: tracker.track_non_foil,
        total_cards: total,
        collected_cards: collected,
        non_foil_collected,
        foil_collected,
        completion_percentage: percentage(collected, denominator),
        non_foil_percentage: percentage(non_foil_collected, total),
        foil_percentage: percentage(foil_collected, total),
    }
}

/// Tracked finishes of every tracker that are started but not finished,
/// highest completion first.
pub fn near_complete(progress: &[TrackerProgress], limit: usize) -> Vec<NearCompleteItem> {
    let mut items = Vec::new();
    for p in progress {
        let (non_foil, foil) = tracked_finishes(p.track_non_foil, p.track_foil);
        if non_foil {
            items.push(NearCompleteItem {
                tracker_id: p.tracker_id,
                tracker_name: p.tracker_name.clone(),
                set_code: p.set_code.clone(),
                is_foil: false,
                completion_percentage: p.non_foil_percentage,
                collected: p.non_foil_collected,
                total: p.total_cards,
            });
        }
        if foil {
            items.push(NearCompleteItem {
                tracker_id: p.tracker_id,
                tracker_name: p.tracker_name.clone(),
                set_code: p.set_code.clone(),
                is_foil: true,
                completion_percentage: p.foil_percentage,
                collected: p.foil_collected,
                total: p.total_cards,
            });
        }
    }

    items.retain(|i| i.completion_percentage > 0.0 && i.completion_percentage < 100.0);
    items.sort_by(|a, b| {
        b.completion_percentage
            .partial_cmp(&a.completion_percentage)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.tracker_name.cmp(&b.tracker_name))
    });
    items.truncate(limit);
    items
}

// ---------------------------------------------------------------------------
// Collection value
// ---------------------------------------------------------------------------

/// The most valuable owned `(card, finish)` combinations at their matching
/// price. Unpriced and zero-priced combinations are left out.
pub fn top_valuable(
    entries: &[InventoryEntry],
    prices: &HashMap<i64, PriceSnapshot>,
    cards: &HashMap<i64, CatalogCard>,
    limit: usize,
) -> Vec<ValuableCard> {
    let owned: HashSet<(i64, bool)> = entries.iter().map(|e| (e.card_id, e.is_foil)).collect();

    let mut ranked: Vec<ValuableCard> = owned
        .into_iter()
        .filter_map(|(card_id, is_foil)| {
            let price = prices.get(&card_id)?.for_finish(is_foil)?;
            if price <= 0.0 {
                return None;
            }
            let card = cards.get(&card_id)?;
            Some(ValuableCard {
                card_id,
                card_name: card.name.clone(),
                set_code: card.set_code.clone(),
                set_name: card.set_name.clone(),
                is_foil,
                price,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.price
            .partial_cmp(&a.price)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.card_name.cmp(&b.card_name))
            .then_with(|| a.is_foil.cmp(&b.is_foil))
    });
    ranked.truncate(limit);
    ranked
}

/// Copy count, distinct cards and approximate value of the inventory.
///
/// Each physical copy is valued at its foil price when foil and known, else
/// at the regular price, else zero.
pub fn dashboard_totals(
    entries: &[InventoryEntry],
    prices: &HashMap<i64, PriceSnapshot>,
) -> DashboardTotals {
    let unique: HashSet<i64> = entries.iter().map(|e| e.card_id).collect();
    let value: f64 = entries
        .iter()
        .filter_map(|e| prices.get(&e.card_id)?.copy_value(e.is_foil))
        .sum();

    DashboardTotals {
        total_cards: entries.len(),
        unique_cards: unique.len(),
        approx_value: (value * 100.0).round() / 100.0,
    }
}

// ---------------------------------------------------------------------------
// Tracker detail
// ---------------------------------------------------------------------------

/// Ownership of each member, in the order of `cards`.
pub fn member_status(
    members: &[TrackerMember],
    cards: &[CatalogCard],
    owned: &OwnershipIndex,
) -> Vec<MemberStatus> {
    let by_card: HashMap<i64, &TrackerMember> = members.iter().map(|m| (m.card_id, m)).collect();
    cards
        .iter()
        .filter_map(|card| {
            let member = by_card.get(&card.id)?;
            let owned_quantity = owned.non_foil(card.id);
            let owned_foil_quantity = owned.foil(card.id);
            Some(MemberStatus {
                member_id: member.id,
                card: card.clone(),
                is_excluded: member.is_excluded,
                owned_quantity,
                owned_foil_quantity,
                is_collected: owned_quantity > 0,
                is_foil_collected: owned_foil_quantity > 0,
            })
        })
        .collect()
}

/// Deck-list style export of the active members with no non-foil copy, one
/// `1 {name} (V.{collector_number}) ({set_name})` line each.
pub fn missing_list(statuses: &[MemberStatus]) -> String {
    statuses
        .iter()
        .filter(|s| !s.is_excluded && !s.is_collected)
        .map(|s| {
            format!(
                "1 {} (V.{}) ({})",
                s.card.name, s.card.collector_number, s.card.set_name
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
