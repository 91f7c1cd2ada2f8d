//! Completion arithmetic, rankings and the assembled dashboard.

mod common;

use std::collections::HashMap;

use chrono::Utc;
use spots::models::{
    CatalogCard, ImageUris, InventoryEntry, MemberRef, NewInventoryEntry, NewTracker,
    PriceSnapshot, Tracker, TrackerMember, TrackerProgress, TrackerUpdate,
};
use spots::progress::{
    dashboard_totals, near_complete, top_valuable, tracker_progress, OwnershipIndex,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn tracker(track_non_foil: bool, track_foil: bool) -> Tracker {
    Tracker {
        id: 1,
        name: "Test".into(),
        set_code: Some("tst".into()),
        track_foil,
        track_non_foil,
        is_collecting: true,
        is_pinned: false,
        created_at: Utc::now(),
    }
}

/// Members for cards `1..=count`.
fn members(count: i64) -> Vec<TrackerMember> {
    (1..=count)
        .map(|card_id| TrackerMember {
            id: card_id,
            tracker_id: 1,
            card_id,
            is_excluded: false,
        })
        .collect()
}

fn copy(id: i64, card_id: i64, is_foil: bool) -> InventoryEntry {
    InventoryEntry {
        id,
        card_id,
        is_foil,
        location_id: None,
        for_trade: false,
    }
}

/// Non-foil copies of cards `1..=non_foil`, foil copies of `1..=foil`.
fn owned(non_foil: i64, foil: i64) -> Vec<InventoryEntry> {
    let mut entries: Vec<_> = (1..=non_foil).map(|c| copy(c, c, false)).collect();
    entries.extend((1..=foil).map(|c| copy(100 + c, c, true)));
    entries
}

fn snapshot(card_id: i64, price: Option<f64>, foil_price: Option<f64>) -> PriceSnapshot {
    PriceSnapshot {
        id: card_id,
        card_id,
        price,
        foil_price,
        observed_at: Utc::now(),
    }
}

fn card(id: i64, name: &str) -> CatalogCard {
    CatalogCard {
        id,
        external_id: format!("ext-{}", id),
        name: name.into(),
        set_code: "tst".into(),
        set_name: "Test Set".into(),
        collector_number: id.to_string(),
        rarity: "rare".into(),
        type_line: None,
        mana_cost: None,
        oracle_text: None,
        image_uris: ImageUris::default(),
        lang: "en".into(),
        updated_at: Utc::now(),
    }
}

fn progress_at(name: &str, non_foil: f64, foil: f64, track_foil: bool) -> TrackerProgress {
    TrackerProgress {
        tracker_id: 1,
        tracker_name: name.into(),
        set_code: None,
        track_foil,
        track_non_foil: true,
        total_cards: 1000,
        collected_cards: 0,
        non_foil_collected: (non_foil * 10.0) as usize,
        foil_collected: (foil * 10.0) as usize,
        completion_percentage: 0.0,
        non_foil_percentage: non_foil,
        foil_percentage: foil,
    }
}

// ---------------------------------------------------------------------------
// tracker_progress
// ---------------------------------------------------------------------------

#[test]
fn both_finishes_tracked_doubles_the_denominator() {
    let index = OwnershipIndex::from_entries(&owned(5, 3));
    let p = tracker_progress(&tracker(true, true), &members(10), &index);

    assert_eq!(p.total_cards, 10);
    assert_eq!(p.collected_cards, 8);
    assert_eq!(p.completion_percentage, 40.0);
    assert_eq!(p.non_foil_percentage, 50.0);
    assert_eq!(p.foil_percentage, 30.0);
}

#[test]
fn foil_only_tracker_ignores_non_foil_copies() {
    let index = OwnershipIndex::from_entries(&owned(6, 3));
    let p = tracker_progress(&tracker(false, true), &members(10), &index);

    assert_eq!(p.collected_cards, 3);
    assert_eq!(p.completion_percentage, 30.0);
    assert_eq!(p.non_foil_percentage, 60.0);
}

#[test]
fn non_foil_only_tracker_ignores_foil_copies() {
    let index = OwnershipIndex::from_entries(&owned(2, 7));
    let p = tracker_progress(&tracker(true, false), &members(10), &index);
    assert_eq!(p.completion_percentage, 20.0);
}

#[test]
fn tracker_with_no_finish_counts_as_non_foil() {
    let index = OwnershipIndex::from_entries(&owned(1, 4));
    let p = tracker_progress(&tracker(false, false), &members(4), &index);
    assert_eq!(p.completion_percentage, 25.0);
}

#[test]
fn empty_denominator_is_zero_percent() {
    let index = OwnershipIndex::from_entries(&owned(3, 3));
    let p = tracker_progress(&tracker(true, true), &[], &index);
    assert_eq!(p.total_cards, 0);
    assert_eq!(p.completion_percentage, 0.0);
    assert_eq!(p.foil_percentage, 0.0);

    let mut all_excluded = members(3);
    all_excluded.iter_mut().for_each(|m| m.is_excluded = true);
    let p = tracker_progress(&tracker(true, false), &all_excluded, &index);
    assert_eq!(p.completion_percentage, 0.0);
}

#[test]
fn excluded_members_leave_both_numerator_and_denominator() {
    let index = OwnershipIndex::from_entries(&owned(1, 0));
    let mut list = members(4);
    let t = tracker(true, false);
    assert_eq!(tracker_progress(&t, &list, &index).completion_percentage, 25.0);

    // Excluding an unowned card raises completion.
    list[3].is_excluded = true;
    assert_eq!(tracker_progress(&t, &list, &index).completion_percentage, 33.3);

    // Excluding the owned card drops it.
    list[0].is_excluded = true;
    assert_eq!(tracker_progress(&t, &list, &index).completion_percentage, 0.0);

    // Toggling back restores the original figure.
    list[0].is_excluded = false;
    list[3].is_excluded = false;
    assert_eq!(tracker_progress(&t, &list, &index).completion_percentage, 25.0);
}

// ---------------------------------------------------------------------------
// near_complete
// ---------------------------------------------------------------------------

#[test]
fn near_complete_excludes_untouched_and_finished() {
    let progress = vec![
        progress_at("zero", 0.0, 0.0, false),
        progress_at("low", 0.1, 0.0, false),
        progress_at("high", 99.9, 0.0, false),
        progress_at("done", 100.0, 0.0, false),
    ];
    let items = near_complete(&progress, 10);
    let names: Vec<&str> = items.iter().map(|i| i.tracker_name.as_str()).collect();
    assert_eq!(names, vec!["high", "low"]);
    assert!(items.iter().all(|i| !i.is_foil));
}

#[test]
fn near_complete_ranks_each_tracked_finish_and_truncates() {
    let progress = vec![
        progress_at("a", 50.0, 75.0, true),
        progress_at("b", 60.0, 10.0, false),
        progress_at("c", 20.0, 0.0, true),
    ];
    let items = near_complete(&progress, 3);
    let ranked: Vec<(&str, bool, f64)> = items
        .iter()
        .map(|i| (i.tracker_name.as_str(), i.is_foil, i.completion_percentage))
        .collect();
    assert_eq!(
        ranked,
        vec![("a", true, 75.0), ("b", false, 60.0), ("a", false, 50.0)]
    );
}

// ---------------------------------------------------------------------------
// top_valuable / dashboard_totals
// ---------------------------------------------------------------------------

#[test]
fn top_valuable_uses_matching_finish_price_only() {
    let entries = vec![
        copy(1, 1, false),
        copy(2, 1, false),
        copy(3, 1, true),
        copy(4, 2, true),
        copy(5, 3, false),
        copy(6, 4, false),
    ];
    let prices: HashMap<i64, PriceSnapshot> = [
        snapshot(1, Some(2.0), None),
        snapshot(2, Some(10.0), Some(25.0)),
        snapshot(3, Some(0.0), Some(1.0)),
    ]
    .into_iter()
    .map(|s| (s.card_id, s))
    .collect();
    let cards: HashMap<i64, CatalogCard> = (1..=4).map(|id| (id, card(id, &format!("C{}", id)))).collect();

    let ranked = top_valuable(&entries, &prices, &cards, 10);
    let pairs: Vec<(i64, bool, f64)> = ranked.iter().map(|v| (v.card_id, v.is_foil, v.price)).collect();
    // Card 1 foil has no foil price, card 3 is worth 0, card 4 is unpriced.
    assert_eq!(pairs, vec![(2, true, 25.0), (1, false, 2.0)]);

    assert_eq!(top_valuable(&entries, &prices, &cards, 1).len(), 1);
}

#[test]
fn totals_value_every_physical_copy() {
    let entries = vec![
        copy(1, 1, false),
        copy(2, 1, false),
        copy(3, 1, true),
        copy(4, 2, true),
        copy(5, 3, false),
    ];
    let prices: HashMap<i64, PriceSnapshot> = [
        snapshot(1, Some(1.5), None),
        snapshot(2, Some(4.0), Some(6.25)),
    ]
    .into_iter()
    .map(|s| (s.card_id, s))
    .collect();

    let totals = dashboard_totals(&entries, &prices);
    assert_eq!(totals.total_cards, 5);
    assert_eq!(totals.unique_cards, 3);
    // 1.5 + 1.5 + 1.5 (foil falls back) + 6.25 + 0
    assert_eq!(totals.approx_value, 10.75);
}

// ---------------------------------------------------------------------------
// Dashboard through the facade
// ---------------------------------------------------------------------------

#[test]
fn dashboard_covers_collecting_trackers_with_members() {
    let (spots, _catalog) = common::imported_set("tst", 4);
    let first = spots.cards().get_by_external_id("tst-1").unwrap().unwrap();

    let set_tracker = spots
        .create_tracker(&NewTracker::for_set("Test set", "tst"))
        .unwrap();
    spots.create_tracker(&NewTracker::custom("Empty")).unwrap();
    let paused = spots.create_tracker(&NewTracker::custom("Paused")).unwrap();
    spots
        .add_tracker_member(paused.id, &MemberRef::CardId(first.id))
        .unwrap();
    spots
        .update_tracker(
            paused.id,
            &TrackerUpdate {
                is_collecting: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

    spots
        .add_inventory(&NewInventoryEntry {
            card_id: first.id,
            is_foil: true,
            ..Default::default()
        })
        .unwrap();
    spots
        .add_inventory(&NewInventoryEntry {
            card_id: first.id,
            ..Default::default()
        })
        .unwrap();

    let dashboard = spots.get_dashboard().unwrap();
    assert_eq!(dashboard.tracker_progress.len(), 1);
    let progress = &dashboard.tracker_progress[0];
    assert_eq!(progress.tracker_id, set_tracker.id);
    assert_eq!(progress.completion_percentage, 25.0);

    assert_eq!(dashboard.totals.total_cards, 2);
    assert_eq!(dashboard.totals.unique_cards, 1);
    // Fixture prices: 1.00 regular, 2.00 foil.
    assert_eq!(dashboard.totals.approx_value, 3.0);

    assert_eq!(dashboard.near_complete.len(), 1);
    assert_eq!(dashboard.near_complete[0].completion_percentage, 25.0);

    let valuable: Vec<(bool, f64)> = dashboard.top_valuable.iter().map(|v| (v.is_foil, v.price)).collect();
    assert_eq!(valuable, vec![(true, 2.0), (false, 1.0)]);
}

#[test]
fn dashboard_skips_trackers_whose_members_are_all_excluded() {
    let (spots, _catalog) = common::imported_set("tst", 2);
    let first = spots.cards().get_by_external_id("tst-1").unwrap().unwrap();

    let tracker = spots.create_tracker(&NewTracker::custom("Excluded")).unwrap();
    spots
        .add_tracker_member(tracker.id, &MemberRef::CardId(first.id))
        .unwrap();
    assert_eq!(spots.get_dashboard().unwrap().tracker_progress.len(), 1);

    spots.toggle_member_exclusion(tracker.id, first.id).unwrap();
    assert!(spots.get_dashboard().unwrap().tracker_progress.is_empty());

    // The tracker itself still reports its own progress.
    let detail = spots.get_tracker_detail(tracker.id).unwrap();
    assert_eq!(detail.progress.total_cards, 0);
}
