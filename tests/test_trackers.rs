//! Tracker lifecycle, membership and the tracker detail view.

mod common;

use common::{numbered_cards, set_summary, spots_with, FakeCatalog};
use spots::models::{MemberRef, NewInventoryEntry, NewTracker, TrackerUpdate};
use spots::SpotsError;

#[test]
fn set_tracker_imports_its_set_and_adds_every_card() {
    let catalog = FakeCatalog::new();
    catalog.add_set(set_summary("tst", "expansion", 5), vec![Some(numbered_cards("tst", 1, 6))]);
    let spots = spots_with(&catalog);

    let tracker = spots
        .create_tracker(&NewTracker::for_set("All of TST", "TST"))
        .unwrap();
    assert_eq!(tracker.set_code.as_deref(), Some("tst"));
    assert!(tracker.is_collecting);
    assert!(!tracker.is_pinned);

    assert_eq!(catalog.fetched_sets(), vec!["tst"]);
    assert_eq!(spots.trackers().members(tracker.id).unwrap().len(), 6);
}

#[test]
fn blank_tracker_name_is_rejected() {
    let catalog = FakeCatalog::new();
    let spots = spots_with(&catalog);
    assert!(matches!(
        spots.create_tracker(&NewTracker::custom("  ")),
        Err(SpotsError::InvalidArgument(_))
    ));
}

#[test]
fn duplicate_member_is_a_conflict() {
    let (spots, _catalog) = common::imported_set("tst", 2);
    let card = spots.cards().get_by_external_id("tst-1").unwrap().unwrap();
    let tracker = spots.create_tracker(&NewTracker::custom("Picks")).unwrap();

    spots
        .add_tracker_member(tracker.id, &MemberRef::CardId(card.id))
        .unwrap();
    let err = spots
        .add_tracker_member(tracker.id, &MemberRef::CardId(card.id))
        .unwrap_err();
    assert!(matches!(err, SpotsError::Conflict(_)));

    assert!(matches!(
        spots.add_tracker_member(tracker.id, &MemberRef::CardId(9_999)),
        Err(SpotsError::NotFound(_))
    ));
    assert!(matches!(
        spots.add_tracker_member(9_999, &MemberRef::CardId(card.id)),
        Err(SpotsError::NotFound(_))
    ));
}

#[test]
fn member_by_external_id_imports_its_set() {
    let catalog = FakeCatalog::new();
    catalog.add_set(set_summary("far", "expansion", 5), vec![Some(numbered_cards("far", 1, 3))]);
    let spots = spots_with(&catalog);
    let tracker = spots.create_tracker(&NewTracker::custom("Picks")).unwrap();

    let member = spots
        .add_tracker_member(tracker.id, &MemberRef::ExternalId("far-2".into()))
        .unwrap();
    assert_eq!(catalog.fetched_sets(), vec!["far"]);
    assert_eq!(spots.cards().count().unwrap(), 3);

    let card = spots.cards().get(member.card_id).unwrap().unwrap();
    assert_eq!(card.external_id, "far-2");

    assert!(matches!(
        spots.add_tracker_member(tracker.id, &MemberRef::ExternalId("missing".into())),
        Err(SpotsError::NotFound(_))
    ));
}

#[test]
fn toggling_exclusion_flips_and_changes_progress() {
    let (spots, _catalog) = common::imported_set("tst", 2);
    let tracker = spots.create_tracker(&NewTracker::for_set("TST", "tst")).unwrap();
    let first = spots.cards().get_by_external_id("tst-1").unwrap().unwrap();
    let second = spots.cards().get_by_external_id("tst-2").unwrap().unwrap();
    spots
        .add_inventory(&NewInventoryEntry {
            card_id: first.id,
            ..Default::default()
        })
        .unwrap();

    assert_eq!(
        spots.get_tracker_detail(tracker.id).unwrap().progress.completion_percentage,
        50.0
    );

    let member = spots.toggle_member_exclusion(tracker.id, second.id).unwrap();
    assert!(member.is_excluded);
    assert_eq!(
        spots.get_tracker_detail(tracker.id).unwrap().progress.completion_percentage,
        100.0
    );

    let member = spots.toggle_member_exclusion(tracker.id, second.id).unwrap();
    assert!(!member.is_excluded);
    assert_eq!(
        spots.get_tracker_detail(tracker.id).unwrap().progress.completion_percentage,
        50.0
    );

    assert!(matches!(
        spots.toggle_member_exclusion(tracker.id, 9_999),
        Err(SpotsError::NotFound(_))
    ));
}

#[test]
fn detail_reports_member_ownership_in_collector_order() {
    let (spots, _catalog) = common::imported_set("tst", 3);
    let tracker = spots.create_tracker(&NewTracker::for_set("TST", "tst")).unwrap();
    let third = spots.cards().get_by_external_id("tst-3").unwrap().unwrap();
    spots
        .add_inventory(&NewInventoryEntry {
            card_id: third.id,
            is_foil: true,
            ..Default::default()
        })
        .unwrap();

    let detail = spots.get_tracker_detail(tracker.id).unwrap();
    assert_eq!(detail.tracker.id, tracker.id);
    let numbers: Vec<&str> = detail
        .members
        .iter()
        .map(|m| m.card.collector_number.as_str())
        .collect();
    assert_eq!(numbers, vec!["1", "2", "3"]);

    let owned = &detail.members[2];
    assert_eq!(owned.owned_quantity, 0);
    assert_eq!(owned.owned_foil_quantity, 1);
    assert!(!owned.is_collected);
    assert!(owned.is_foil_collected);

    assert!(matches!(spots.get_tracker_detail(9_999), Err(SpotsError::NotFound(_))));
}

#[test]
fn export_lists_missing_active_members() {
    let (spots, _catalog) = common::imported_set("tst", 3);
    let tracker = spots.create_tracker(&NewTracker::for_set("TST", "tst")).unwrap();
    let first = spots.cards().get_by_external_id("tst-1").unwrap().unwrap();
    let third = spots.cards().get_by_external_id("tst-3").unwrap().unwrap();
    spots
        .add_inventory(&NewInventoryEntry {
            card_id: first.id,
            ..Default::default()
        })
        .unwrap();
    spots.toggle_member_exclusion(tracker.id, third.id).unwrap();

    let export = spots.export_missing(tracker.id).unwrap();
    assert_eq!(export, "1 Card TST 2 (V.2) (Set TST)");
}

#[test]
fn list_puts_pinned_trackers_first() {
    let catalog = FakeCatalog::new();
    let spots = spots_with(&catalog);
    spots.create_tracker(&NewTracker::custom("Alpha")).unwrap();
    let beta = spots.create_tracker(&NewTracker::custom("Beta")).unwrap();
    spots
        .update_tracker(
            beta.id,
            &TrackerUpdate {
                is_pinned: Some(true),
                name: Some("Beta pinned".into()),
                ..Default::default()
            },
        )
        .unwrap();

    let names: Vec<String> = spots
        .list_trackers()
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["Beta pinned", "Alpha"]);
}

#[test]
fn delete_cascades_members() {
    let (spots, _catalog) = common::imported_set("tst", 2);
    let tracker = spots.create_tracker(&NewTracker::for_set("TST", "tst")).unwrap();
    assert_eq!(spots.store().count("tracker_members").unwrap(), 2);

    spots.delete_tracker(tracker.id).unwrap();
    assert_eq!(spots.store().count("tracker_members").unwrap(), 0);
    assert!(spots.trackers().get(tracker.id).unwrap().is_none());
    assert!(matches!(spots.delete_tracker(tracker.id), Err(SpotsError::NotFound(_))));
}

#[test]
fn remove_member_then_missing_is_not_found() {
    let (spots, _catalog) = common::imported_set("tst", 2);
    let tracker = spots.create_tracker(&NewTracker::for_set("TST", "tst")).unwrap();
    let card = spots.cards().get_by_external_id("tst-1").unwrap().unwrap();

    spots.remove_tracker_member(tracker.id, card.id).unwrap();
    assert_eq!(spots.trackers().members(tracker.id).unwrap().len(), 1);
    assert!(matches!(
        spots.remove_tracker_member(tracker.id, card.id),
        Err(SpotsError::NotFound(_))
    ));
}

#[test]
fn catalog_reset_keeps_trackers_but_drops_references() {
    let (spots, _catalog) = common::imported_set("tst", 2);
    let tracker = spots.create_tracker(&NewTracker::for_set("TST", "tst")).unwrap();
    let card = spots.cards().get_by_external_id("tst-1").unwrap().unwrap();
    spots
        .add_inventory(&NewInventoryEntry {
            card_id: card.id,
            ..Default::default()
        })
        .unwrap();

    spots.reset_catalog().unwrap();

    for table in ["cards", "price_snapshots", "inventory", "tracker_members", "set_imports"] {
        assert_eq!(spots.store().count(table).unwrap(), 0, "{} not emptied", table);
    }
    assert!(spots.trackers().get(tracker.id).unwrap().is_some());
    assert_eq!(spots.get_sync_config().unwrap().recent_months, 3);
}
