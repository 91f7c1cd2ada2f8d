//! Shared test fixtures for the spots integration tests.
//!
//! Provides an in-memory [`Spots`] wired to [`FakeCatalog`], a scripted
//! catalog whose set listings are served through the real pagination walk.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use spots::catalog::collect_pages;
use spots::catalog::wire::{WireCard, WireFace, WireImageUris, WireList, WirePrices};
use spots::models::{PagedCards, Printing, SearchPage, SetSummary};
use spots::{CatalogSource, Result, Spots, SpotsError};

/// One scripted page: `Some(cards)` is served, `None` fails with a 500.
pub type Page = Option<Vec<WireCard>>;

// ---------------------------------------------------------------------------
// FakeCatalog
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeCatalog {
    sets: Mutex<Vec<SetSummary>>,
    pages: Mutex<HashMap<String, Vec<Page>>>,
    list_sets_fails: AtomicBool,
    list_sets_calls: AtomicUsize,
    fetched_sets: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a set with its scripted card pages.
    pub fn add_set(&self, set: SetSummary, pages: Vec<Page>) {
        self.pages.lock().unwrap().insert(set.code.clone(), pages);
        self.sets.lock().unwrap().push(set);
    }

    /// Replace the pages served for a set (new prices, renamed cards, ...).
    pub fn set_pages(&self, code: &str, pages: Vec<Page>) {
        self.pages.lock().unwrap().insert(code.to_string(), pages);
    }

    pub fn fail_list_sets(&self, fail: bool) {
        self.list_sets_fails.store(fail, Ordering::SeqCst);
    }

    pub fn list_sets_calls(&self) -> usize {
        self.list_sets_calls.load(Ordering::SeqCst)
    }

    /// Set codes passed to `get_set_cards`, in call order.
    pub fn fetched_sets(&self) -> Vec<String> {
        self.fetched_sets.lock().unwrap().clone()
    }

    fn all_cards(&self) -> Vec<WireCard> {
        self.pages
            .lock()
            .unwrap()
            .values()
            .flatten()
            .flatten()
            .flatten()
            .cloned()
            .collect()
    }
}

impl CatalogSource for FakeCatalog {
    fn list_sets(&self) -> Result<Vec<SetSummary>> {
        self.list_sets_calls.fetch_add(1, Ordering::SeqCst);
        if self.list_sets_fails.load(Ordering::SeqCst) {
            return Err(SpotsError::Upstream {
                url: "fake://sets".into(),
                status: 503,
            });
        }
        Ok(self.sets.lock().unwrap().clone())
    }

    fn get_set(&self, code: &str) -> Result<SetSummary> {
        self.sets
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.code == code)
            .cloned()
            .ok_or_else(|| SpotsError::NotFound(format!("Set {}", code)))
    }

    fn get_set_cards(&self, code: &str) -> PagedCards {
        self.fetched_sets.lock().unwrap().push(code.to_string());
        let pages = self.pages.lock().unwrap().get(code).cloned();
        collect_pages(code, format!("fake://{}/1", code), |url| {
            let Some(ref pages) = pages else {
                return Err(SpotsError::NotFound(url.to_string()));
            };
            let index: usize = url.rsplit('/').next().unwrap().parse().unwrap();
            match pages.get(index - 1) {
                Some(Some(cards)) => Ok(WireList {
                    data: cards.clone(),
                    has_more: index < pages.len(),
                    next_page: Some(format!("fake://{}/{}", code, index + 1)),
                    total_cards: None,
                }),
                _ => Err(SpotsError::Upstream {
                    url: url.to_string(),
                    status: 500,
                }),
            }
        })
    }

    fn search_cards(&self, query: &str, _page: u32) -> SearchPage {
        let needle = query.to_lowercase();
        let cards: Vec<Printing> = self
            .all_cards()
            .into_iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .map(Printing::from)
            .collect();
        SearchPage {
            total_cards: cards.len() as i64,
            has_more: false,
            cards,
        }
    }

    fn autocomplete(&self, query: &str) -> Vec<String> {
        let prefix = query.to_lowercase();
        let mut names: Vec<String> = self
            .all_cards()
            .into_iter()
            .map(|c| c.name)
            .filter(|n| n.to_lowercase().starts_with(&prefix))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn get_card_by_id(&self, external_id: &str) -> Result<Printing> {
        self.all_cards()
            .into_iter()
            .find(|c| c.id == external_id)
            .map(Printing::from)
            .ok_or_else(|| SpotsError::NotFound(format!("Card {}", external_id)))
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// An in-memory instance backed by the given fake catalog.
pub fn spots_with(catalog: &Arc<FakeCatalog>) -> Spots {
    Spots::builder()
        .in_memory()
        .catalog(catalog.clone())
        .build()
        .unwrap()
}

/// A set released `days_ago` days before today.
pub fn set_summary(code: &str, set_type: &str, days_ago: i64) -> SetSummary {
    let released = (Utc::now() - Duration::days(days_ago)).date_naive();
    SetSummary {
        code: code.to_string(),
        name: format!("Set {}", code.to_uppercase()),
        set_type: set_type.to_string(),
        released_at: Some(released.format("%Y-%m-%d").to_string()),
        digital: false,
        card_count: 0,
        icon_svg_uri: None,
    }
}

pub fn wire_card(set: &str, number: &str, name: &str, eur: Option<&str>, eur_foil: Option<&str>) -> WireCard {
    WireCard {
        id: format!("{}-{}", set, number),
        name: name.to_string(),
        set: set.to_string(),
        set_name: format!("Set {}", set.to_uppercase()),
        collector_number: number.to_string(),
        rarity: "common".to_string(),
        type_line: Some("Creature — Test".to_string()),
        mana_cost: Some("{1}{G}".to_string()),
        oracle_text: None,
        image_uris: Some(WireImageUris {
            small: Some(format!("https://img.test/{}/{}/small.jpg", set, number)),
            normal: Some(format!("https://img.test/{}/{}/normal.jpg", set, number)),
            art_crop: None,
        }),
        card_faces: Vec::new(),
        lang: Some("en".to_string()),
        prices: WirePrices {
            eur: eur.map(String::from),
            eur_foil: eur_foil.map(String::from),
        },
    }
}

/// `count` cards numbered from `first`, priced at 1.00 / 2.00.
pub fn numbered_cards(set: &str, first: usize, count: usize) -> Vec<WireCard> {
    (first..first + count)
        .map(|n| {
            wire_card(
                set,
                &n.to_string(),
                &format!("Card {} {}", set.to_uppercase(), n),
                Some("1.00"),
                Some("2.00"),
            )
        })
        .collect()
}

/// A card with only face-level images and rules text.
pub fn double_faced_card(set: &str, number: &str) -> WireCard {
    WireCard {
        image_uris: None,
        type_line: None,
        oracle_text: None,
        card_faces: vec![
            WireFace {
                name: Some("Front".into()),
                mana_cost: Some("{2}{U}".into()),
                type_line: Some("Creature — Front".into()),
                oracle_text: Some("Transform.".into()),
                image_uris: Some(WireImageUris {
                    small: Some("https://img.test/front/small.jpg".into()),
                    normal: Some("https://img.test/front/normal.jpg".into()),
                    art_crop: Some("https://img.test/front/art.jpg".into()),
                }),
            },
            WireFace {
                name: Some("Back".into()),
                image_uris: Some(WireImageUris {
                    small: Some("https://img.test/back/small.jpg".into()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ],
        mana_cost: None,
        ..wire_card(set, number, "Front // Back", Some("3.50"), None)
    }
}

/// A fresh in-memory instance with one imported set of `count` cards.
pub fn imported_set(code: &str, count: usize) -> (Spots, Arc<FakeCatalog>) {
    let catalog = FakeCatalog::new();
    catalog.add_set(
        set_summary(code, "expansion", 10),
        vec![Some(numbered_cards(code, 1, count))],
    );
    let spots = spots_with(&catalog);
    spots.import_set(code).unwrap();
    (spots, catalog)
}
