//! Wire DTOs for the Scryfall-style JSON API and their translation into the
//! crate's models.
//!
//! Every field is optional or defaulted: upstream objects vary by layout and
//! age, and a missing field must never fail a whole page.

use serde::Deserialize;

use crate::models::{ImageUris, Printing, QuotedPrices, SetSummary};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireSet {
    pub code: String,
    pub name: String,
    pub set_type: String,
    pub released_at: Option<String>,
    pub digital: bool,
    pub card_count: i64,
    pub icon_svg_uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireImageUris {
    pub small: Option<String>,
    pub normal: Option<String>,
    pub art_crop: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WirePrices {
    pub eur: Option<String>,
    pub eur_foil: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireFace {
    pub name: Option<String>,
    pub mana_cost: Option<String>,
    pub type_line: Option<String>,
    pub oracle_text: Option<String>,
    pub image_uris: Option<WireImageUris>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCard {
    pub id: String,
    pub name: String,
    pub set: String,
    pub set_name: String,
    pub collector_number: String,
    pub rarity: String,
    pub type_line: Option<String>,
    pub mana_cost: Option<String>,
    pub oracle_text: Option<String>,
    pub image_uris: Option<WireImageUris>,
    pub card_faces: Vec<WireFace>,
    pub lang: Option<String>,
    pub prices: WirePrices,
}

/// A paginated list envelope (`object: "list"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WireList<T> {
    pub data: Vec<T>,
    pub has_more: bool,
    pub next_page: Option<String>,
    pub total_cards: Option<i64>,
}

impl<T> Default for WireList<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            has_more: false,
            next_page: None,
            total_cards: None,
        }
    }
}

/// The autocomplete envelope (`object: "catalog"`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCatalog {
    pub data: Vec<String>,
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

impl From<WireImageUris> for ImageUris {
    fn from(uris: WireImageUris) -> Self {
        Self {
            normal: uris.normal,
            small: uris.small,
            art_crop: uris.art_crop,
        }
    }
}

impl From<WireSet> for SetSummary {
    fn from(set: WireSet) -> Self {
        Self {
            code: set.code.to_lowercase(),
            name: set.name,
            set_type: set.set_type,
            released_at: set.released_at,
            digital: set.digital,
            card_count: set.card_count,
            icon_svg_uri: set.icon_svg_uri,
        }
    }
}

impl From<WireCard> for Printing {
    fn from(card: WireCard) -> Self {
        let mut faces = card.card_faces.into_iter();
        let front = faces.next().unwrap_or_default();

        // Multi-faced layouts carry images and rules text on the faces only.
        let image_uris = card
            .image_uris
            .or(front.image_uris)
            .map(ImageUris::from)
            .unwrap_or_default();

        Self {
            external_id: card.id,
            name: card.name,
            set_code: card.set.to_lowercase(),
            set_name: card.set_name,
            collector_number: card.collector_number,
            rarity: card.rarity,
            type_line: card.type_line.or(front.type_line),
            mana_cost: card.mana_cost.or(front.mana_cost),
            oracle_text: card.oracle_text.or(front.oracle_text),
            image_uris,
            lang: card.lang.unwrap_or_else(|| "en".to_string()),
            prices: QuotedPrices {
                eur: card.prices.eur,
                eur_foil: card.prices.eur_foil,
            },
        }
    }
}
