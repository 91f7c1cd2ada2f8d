use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tracker — A named completion goal, bound to a set or hand-curated
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracker {
    pub id: i64,
    pub name: String,
    pub set_code: Option<String>,
    pub track_foil: bool,
    pub track_non_foil: bool,
    pub is_collecting: bool,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTracker {
    pub name: String,
    pub set_code: Option<String>,
    #[serde(default)]
    pub track_foil: bool,
    #[serde(default = "default_true")]
    pub track_non_foil: bool,
}

impl NewTracker {
    /// A non-foil tracker with no set binding.
    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            set_code: None,
            track_foil: false,
            track_non_foil: true,
        }
    }

    /// A non-foil tracker covering every card of `set_code`.
    pub fn for_set(name: impl Into<String>, set_code: impl Into<String>) -> Self {
        Self {
            set_code: Some(set_code.into()),
            ..Self::custom(name)
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerUpdate {
    pub name: Option<String>,
    pub track_foil: Option<bool>,
    pub track_non_foil: Option<bool>,
    pub is_collecting: Option<bool>,
    pub is_pinned: Option<bool>,
}

// ---------------------------------------------------------------------------
// TrackerMember — Card membership with an independent exclusion flag
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerMember {
    pub id: i64,
    pub tracker_id: i64,
    pub card_id: i64,
    pub is_excluded: bool,
}

/// How a caller names the card to add to a tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRef {
    /// A card already in the local catalog.
    CardId(i64),
    /// A catalog printing id; its set is imported when not yet local.
    ExternalId(String),
}
