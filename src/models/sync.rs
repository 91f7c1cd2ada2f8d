use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SpotsError;

// ---------------------------------------------------------------------------
// SyncSchedule — Cadence of one kind of background sync
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncSchedule {
    Daily,
    Weekly,
    Manual,
}

impl SyncSchedule {
    pub fn period(self) -> Option<Duration> {
        match self {
            SyncSchedule::Daily => Some(Duration::days(1)),
            SyncSchedule::Weekly => Some(Duration::days(7)),
            SyncSchedule::Manual => None,
        }
    }

    /// Whether a sync last completed at `last` is due again at `now`.
    ///
    /// Manual schedules are never due; a schedule that never ran is due
    /// immediately; otherwise the elapsed time must exceed the period.
    pub fn is_due(self, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let Some(period) = self.period() else {
            return false;
        };
        match last {
            None => true,
            Some(last) => now - last > period,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SyncSchedule::Daily => "daily",
            SyncSchedule::Weekly => "weekly",
            SyncSchedule::Manual => "manual",
        }
    }
}

impl fmt::Display for SyncSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncSchedule {
    type Err = SpotsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(SyncSchedule::Daily),
            "weekly" => Ok(SyncSchedule::Weekly),
            "manual" => Ok(SyncSchedule::Manual),
            other => Err(SpotsError::InvalidArgument(format!(
                "Unknown sync schedule: {}",
                other
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// SyncState — The process-wide schedule configuration and sync status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    pub card_schedule: SyncSchedule,
    pub price_schedule: SyncSchedule,
    pub recent_months: u32,
    pub last_card_sync: Option<DateTime<Utc>>,
    pub last_price_sync: Option<DateTime<Utc>>,
    pub is_syncing: bool,
    pub status: Option<String>,
}

impl SyncState {
    pub fn card_sync_due(&self, now: DateTime<Utc>) -> bool {
        self.card_schedule.is_due(self.last_card_sync, now)
    }

    pub fn price_sync_due(&self, now: DateTime<Utc>) -> bool {
        self.price_schedule.is_due(self.last_price_sync, now)
    }

    pub fn status_view(&self) -> SyncStatus {
        SyncStatus {
            is_syncing: self.is_syncing,
            status: self.status.clone(),
            last_card_sync: self.last_card_sync,
            last_price_sync: self.last_price_sync,
        }
    }
}

/// The read-only status subset shown to foreground callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub status: Option<String>,
    pub last_card_sync: Option<DateTime<Utc>>,
    pub last_price_sync: Option<DateTime<Utc>>,
}

/// Schedule fields a foreground caller may change. `None` keeps the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfigUpdate {
    pub card_schedule: Option<SyncSchedule>,
    pub price_schedule: Option<SyncSchedule>,
    pub recent_months: Option<u32>,
}

// ---------------------------------------------------------------------------
// Reports — What an import or a multi-set sync achieved
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub set_code: String,
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub complete: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub attempted: usize,
    pub succeeded: usize,
    /// Set codes whose import returned an error.
    pub failed: Vec<String>,
    /// Set codes imported from a truncated page sequence.
    pub incomplete: Vec<String>,
    /// `true` when shutdown stopped the loop before every set was visited.
    pub cancelled: bool,
}

impl SyncReport {
    /// Human-readable outcome used as the sync status message, `None` when
    /// every set was imported completely.
    pub fn summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if !self.failed.is_empty() {
            parts.push(format!("failed: {}", self.failed.join(", ")));
        }
        if !self.incomplete.is_empty() {
            parts.push(format!("incomplete: {}", self.incomplete.join(", ")));
        }
        if self.cancelled {
            parts.push("interrupted by shutdown".to_string());
        }
        if parts.is_empty() {
            None
        } else {
            Some(format!(
                "Last sync finished with issues ({})",
                parts.join("; ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(days_ago: i64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        Some(now - Duration::days(days_ago))
    }

    #[test]
    fn manual_schedule_is_never_due() {
        let now = Utc::now();
        assert!(!SyncSchedule::Manual.is_due(None, now));
        assert!(!SyncSchedule::Manual.is_due(at(365, now), now));
    }

    #[test]
    fn never_synced_is_due() {
        let now = Utc::now();
        assert!(SyncSchedule::Daily.is_due(None, now));
        assert!(SyncSchedule::Weekly.is_due(None, now));
    }

    #[test]
    fn due_only_after_period_elapsed() {
        let now = Utc::now();
        assert!(!SyncSchedule::Daily.is_due(Some(now - Duration::hours(23)), now));
        assert!(SyncSchedule::Daily.is_due(Some(now - Duration::hours(25)), now));
        assert!(!SyncSchedule::Weekly.is_due(at(6, now), now));
        assert!(SyncSchedule::Weekly.is_due(at(8, now), now));
        // Exactly one period is not "exceeded".
        assert!(!SyncSchedule::Daily.is_due(at(1, now), now));
    }

    #[test]
    fn schedule_parses_case_insensitively() {
        assert_eq!("Weekly".parse::<SyncSchedule>().unwrap(), SyncSchedule::Weekly);
        assert!("hourly".parse::<SyncSchedule>().is_err());
    }

    #[test]
    fn clean_report_has_no_summary() {
        assert_eq!(SyncReport::default().summary(), None);
        let report = SyncReport {
            incomplete: vec!["mh3".into()],
            ..Default::default()
        };
        assert!(report.summary().unwrap().contains("incomplete: mh3"));
    }
}
