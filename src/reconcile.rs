//! Reconciliation of catalog data into the local store.
//!
//! An import is two passes over the fetched printings: every card is upserted
//! by external id first, then one price observation is recorded per card.
//! Imports are idempotent; re-running one is how a partial import recovers.

use chrono::{Months, NaiveDate, Utc};
use tokio_util::sync::CancellationToken;

use crate::catalog::CatalogSource;
use crate::config;
use crate::error::{Result, SpotsError};
use crate::models::{ImportReport, PriceHistory, PricePoint, SetImport, SetSummary, SyncReport};
use crate::queries::{CardQuery, PriceQuery, SetImportQuery};
use crate::store::Store;

/// Codes of the collectible paper sets released on or after
/// `today - months_back`, in catalog order.
pub fn recent_collectible_sets(sets: &[SetSummary], months_back: u32, today: NaiveDate) -> Vec<String> {
    let cutoff = today
        .checked_sub_months(Months::new(months_back))
        .unwrap_or(NaiveDate::MIN);
    let collectible = config::collectible_set_types();

    sets.iter()
        .filter(|s| !s.digital)
        .filter(|s| collectible.contains(&s.set_type.as_str()))
        .filter(|s| s.release_date().is_some_and(|d| d >= cutoff))
        .map(|s| s.code.clone())
        .collect()
}

/// Normalize a user-supplied set code.
pub(crate) fn normalize_set_code(code: &str) -> Result<String> {
    let code = code.trim().to_lowercase();
    if code.is_empty() {
        return Err(SpotsError::InvalidArgument("Set code must not be empty".into()));
    }
    Ok(code)
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Imports sets from a catalog into a store.
pub struct Reconciler<'a, C: CatalogSource + ?Sized> {
    store: &'a Store,
    catalog: &'a C,
    price_history: PriceHistory,
}

impl<'a, C: CatalogSource + ?Sized> Reconciler<'a, C> {
    pub fn new(store: &'a Store, catalog: &'a C) -> Self {
        Self {
            store,
            catalog,
            price_history: PriceHistory::default(),
        }
    }

    pub fn price_history(mut self, policy: PriceHistory) -> Self {
        self.price_history = policy;
        self
    }

    /// Fetch every printing of a set and reconcile cards, then prices.
    ///
    /// A truncated page sequence is not an error: the cards that arrived are
    /// committed and the report says `complete: false`.
    pub fn import_set(&self, set_code: &str) -> Result<ImportReport> {
        let set_code = normalize_set_code(set_code)?;
        let paged = self.catalog.get_set_cards(&set_code);
        let now = Utc::now();

        let mut report = ImportReport {
            set_code: set_code.clone(),
            fetched: paged.cards.len(),
            complete: paged.complete,
            ..Default::default()
        };

        let cards = CardQuery::new(self.store);
        let mut priced = Vec::with_capacity(paged.cards.len());
        for printing in &paged.cards {
            if printing.external_id.is_empty() {
                tracing::warn!(set = %set_code, name = %printing.name, "Skipping printing without an id");
                continue;
            }
            let outcome = cards.upsert(printing, now)?;
            if outcome.inserted {
                report.inserted += 1;
            } else {
                report.updated += 1;
            }
            priced.push((outcome.card_id, PricePoint::from_quoted(&printing.prices)));
        }

        let prices = PriceQuery::new(self.store);
        for (card_id, point) in priced {
            prices.record(card_id, point, now, self.price_history)?;
        }

        SetImportQuery::new(self.store).record(&SetImport {
            set_code: set_code.clone(),
            last_imported_at: now,
            card_count: cards.count_in_set(&set_code)?,
            complete: report.complete,
        })?;

        if report.complete {
            tracing::info!(
                set = %set_code,
                fetched = report.fetched,
                inserted = report.inserted,
                updated = report.updated,
                "Imported set"
            );
        } else {
            tracing::warn!(
                set = %set_code,
                fetched = report.fetched,
                "Imported set partially, pagination stopped early"
            );
        }
        Ok(report)
    }

    /// Import every recent collectible set. A failure to list sets is
    /// returned; failures of individual sets are logged and reported.
    pub fn sync_recent_sets(
        &self,
        months_back: u32,
        cancel: Option<&CancellationToken>,
    ) -> Result<SyncReport> {
        let sets = self.catalog.list_sets()?;
        let codes = recent_collectible_sets(&sets, months_back, Utc::now().date_naive());
        tracing::info!(sets = codes.len(), months_back, "Syncing recent sets");
        Ok(self.import_each(codes, cancel))
    }

    /// Re-import every set that has cards locally, refreshing their prices.
    pub fn sync_prices(&self, cancel: Option<&CancellationToken>) -> Result<SyncReport> {
        let codes = CardQuery::new(self.store).set_codes()?;
        tracing::info!(sets = codes.len(), "Syncing prices");
        Ok(self.import_each(codes, cancel))
    }

    fn import_each(&self, codes: Vec<String>, cancel: Option<&CancellationToken>) -> SyncReport {
        let mut report = SyncReport::default();
        for code in codes {
            if cancel.is_some_and(|t| t.is_cancelled()) {
                tracing::info!(remaining_from = %code, "Sync interrupted by shutdown");
                report.cancelled = true;
                break;
            }
            report.attempted += 1;
            match self.import_set(&code) {
                Ok(import) => {
                    report.succeeded += 1;
                    if !import.complete {
                        report.incomplete.push(code);
                    }
                }
                Err(e) => {
                    tracing::error!(set = %code, error = %e, "Set import failed");
                    report.failed.push(code);
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(code: &str, set_type: &str, released_at: Option<&str>, digital: bool) -> SetSummary {
        SetSummary {
            code: code.into(),
            name: code.to_uppercase(),
            set_type: set_type.into(),
            released_at: released_at.map(String::from),
            digital,
            ..Default::default()
        }
    }

    #[test]
    fn recent_sets_filter_type_date_and_digital() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let sets = vec![
            set("new", "expansion", Some("2024-06-01"), false),
            set("edge", "core", Some("2024-03-15"), false),
            set("old", "expansion", Some("2024-03-14"), false),
            set("tok", "token", Some("2024-06-01"), false),
            set("arena", "expansion", Some("2024-06-01"), true),
            set("undated", "masters", None, false),
            set("cmd", "commander", Some("2024-07-01"), false),
        ];
        assert_eq!(
            recent_collectible_sets(&sets, 3, today),
            vec!["new", "edge", "cmd"]
        );
    }

    #[test]
    fn blank_set_code_is_rejected() {
        assert!(matches!(
            normalize_set_code("  "),
            Err(SpotsError::InvalidArgument(_))
        ));
        assert_eq!(normalize_set_code(" MH3 ").unwrap(), "mh3");
    }
}
