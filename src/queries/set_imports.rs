//! Per-set import bookkeeping.

use crate::error::Result;
use crate::models::SetImport;
use crate::store::{timestamp, Store};

pub struct SetImportQuery<'a> {
    store: &'a Store,
}

impl<'a> SetImportQuery<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Insert or replace the import row of a set.
    pub fn record(&self, import: &SetImport) -> Result<()> {
        self.store.run(
            "INSERT OR REPLACE INTO set_imports (set_code, last_imported_at, card_count, complete) \
             VALUES (?, ?, ?, ?)",
            &[
                &import.set_code,
                &timestamp(import.last_imported_at),
                &import.card_count,
                &import.complete,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, set_code: &str) -> Result<Option<SetImport>> {
        self.store.query_one(
            "SELECT set_code, last_imported_at, card_count, complete FROM set_imports WHERE set_code = ?",
            &[&set_code],
        )
    }

    pub fn list(&self) -> Result<Vec<SetImport>> {
        self.store.query_into(
            "SELECT set_code, last_imported_at, card_count, complete FROM set_imports ORDER BY set_code",
            &[],
        )
    }
}
