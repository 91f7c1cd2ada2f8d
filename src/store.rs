//! DuckDB-backed local store with schema migration and row execution helpers.
//!
//! Rows come back as `HashMap<String, serde_json::Value>` and are deserialized
//! into the typed models with `serde_json`, so a query only has to alias its
//! columns to the model's field names.

use crate::error::{Result, SpotsError};
use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::{types::ValueRef, Connection as DuckDbConnection, ToSql};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// One result row keyed by column name.
pub type Row = HashMap<String, serde_json::Value>;

/// Tables are created without foreign keys: DuckDB checks them eagerly on
/// UPDATE, and every cascade is done explicitly by the query layer instead.
const SCHEMA: &str = r#"
CREATE SEQUENCE IF NOT EXISTS cards_id_seq START 1;
CREATE TABLE IF NOT EXISTS cards (
    id BIGINT PRIMARY KEY DEFAULT nextval('cards_id_seq'),
    external_id VARCHAR NOT NULL UNIQUE,
    name VARCHAR NOT NULL,
    set_code VARCHAR NOT NULL,
    set_name VARCHAR NOT NULL,
    collector_number VARCHAR NOT NULL,
    rarity VARCHAR NOT NULL,
    type_line VARCHAR,
    mana_cost VARCHAR,
    oracle_text VARCHAR,
    image_uri VARCHAR,
    image_uri_small VARCHAR,
    image_uri_art_crop VARCHAR,
    lang VARCHAR NOT NULL,
    updated_at VARCHAR NOT NULL
);

CREATE SEQUENCE IF NOT EXISTS price_snapshots_id_seq START 1;
CREATE TABLE IF NOT EXISTS price_snapshots (
    id BIGINT PRIMARY KEY DEFAULT nextval('price_snapshots_id_seq'),
    card_id BIGINT NOT NULL,
    price DOUBLE,
    foil_price DOUBLE,
    observed_at VARCHAR NOT NULL
);

CREATE SEQUENCE IF NOT EXISTS inventory_id_seq START 1;
CREATE TABLE IF NOT EXISTS inventory (
    id BIGINT PRIMARY KEY DEFAULT nextval('inventory_id_seq'),
    card_id BIGINT NOT NULL,
    is_foil BOOLEAN NOT NULL DEFAULT false,
    location_id BIGINT,
    for_trade BOOLEAN NOT NULL DEFAULT false
);

CREATE SEQUENCE IF NOT EXISTS trackers_id_seq START 1;
CREATE TABLE IF NOT EXISTS trackers (
    id BIGINT PRIMARY KEY DEFAULT nextval('trackers_id_seq'),
    name VARCHAR NOT NULL,
    set_code VARCHAR,
    track_foil BOOLEAN NOT NULL DEFAULT false,
    track_non_foil BOOLEAN NOT NULL DEFAULT true,
    is_collecting BOOLEAN NOT NULL DEFAULT true,
    is_pinned BOOLEAN NOT NULL DEFAULT false,
    created_at VARCHAR NOT NULL
);

CREATE SEQUENCE IF NOT EXISTS tracker_members_id_seq START 1;
CREATE TABLE IF NOT EXISTS tracker_members (
    id BIGINT PRIMARY KEY DEFAULT nextval('tracker_members_id_seq'),
    tracker_id BIGINT NOT NULL,
    card_id BIGINT NOT NULL,
    is_excluded BOOLEAN NOT NULL DEFAULT false,
    UNIQUE (tracker_id, card_id)
);

CREATE TABLE IF NOT EXISTS set_imports (
    set_code VARCHAR PRIMARY KEY,
    last_imported_at VARCHAR NOT NULL,
    card_count BIGINT NOT NULL,
    complete BOOLEAN NOT NULL
);

CREATE TABLE IF NOT EXISTS sync_state (
    id INTEGER PRIMARY KEY,
    card_schedule VARCHAR NOT NULL,
    price_schedule VARCHAR NOT NULL,
    recent_months INTEGER NOT NULL,
    last_card_sync VARCHAR,
    last_price_sync VARCHAR,
    is_syncing BOOLEAN NOT NULL DEFAULT false,
    status VARCHAR
);
"#;

/// Format a timestamp the way every timestamp column stores it: fixed-width
/// RFC 3339 in UTC, so string order is chronological order.
pub fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Wraps a DuckDB connection holding the catalog, inventory, trackers and
/// sync bookkeeping.
///
/// The connection sits behind a `Mutex` that is held for one statement or one
/// transaction at a time, which makes the store shareable between the
/// background scheduler and foreground callers.
pub struct Store {
    conn: Mutex<DuckDbConnection>,
    path: Option<PathBuf>,
}

impl Store {
    /// Open (or create) a database file and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = DuckDbConnection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        store.migrate()?;
        tracing::debug!(path = %path.display(), "Opened store");
        Ok(store)
    }

    /// Open an in-memory database (tests, throwaway sessions).
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(DuckDbConnection::open_in_memory()?),
            path: None,
        };
        store.migrate()?;
        Ok(store)
    }

    /// Database file backing this store, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn migrate(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(SCHEMA)?;
            conn.execute(
                "INSERT INTO sync_state (id, card_schedule, price_schedule, recent_months, is_syncing) \
                 SELECT 1, 'daily', 'weekly', ?, false \
                 WHERE NOT EXISTS (SELECT 1 FROM sync_state WHERE id = 1)",
                duckdb::params![i64::from(crate::config::DEFAULT_RECENT_MONTHS)],
            )?;
            Ok(())
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, DuckDbConnection>> {
        self.conn
            .lock()
            .map_err(|_| SpotsError::Internal("Store lock poisoned".into()))
    }

    /// Run a closure with exclusive access to the raw connection.
    ///
    /// Use this for multi-statement work that must be atomic; open a
    /// transaction on the connection inside the closure.
    pub fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut DuckDbConnection) -> Result<T>,
    {
        let mut guard = self.lock()?;
        f(&mut guard)
    }

    /// Execute SQL with string parameters and return rows as maps.
    ///
    /// Pairs with [`SqlBuilder`](crate::SqlBuilder), whose parameters are
    /// always strings.
    pub fn execute(&self, sql: &str, params: &[String]) -> Result<Vec<Row>> {
        let param_values: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
        self.query(sql, &param_values)
    }

    /// Execute SQL with string parameters and deserialize each row into `T`.
    pub fn execute_into<T: DeserializeOwned>(&self, sql: &str, params: &[String]) -> Result<Vec<T>> {
        rows_into(self.execute(sql, params)?)
    }

    /// Execute SQL with typed parameters and return rows as maps.
    pub fn query(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>> {
        self.with_conn(|conn| query_rows(conn, sql, params))
    }

    /// Execute SQL with typed parameters and deserialize each row into `T`.
    pub fn query_into<T: DeserializeOwned>(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<T>> {
        rows_into(self.query(sql, params)?)
    }

    /// Like [`query_into`](Self::query_into) but keeps only the first row.
    pub fn query_one<T: DeserializeOwned>(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Option<T>> {
        Ok(self.query_into(sql, params)?.into_iter().next())
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn query_scalar(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Option<serde_json::Value>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let mut rows = stmt.query(params)?;
            match rows.next()? {
                Some(row) => Ok(Some(convert_value_ref(row.get_ref(0)?))),
                None => Ok(None),
            }
        })
    }

    /// Execute a statement that returns no rows; yields the affected count.
    pub fn run(&self, sql: &str, params: &[&dyn ToSql]) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute(sql, params)?))
    }

    /// Count rows of a table. Only ever called with compile-time table names.
    pub fn count(&self, table: &str) -> Result<i64> {
        let value = self.query_scalar(&format!("SELECT COUNT(*) FROM {}", table), &[])?;
        Ok(value.and_then(|v| v.as_i64()).unwrap_or(0))
    }
}

/// Run a query on an already-locked connection (or transaction).
pub(crate) fn query_rows(conn: &DuckDbConnection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;

    // Column metadata is only reliable after the query has executed.
    let column_names: Vec<String> = rows
        .as_ref()
        .map(|s| s.column_names())
        .unwrap_or_default();

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut map = HashMap::with_capacity(column_names.len());
        for (i, name) in column_names.iter().enumerate() {
            map.insert(name.clone(), convert_value_ref(row.get_ref(i)?));
        }
        out.push(map);
    }
    Ok(out)
}

/// Deserialize map rows into typed models.
pub(crate) fn rows_into<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>> {
    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        let value = serde_json::Value::Object(row.into_iter().collect());
        results.push(serde_json::from_value(value)?);
    }
    Ok(results)
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    use serde_json::Value;

    match val {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(n) => Value::Number(n.into()),
        ValueRef::SmallInt(n) => Value::Number(n.into()),
        ValueRef::Int(n) => Value::Number(n.into()),
        ValueRef::BigInt(n) => Value::Number(n.into()),
        ValueRef::UTinyInt(n) => Value::Number(n.into()),
        ValueRef::USmallInt(n) => Value::Number(n.into()),
        ValueRef::UInt(n) => Value::Number(n.into()),
        ValueRef::UBigInt(n) => Value::Number(n.into()),
        // SUM over BIGINT yields HUGEINT
        ValueRef::HugeInt(n) => match i64::try_from(n) {
            Ok(i) => Value::Number(i.into()),
            Err(_) => Value::String(n.to_string()),
        },
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).to_string()),
        _ => Value::Null,
    }
}
