//! SQLite storage for the CRM.
//!
//! One file per aggregate (`customers`, `properties`, ...) adds its methods to
//! [`CrmDb`]; this module owns the connection, the schema and the row helpers
//! they share.

mod brokers;
mod categories;
mod customers;
mod interactions;
mod interests;
mod metrics;
mod properties;
mod visits;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use estate_common::ParseEnumError;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::de::DeserializeOwned;

use crate::errors::{CrmError, CrmResult};

pub use metrics::month_start;

/// Async-safe handle to the CRM database.
///
/// Wraps `CrmDb` behind `Arc<Mutex>` and runs all access on tokio's blocking
/// thread pool via `spawn_blocking`, so synchronous SQLite I/O never ties up
/// the async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<CrmDb>>,
}

impl DbHandle {
    pub fn new(db: CrmDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> CrmResult<R>
    where
        F: FnOnce(&CrmDb) -> CrmResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| CrmError::LockPoisoned)?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

pub struct CrmDb {
    conn: Connection,
}

impl CrmDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database at {}", path.display()))?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> anyhow::Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    fn run_migrations(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS brokers (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    phone TEXT NOT NULL,
                    alternate_phone TEXT,
                    address TEXT,
                    city TEXT,
                    state TEXT,
                    pincode TEXT,
                    affiliation TEXT NOT NULL DEFAULT 'internal',
                    company TEXT,
                    experience INTEGER,
                    specialization TEXT NOT NULL DEFAULT '[]',
                    territory TEXT,
                    commission_rate REAL NOT NULL DEFAULT 2.5,
                    total_commission REAL NOT NULL DEFAULT 0,
                    total_deals INTEGER NOT NULL DEFAULT 0,
                    rating REAL NOT NULL DEFAULT 0,
                    notes TEXT,
                    status TEXT NOT NULL DEFAULT 'active',
                    joined_date TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS customers (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    phone TEXT NOT NULL,
                    alternate_phone TEXT,
                    address TEXT,
                    city TEXT,
                    state TEXT,
                    pincode TEXT,
                    occupation TEXT,
                    priority TEXT NOT NULL DEFAULT 'medium',
                    purpose TEXT NOT NULL DEFAULT 'buy',
                    budget_min REAL,
                    budget_max REAL,
                    property_type TEXT,
                    preferred_locations TEXT NOT NULL DEFAULT '[]',
                    bedrooms INTEGER,
                    bathrooms INTEGER,
                    min_area REAL,
                    max_area REAL,
                    furnishing TEXT,
                    parking INTEGER NOT NULL DEFAULT 0,
                    amenities TEXT NOT NULL DEFAULT '[]',
                    notes TEXT,
                    status TEXT NOT NULL DEFAULT 'active',
                    assigned_broker_id INTEGER REFERENCES brokers(id) ON DELETE SET NULL,
                    last_interaction_date TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS properties (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    description TEXT,
                    category TEXT NOT NULL,
                    price REAL NOT NULL,
                    location TEXT NOT NULL,
                    address TEXT,
                    latitude REAL,
                    longitude REAL,
                    city TEXT,
                    state TEXT,
                    pincode TEXT,
                    bedrooms INTEGER,
                    bathrooms INTEGER,
                    area REAL,
                    owner_name TEXT,
                    owner_contact TEXT,
                    images TEXT NOT NULL DEFAULT '[]',
                    amenities TEXT NOT NULL DEFAULT '[]',
                    furnishing TEXT,
                    parking INTEGER NOT NULL DEFAULT 0,
                    facing TEXT,
                    floor INTEGER,
                    total_floors INTEGER,
                    age INTEGER,
                    status TEXT NOT NULL DEFAULT 'available',
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS visits (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    customer_id INTEGER NOT NULL REFERENCES customers(id) ON DELETE RESTRICT,
                    property_id INTEGER NOT NULL REFERENCES properties(id) ON DELETE RESTRICT,
                    broker_id INTEGER REFERENCES brokers(id) ON DELETE SET NULL,
                    visit_date TEXT NOT NULL,
                    feedback TEXT,
                    rating INTEGER,
                    notes TEXT,
                    status TEXT NOT NULL DEFAULT 'completed',
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS interactions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    customer_id INTEGER NOT NULL REFERENCES customers(id) ON DELETE RESTRICT,
                    broker_id INTEGER NOT NULL REFERENCES brokers(id) ON DELETE RESTRICT,
                    type TEXT NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT,
                    shared_properties TEXT NOT NULL DEFAULT '[]',
                    shortlisted_properties TEXT NOT NULL DEFAULT '[]',
                    property_id INTEGER REFERENCES properties(id) ON DELETE SET NULL,
                    visit_date TEXT,
                    customer_feedback TEXT,
                    rating INTEGER,
                    scheduled_date TEXT,
                    completed_date TEXT,
                    next_follow_up_date TEXT,
                    priority TEXT NOT NULL DEFAULT 'medium',
                    status TEXT NOT NULL DEFAULT 'pending',
                    pause_reason TEXT,
                    end_reason TEXT,
                    reminder_sent INTEGER NOT NULL DEFAULT 0,
                    last_reminder_date TEXT,
                    notes TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS property_interests (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    customer_id INTEGER NOT NULL REFERENCES customers(id) ON DELETE RESTRICT,
                    property_id INTEGER NOT NULL REFERENCES properties(id) ON DELETE RESTRICT,
                    interest_level TEXT NOT NULL,
                    source TEXT,
                    interaction_id INTEGER REFERENCES interactions(id) ON DELETE SET NULL,
                    notes TEXT,
                    created_at TEXT NOT NULL,
                    UNIQUE(customer_id, property_id)
                );

                CREATE TABLE IF NOT EXISTS property_categories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    description TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS property_subcategories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    category_id INTEGER NOT NULL REFERENCES property_categories(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    description TEXT,
                    created_at TEXT NOT NULL,
                    UNIQUE(category_id, name)
                );

                CREATE INDEX IF NOT EXISTS idx_customers_broker ON customers(assigned_broker_id);
                CREATE INDEX IF NOT EXISTS idx_visits_customer ON visits(customer_id);
                CREATE INDEX IF NOT EXISTS idx_visits_property ON visits(property_id);
                CREATE INDEX IF NOT EXISTS idx_interactions_customer ON interactions(customer_id);
                CREATE INDEX IF NOT EXISTS idx_interactions_broker ON interactions(broker_id);
                CREATE INDEX IF NOT EXISTS idx_interactions_status ON interactions(status, updated_at);
                CREATE INDEX IF NOT EXISTS idx_subcategories_category ON property_subcategories(category_id);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    /// Fail with `Validation` unless `table` has a row with `id`.
    fn ensure_exists(&self, table: &str, entity: &str, id: i64) -> CrmResult<()> {
        let found = self
            .conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE id = ?1", table),
                params![id],
                |_| Ok(()),
            )
            .optional()
            .with_context(|| format!("Failed to look up {} {}", entity, id))?;
        match found {
            Some(()) => Ok(()),
            None => Err(CrmError::validation(format!("{} {} does not exist", entity, id))),
        }
    }

    fn count(&self, sql: &str, params: impl rusqlite::Params) -> CrmResult<i64> {
        let n = self
            .conn
            .query_row(sql, params, |row| row.get(0))
            .with_context(|| format!("Failed to run count query: {}", sql))?;
        Ok(n)
    }

    /// Run `f` in a transaction so a failure part-way rolls back every write
    /// it made. Calls made while a transaction is open join it.
    pub fn transaction<R>(&self, f: impl FnOnce(&Self) -> CrmResult<R>) -> CrmResult<R> {
        if !self.conn.is_autocommit() {
            return f(self);
        }
        // unchecked_transaction is sound here: DbHandle's Mutex serializes access.
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        let result = f(self)?;
        tx.commit().context("Failed to commit transaction")?;
        Ok(result)
    }

    /// Number of rows in `table` (for tests and the seed command).
    pub fn row_count(&self, table: &str) -> CrmResult<i64> {
        self.count(&format!("SELECT COUNT(*) FROM {}", table), [])
    }
}

/// `None` for a record that has not been inserted yet, so SQLite assigns the id.
fn row_id(id: i64) -> Option<i64> {
    (id != 0).then_some(id)
}

fn conversion_error(
    row: &Row<'_>,
    column: &str,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    match row.as_ref().column_index(column) {
        Ok(idx) => rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)),
        Err(e) => e,
    }
}

/// Read a text column holding an enum wire string.
fn enum_col<T>(row: &Row<'_>, column: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    let raw: String = row.get(column)?;
    raw.parse().map_err(|e| conversion_error(row, column, e))
}

fn opt_enum_col<T>(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = ParseEnumError>,
{
    let raw: Option<String> = row.get(column)?;
    raw.map(|s| s.parse().map_err(|e| conversion_error(row, column, e)))
        .transpose()
}

/// Read a text column holding a JSON array.
fn json_col<T: DeserializeOwned>(row: &Row<'_>, column: &str) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(row, column, e))
}

fn to_json<T: serde::Serialize>(value: &T, what: &str) -> CrmResult<String> {
    let json = serde_json::to_string(value)
        .with_context(|| format!("Failed to serialize {}", what))?;
    Ok(json)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_database_and_run_migrations() -> anyhow::Result<()> {
        let db = CrmDb::new_in_memory()?;

        let table_count: i32 = db.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN
             ('customers', 'properties', 'brokers', 'visits', 'interactions',
              'property_interests', 'property_categories', 'property_subcategories')",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(table_count, 8, "Expected 8 tables to exist");

        let fk: i32 = db.conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        assert_eq!(fk, 1, "Foreign keys must be enforced");
        Ok(())
    }

    #[test]
    fn test_migrations_are_idempotent() -> anyhow::Result<()> {
        let db = CrmDb::new_in_memory()?;
        db.run_migrations()?;
        db.run_migrations()?;
        assert_eq!(db.row_count("customers")?, 0);
        Ok(())
    }

    #[test]
    fn test_open_file_database_creates_parent_dirs() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("crm.db");
        let db = CrmDb::new(&path)?;
        assert!(path.exists());
        assert_eq!(db.row_count("brokers")?, 0);
        Ok(())
    }

    #[test]
    fn test_ensure_exists_names_missing_entity() {
        let db = CrmDb::new_in_memory().unwrap();
        let err = db.ensure_exists("brokers", "Broker", 9).unwrap_err();
        assert_eq!(err.to_string(), "Broker 9 does not exist");
    }

    #[test]
    fn test_transaction_rolls_back_on_error() -> anyhow::Result<()> {
        let db = CrmDb::new_in_memory()?;
        let result: CrmResult<()> = db.transaction(|db| {
            db.conn.execute(
                "INSERT INTO brokers (name, email, phone, created_at) VALUES ('A', 'a@x.com', '1', ?1)",
                params![chrono::Utc::now()],
            )?;
            db.transaction(|_| Err(CrmError::validation("nested failure")))
        });
        assert!(matches!(result, Err(CrmError::Validation(_))));
        assert_eq!(db.row_count("brokers")?, 0);
        assert!(db.conn.is_autocommit());
        Ok(())
    }

    #[test]
    fn test_transaction_commits_on_success() -> anyhow::Result<()> {
        let db = CrmDb::new_in_memory()?;
        db.transaction(|db| {
            db.conn.execute(
                "INSERT INTO brokers (name, email, phone, created_at) VALUES ('A', 'a@x.com', '1', ?1)",
                params![chrono::Utc::now()],
            )?;
            Ok(())
        })?;
        assert_eq!(db.row_count("brokers")?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_db_handle_runs_on_blocking_pool() {
        let handle = DbHandle::new(CrmDb::new_in_memory().unwrap());
        let n = handle.call(|db| db.row_count("visits")).await.unwrap();
        assert_eq!(n, 0);
    }
}
