use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, Row};
use std::path::Path;

use crate::error::Result;

use super::tables::SCHEMA;

/// The catalog store: one SQLite connection plus the upsert and query
/// operations over the catalog tables.
///
/// The connection is owned by the store for its whole life. Callers that
/// share a store across threads wrap it in a mutex; every operation then
/// runs under one scoped acquisition.
#[derive(Debug)]
pub struct Database {
    pub(super) conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and create the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    /// Wrap an existing connection, enabling foreign keys and creating any
    /// missing tables.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        log::debug!("Catalog schema ready");
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Whether `err` is a UNIQUE or PRIMARY KEY violation, i.e. a natural-key
/// conflict. NOT NULL, CHECK and FOREIGN KEY failures share the same primary
/// code and must not be mistaken for one.
pub(super) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}

/// Second half of the insert-then-select upsert.
///
/// On success the new rowid is returned. On a natural-key conflict the
/// existing row is looked up and its id returned instead. Any other failure,
/// or a conflict whose row cannot be found, propagates.
///
/// A concurrent writer could change the conflicting row between the failed
/// insert and the lookup. The store owns a single connection, so that window
/// is only reachable from another process writing the same file.
pub(super) fn resolve_conflict<T: From<i64>>(
    conn: &Connection,
    inserted: rusqlite::Result<usize>,
    entity: &str,
    lookup: impl FnOnce() -> rusqlite::Result<Option<T>>,
) -> Result<T> {
    match inserted {
        Ok(_) => Ok(T::from(conn.last_insert_rowid())),
        Err(err) if is_unique_violation(&err) => match lookup()? {
            Some(id) => {
                log::debug!("{} already catalogued, reusing existing row", entity);
                Ok(id)
            }
            None => Err(err.into()),
        },
        Err(err) => Err(err.into()),
    }
}

/// Read an RFC 3339 timestamp column.
pub(super) fn get_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_open_in_memory_creates_tables() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN (
                    'composers', 'works', 'performers', 'labels', 'recordings',
                    'recording_works', 'recording_performers', 'scraped_pages')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 8);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::open_in_memory().unwrap();
        let enabled: i64 = db
            .conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        drop(Database::open(&path).unwrap());
        assert!(Database::open(&path).is_ok());
    }

    #[test]
    fn test_unique_violation_detection() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (name TEXT NOT NULL UNIQUE);
             INSERT INTO t (name) VALUES ('a');",
        )
        .unwrap();

        let duplicate = conn.execute("INSERT INTO t (name) VALUES ('a')", []).unwrap_err();
        assert!(is_unique_violation(&duplicate));

        let not_null = conn.execute("INSERT INTO t (name) VALUES (NULL)", []).unwrap_err();
        assert!(!is_unique_violation(&not_null));
    }
}
