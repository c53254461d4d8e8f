//! Coupon store implementation using SQLite.
//!
//! Sites own their coupon rows (cascade delete); coupon codes are unique per
//! site. The ban list is a flat table of IP address strings.

mod ban_ops;
mod site_ops;

pub use ban_ops::BAN_INSERT_CHUNK;

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use crate::error::{Result, StoreError};

// ─────────────────────────────────────────────────────────────────────────────
// Schema Version
// ─────────────────────────────────────────────────────────────────────────────

/// Current schema version for migrations.
const SCHEMA_VERSION: i32 = 1;

// ─────────────────────────────────────────────────────────────────────────────
// Coupon Store
// ─────────────────────────────────────────────────────────────────────────────

/// Coupon and ban-list store backed by SQLite.
///
/// Uses WAL mode when opened on disk.
pub struct CouponStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for CouponStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CouponStore").finish_non_exhaustive()
    }
}

impl CouponStore {
    /// Open or create a store at the given path.
    ///
    /// Creates the database file and parent directories if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::InvalidData(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;

        info!("Coupon store opened at {:?}", path);
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;

        debug!("In-memory coupon store created");
        Ok(store)
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.conn();
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let current_version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0);

        if current_version >= SCHEMA_VERSION {
            debug!("Schema up to date (version {})", current_version);
            return Ok(());
        }

        info!(
            "Migrating schema from version {} to {}",
            current_version, SCHEMA_VERSION
        );

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sites (
                name TEXT PRIMARY KEY,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS coupons (
                site TEXT NOT NULL REFERENCES sites(name) ON DELETE CASCADE,
                coupon TEXT NOT NULL,
                score INTEGER NOT NULL DEFAULT 0,
                expires_at TEXT NOT NULL,
                extra TEXT NOT NULL DEFAULT '{}',
                PRIMARY KEY (site, coupon)
            );

            -- Negative-score pruning scans by score
            CREATE INDEX IF NOT EXISTS idx_coupons_score ON coupons(score);

            CREATE TABLE IF NOT EXISTS ip_bans (
                ip TEXT PRIMARY KEY,
                added_at TEXT NOT NULL
            );
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }
}

/// Parse an RFC 3339 timestamp stored in column `idx`.
pub(crate) fn parse_dt(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let store = CouponStore::open_in_memory().unwrap();
        assert_eq!(store.ban_count().unwrap(), 0);
    }

    #[test]
    fn test_open_on_disk_creates_parent_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sugarcube.db");

        {
            let store = CouponStore::open(&path).unwrap();
            store.add_site("example.com").unwrap();
        }

        let store = CouponStore::open(&path).unwrap();
        assert!(store.site_exists("example.com").unwrap());
    }

    #[test]
    fn test_parse_dt_rejects_garbage() {
        assert!(parse_dt(0, "2030-01-01T00:00:00Z").is_ok());
        assert!(parse_dt(0, "yesterday").is_err());
    }
}
