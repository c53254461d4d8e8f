//! IP ban list operations.

use chrono::Utc;
use rusqlite::{OptionalExtension, params};

use super::CouponStore;
use crate::error::Result;

/// Addresses written per ban list transaction.
pub const BAN_INSERT_CHUNK: usize = 500;

impl CouponStore {
    /// Whether `ip` is on the ban list. Matches the exact address string.
    pub fn is_banned(&self, ip: &str) -> Result<bool> {
        Ok(self
            .conn()
            .query_row("SELECT 1 FROM ip_bans WHERE ip = ?1", params![ip], |_| Ok(()))
            .optional()?
            .is_some())
    }

    /// Add addresses to the ban list, skipping ones already present.
    ///
    /// Rows are committed in transactions of [`BAN_INSERT_CHUNK`] addresses,
    /// releasing the connection between chunks so lookups are not stalled
    /// for the whole list. Returns the number of newly inserted addresses.
    pub fn insert_bans<I, S>(&self, ips: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let now = Utc::now().to_rfc3339();
        let mut ips = ips.into_iter().peekable();
        let mut inserted = 0;

        while ips.peek().is_some() {
            let mut conn = self.conn();
            let tx = conn.transaction()?;
            {
                let mut stmt = tx
                    .prepare_cached("INSERT OR IGNORE INTO ip_bans (ip, added_at) VALUES (?1, ?2)")?;
                for ip in ips.by_ref().take(BAN_INSERT_CHUNK) {
                    inserted += stmt.execute(params![ip.as_ref(), now])?;
                }
            }
            tx.commit()?;
        }

        Ok(inserted)
    }

    /// Number of banned addresses.
    pub fn ban_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM ip_bans", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ban_lookup() {
        let store = CouponStore::open_in_memory().unwrap();
        assert!(!store.is_banned("203.0.113.9").unwrap());

        store.insert_bans(["203.0.113.9"]).unwrap();
        assert!(store.is_banned("203.0.113.9").unwrap());
        assert!(!store.is_banned("203.0.113.10").unwrap());
    }

    #[test]
    fn test_insert_bans_skips_duplicates() {
        let store = CouponStore::open_in_memory().unwrap();
        let first = store
            .insert_bans(vec!["198.51.100.1".to_string(), "198.51.100.2".to_string()])
            .unwrap();
        assert_eq!(first, 2);

        let second = store
            .insert_bans(["198.51.100.2", "198.51.100.3", "198.51.100.3"])
            .unwrap();
        assert_eq!(second, 1);
        assert_eq!(store.ban_count().unwrap(), 3);
    }

    fn addresses(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("10.{}.{}.{}", (i >> 16) & 0xff, (i >> 8) & 0xff, i & 0xff))
            .collect()
    }

    #[test]
    fn test_insert_bans_across_chunks() {
        let store = CouponStore::open_in_memory().unwrap();
        let ips = addresses(2 * BAN_INSERT_CHUNK + 7);

        assert_eq!(store.insert_bans(&ips).unwrap(), ips.len());
        assert_eq!(store.ban_count().unwrap(), ips.len());
        assert!(store.is_banned(&ips[BAN_INSERT_CHUNK]).unwrap());
        assert!(store.is_banned(ips.last().unwrap()).unwrap());
    }

    #[test]
    fn test_lookups_proceed_during_large_insert() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let store = CouponStore::open_in_memory().unwrap();
        let ips = addresses(200 * BAN_INSERT_CHUNK);
        let done = AtomicBool::new(false);

        let partial_seen = std::thread::scope(|scope| {
            scope.spawn(|| {
                store.insert_bans(&ips).unwrap();
                done.store(true, Ordering::SeqCst);
            });

            let mut partial_seen = false;
            while !done.load(Ordering::SeqCst) {
                let count = store.ban_count().unwrap();
                partial_seen |= count > 0 && count < ips.len();
            }
            partial_seen
        });

        assert!(partial_seen);
        assert_eq!(store.ban_count().unwrap(), ips.len());
    }
}
