//! Site and coupon operations.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use super::{CouponStore, parse_dt};
use crate::error::{Result, StoreError};
use crate::types::{CouponEntry, PruneReport, Site};

fn site_exists(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM sites WHERE name = ?1", params![name], |_| Ok(()))
        .optional()?
        .is_some())
}

fn require_site(conn: &Connection, name: &str) -> Result<()> {
    if site_exists(conn, name)? {
        Ok(())
    } else {
        Err(StoreError::NotFound(format!("site '{}'", name)))
    }
}

impl CouponStore {
    /// Register a new site.
    pub fn add_site(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidData("site name is empty".to_string()));
        }

        let inserted = self.conn().execute(
            "INSERT OR IGNORE INTO sites (name, created_at) VALUES (?1, ?2)",
            params![name, Utc::now().to_rfc3339()],
        )?;

        if inserted == 0 {
            return Err(StoreError::AlreadyExists(format!("site '{}'", name)));
        }

        debug!(site = %name, "Site added");
        Ok(())
    }

    /// Whether a site is registered.
    pub fn site_exists(&self, name: &str) -> Result<bool> {
        site_exists(&self.conn(), name)
    }

    /// Fetch a site with all of its coupons, best score first.
    pub fn get_site(&self, name: &str) -> Result<Site> {
        let conn = self.conn();
        require_site(&conn, name)?;

        let mut stmt = conn.prepare(
            "SELECT coupon, score, expires_at, extra FROM coupons
             WHERE site = ?1 ORDER BY score DESC, coupon ASC",
        )?;
        let rows = stmt.query_map(params![name], |row| {
            let expires_at: String = row.get(2)?;
            let extra: String = row.get(3)?;
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, parse_dt(2, &expires_at)?, extra))
        })?;

        let mut coupon_entries = Vec::new();
        for row in rows {
            let (coupon, score, expires_at, extra) = row?;
            coupon_entries.push(CouponEntry {
                coupon,
                score,
                expires_at,
                extra: serde_json::from_str(&extra)?,
            });
        }

        Ok(Site {
            name: name.to_string(),
            coupon_entries,
        })
    }

    /// Add a coupon to an existing site.
    pub fn add_coupon(&self, site: &str, entry: &CouponEntry) -> Result<()> {
        let site = site.trim();
        let code = entry.coupon.trim();
        if code.is_empty() {
            return Err(StoreError::InvalidData("coupon code is empty".to_string()));
        }

        let extra = serde_json::to_string(&entry.extra)?;
        let conn = self.conn();
        require_site(&conn, site)?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO coupons (site, coupon, score, expires_at, extra)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![site, code, entry.score, entry.expires_at.to_rfc3339(), extra],
        )?;

        if inserted == 0 {
            return Err(StoreError::AlreadyExists(format!("coupon '{}'", code)));
        }

        debug!(site = %site, coupon = %code, "Coupon added");
        Ok(())
    }

    /// Apply the results reported by a callback.
    ///
    /// Every coupon reported as not working loses one point. Codes the site
    /// does not know are ignored. Returns the number of coupons updated.
    pub fn apply_callback_results(&self, site: &str, results: &HashMap<String, bool>) -> Result<usize> {
        let mut conn = self.conn();
        require_site(&conn, site)?;

        let tx = conn.transaction()?;
        let mut updated = 0;
        {
            let mut stmt =
                tx.prepare("UPDATE coupons SET score = score - 1 WHERE site = ?1 AND coupon = ?2")?;
            for (code, _) in results.iter().filter(|(_, worked)| !**worked) {
                updated += stmt.execute(params![site, code])?;
            }
        }
        tx.commit()?;

        Ok(updated)
    }

    /// Delete every coupon with a negative score, across all sites.
    pub fn prune_negative_coupons(&self) -> Result<Vec<PruneReport>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let reports = {
            let mut stmt = tx.prepare(
                "SELECT site, COUNT(*) FROM coupons WHERE score < 0 GROUP BY site ORDER BY site",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(PruneReport {
                    site: row.get(0)?,
                    deleted: row.get::<_, i64>(1)? as usize,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        tx.execute("DELETE FROM coupons WHERE score < 0", [])?;
        tx.commit()?;

        Ok(reports)
    }
}
