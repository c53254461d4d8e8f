//! Stored data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A coupon code submitted for a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponEntry {
    /// The code itself. Unique within a site.
    pub coupon: String,

    /// Effectiveness score; failed callbacks lower it.
    #[serde(default)]
    pub score: i64,

    /// When the code stops being valid (ISO 8601).
    pub expires_at: DateTime<Utc>,

    /// Site-specific extra fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CouponEntry {
    /// Create an entry with a zero score and no extra fields.
    pub fn new(coupon: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            coupon: coupon.into(),
            score: 0,
            expires_at,
            extra: Map::new(),
        }
    }

    /// Set the initial score.
    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }

    /// Add an extra field.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// A site and its coupons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Site URL or host name.
    pub name: String,

    /// Coupons known for the site.
    pub coupon_entries: Vec<CouponEntry>,
}

/// Per-site count of coupons removed by a prune pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneReport {
    /// Site name.
    pub site: String,
    /// Number of coupons deleted.
    pub deleted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_fields_are_flattened() {
        let entry = CouponEntry::new("SAVE10", DateTime::from_timestamp(1_800_000_000, 0).unwrap())
            .with_extra("min_order", 50);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["coupon"], "SAVE10");
        assert_eq!(json["score"], 0);
        assert_eq!(json["min_order"], 50);
        assert!(json.get("extra").is_none());
    }

    #[test]
    fn test_deserialize_without_score() {
        let entry: CouponEntry = serde_json::from_str(
            r#"{"coupon":"SAVE20","expires_at":"2030-01-01T00:00:00Z","region":"eu"}"#,
        )
        .unwrap();

        assert_eq!(entry.score, 0);
        assert_eq!(entry.extra.get("region"), Some(&Value::from("eu")));
    }
}
