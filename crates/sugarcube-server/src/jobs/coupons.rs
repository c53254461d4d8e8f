//! Negative-score coupon pruning.

use std::sync::Arc;

use sugarcube_store::CouponStore;
use tracing::{debug, error, info};

/// Delete every coupon whose score dropped below zero.
///
/// Returns the number of deleted coupons.
pub async fn prune_negative_scores(store: Arc<CouponStore>) -> usize {
    let reports = match tokio::task::spawn_blocking(move || store.prune_negative_coupons()).await {
        Ok(Ok(reports)) => reports,
        Ok(Err(e)) => {
            error!(error = %e, "Failed to prune negative-score coupons");
            return 0;
        }
        Err(e) => {
            error!(error = %e, "Coupon prune task failed");
            return 0;
        }
    };

    if reports.is_empty() {
        debug!("Coupon prune: no negative-score coupons");
        return 0;
    }

    for report in &reports {
        info!(site = %report.site, deleted = report.deleted, "Pruned negative-score coupons");
    }
    reports.iter().map(|r| r.deleted).sum()
}
