//! Coupon lookup and submission endpoints.
//!
//! A lookup hands out a correlation id (`RequestID`) that the client later
//! quotes in its callback.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use sugarcube_session::SessionId;
use sugarcube_store::{CouponEntry, Site};
use tracing::debug;

use crate::client_ip::ClientIp;
use crate::error::{Result, ServerError};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response types
// ─────────────────────────────────────────────────────────────────────────────

/// Query parameters for a coupon lookup.
#[derive(Debug, Deserialize)]
pub struct CouponQuery {
    /// Site to look up.
    pub site: Option<String>,
}

/// Coupons for a site plus the correlation id for the callback.
#[derive(Debug, Serialize, Deserialize)]
pub struct CouponLookupResponse {
    /// Correlation id to quote in the callback.
    #[serde(rename = "RequestID")]
    pub request_id: SessionId,
    /// The requested site with its coupons.
    #[serde(rename = "Site")]
    pub site: Site,
}

/// Request to add a coupon to a site.
#[derive(Debug, Deserialize)]
pub struct AddCouponRequest {
    /// Target site.
    pub site: String,
    /// The coupon to add.
    pub coupon: CouponEntry,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/coupons?site=<name> - Fetch a site's coupons and open a session.
pub async fn get_coupons_handler(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Query(query): Query<CouponQuery>,
) -> Result<Json<CouponLookupResponse>> {
    let name = query
        .site
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServerError::BadRequest("Missing site parameter".to_string()))?;

    let site = state.store.get_site(name)?;
    let request_id = state.sessions.create_session(ip);

    debug!(site = %name, request_id = %request_id, ip = %ip, "Coupons served");

    Ok(Json(CouponLookupResponse { request_id, site }))
}

/// POST /api/coupons - Add a coupon to an existing site.
///
/// The site name and code are trimmed; the response echoes the stored entry.
pub async fn add_coupon_handler(
    State(state): State<AppState>,
    Json(request): Json<AddCouponRequest>,
) -> Result<(StatusCode, Json<CouponEntry>)> {
    let AddCouponRequest { site, mut coupon } = request;
    coupon.coupon = coupon.coupon.trim().to_string();

    state.store.add_coupon(site.trim(), &coupon)?;
    Ok((StatusCode::CREATED, Json(coupon)))
}
