//! Result callback endpoint.

use std::collections::HashMap;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use sugarcube_session::SessionId;

use crate::error::Result;
use crate::state::AppState;

/// Results reported by a client after trying a site's coupons.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallbackRequest {
    /// Correlation id from the coupon lookup.
    #[serde(rename = "RequestID")]
    pub request_id: SessionId,
    /// Site the coupons belong to.
    #[serde(rename = "Site")]
    pub site: String,
    /// Coupon code to whether it worked.
    #[serde(rename = "Results")]
    pub results: HashMap<String, bool>,
}

/// Callback outcome.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallbackResponse {
    /// Number of coupons whose score changed.
    pub updated: usize,
}

/// POST /api/callback - Apply a client's coupon results.
///
/// The correlation session is consumed: a second callback with the same id
/// is rejected as not found.
pub async fn callback_handler(
    State(state): State<AppState>,
    Json(request): Json<CallbackRequest>,
) -> Result<Json<CallbackResponse>> {
    state.sessions.take_session(&request.request_id)?;

    let updated = state
        .store
        .apply_callback_results(&request.site, &request.results)?;

    tracing::info!(
        request_id = %request.request_id,
        site = %request.site,
        reported = request.results.len(),
        updated,
        "Callback applied"
    );

    Ok(Json(CallbackResponse { updated }))
}
