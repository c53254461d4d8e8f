//! Site registration endpoint.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::AppState;

/// Request body for registering a site, also returned on success.
#[derive(Debug, Serialize, Deserialize)]
pub struct SiteRequest {
    /// Site URL or host name.
    pub name: String,
}

/// POST /api/site - Register a new site.
pub async fn add_site_handler(
    State(state): State<AppState>,
    Json(request): Json<SiteRequest>,
) -> Result<(StatusCode, Json<SiteRequest>)> {
    let name = request.name.trim().to_string();
    state.store.add_site(&name)?;
    tracing::info!(site = %name, "Site registered");
    Ok((StatusCode::CREATED, Json(SiteRequest { name })))
}
