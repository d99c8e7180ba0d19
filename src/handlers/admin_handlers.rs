//! Admin-only bulk delete endpoint.

use crate::{
    errors::AppError,
    services::purge_service::{PurgeOutcome, PurgeScope},
    state::AppState,
};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize, Default)]
struct PurgeRequest {
    store: Option<String>,
}

/// POST `/api/admin/purge` — delete every blob under the requested scope's
/// prefixes. Guarded by the configured admin token; the body is an optional
/// JSON `{"store": "files"|"pages"}`, anything else purging all scopes.
pub async fn purge(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PurgeOutcome>, AppError> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return Err(AppError::bad_request("Admin purge token is not configured"));
    };

    let provided = headers.get("x-admin-token").and_then(|v| v.to_str().ok());
    if provided != Some(expected) {
        warn!("purge request rejected: bad or missing admin token");
        return Err(AppError::new(StatusCode::UNAUTHORIZED, "Unauthorized"));
    }

    // Tolerant body parsing: a missing or malformed body purges everything.
    let request: PurgeRequest = serde_json::from_slice(&body).unwrap_or_default();
    let scope = PurgeScope::parse_lenient(request.store.as_deref());

    Ok(Json(state.purge.purge(scope).await))
}
