//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks storage round-trip I/O

use crate::{services::blob_store::BlobStore as _, state::AppState};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that performs a best-effort put/fetch/delete round-trip
/// against the blob store under a throwaway key.
///
/// Returns JSON describing the check. HTTP 200 when it passes,
/// HTTP 503 when it fails.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let probe_key = format!(".readyz/{}", Uuid::new_v4());
    let storage_check = match state
        .store
        .put(&probe_key, Bytes::from_static(b"readyz"))
        .await
    {
        Ok(_) => match state.store.fetch(&probe_key).await {
            Ok(bytes) => {
                if &bytes[..] == b"readyz" {
                    // try to remove the probe blob; report a removal failure but stay ready
                    match state.store.delete(&probe_key).await {
                        Ok(_) => (true, None::<String>),
                        Err(e) => (true, Some(format!("could not remove probe blob: {}", e))),
                    }
                } else {
                    let _ = state.store.delete(&probe_key).await; // best-effort cleanup
                    (false, Some("probe content mismatch".to_string()))
                }
            }
            Err(e) => {
                let _ = state.store.delete(&probe_key).await; // best-effort cleanup
                (false, Some(format!("could not fetch probe blob: {}", e)))
            }
        },
        Err(e) => (false, Some(format!("could not write probe blob: {}", e))),
    };

    let storage_ok = storage_check.0;

    let mut checks = HashMap::new();
    checks.insert(
        "storage",
        CheckStatus {
            ok: storage_ok,
            error: storage_check.1,
        },
    );

    let body = ReadyResponse {
        status: if storage_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if storage_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
