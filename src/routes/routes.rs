//! Defines routes for all upload, download, and admin operations.
//!
//! ## Structure
//! - **Chunked transfer endpoints**
//!   - `POST /api/chunk` — persist one chunk (`?store=`, metadata headers)
//!   - `GET  /api/download` — stream the reassembled file (`?id=&store=`)
//!
//! - **Single-shot upload endpoints**
//!   - `POST /api/upload` — store one whole file (multipart `file` field)
//!   - `GET  /api/upload` — list stored uploads (`?store=&name=`)
//!
//! - **Raw blobs**
//!   - `GET  /blobs/{*key}` — fetch a blob by key (locator target)
//!
//! - **Admin**
//!   - `POST /api/admin/purge` — bulk delete by scope (`x-admin-token`)
//!
//! The wildcard `*key` allows nested keys like `uploads/files/123-img.jpg`.

use crate::{
    handlers::{
        admin_handlers::purge,
        chunk_handlers::{download, upload_chunk},
        health_handlers::{healthz, readyz},
        upload_handlers::{get_blob, list_uploads, upload_file},
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Upper bound on chunk and multipart bodies. Clients are expected to keep
/// chunks far below this; the default axum limit (2 MiB) sits exactly at the
/// common chunk size and would reject full-size chunks.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Build and return the router for all endpoints.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // chunked transfer
        .route("/api/chunk", post(upload_chunk))
        .route("/api/download", get(download))
        // single-shot uploads
        .route("/api/upload", post(upload_file).get(list_uploads))
        // raw blob fetch
        .route("/blobs/{*key}", get(get_blob))
        // admin
        .route("/api/admin/purge", post(purge))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
