//! HTTP handlers for single-shot uploads, the upload listing, and raw blob
//! retrieval by key.

use crate::{
    errors::AppError,
    models::{
        scope::StoreScope,
        upload::{UploadEntry, UploadReceipt},
    },
    services::blob_store::BlobStore as _,
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use serde::{Deserialize, Serialize};

/// Query params for the upload endpoints.
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub store: Option<String>,
    pub name: Option<String>,
}

/// Listing wrapper returned by GET `/api/upload`.
#[derive(Serialize, Debug)]
pub struct UploadListing {
    pub files: Vec<UploadEntry>,
}

/// POST `/api/upload?store=` — store one whole file from a multipart `file`
/// field.
pub async fn upload_file(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadReceipt>, AppError> {
    let scope = StoreScope::parse_lenient(query.store.as_deref());

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field.file_name().unwrap_or("upload.bin").to_string();
        let payload = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(err.to_string()))?;
        let receipt = state
            .uploads
            .store_upload(scope, &original_name, payload)
            .await?;
        return Ok(Json(receipt));
    }

    Err(AppError::bad_request("No file provided"))
}

/// GET `/api/upload?store=&name=` — list stored uploads, optionally filtered
/// by name.
pub async fn list_uploads(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
) -> Result<Json<UploadListing>, AppError> {
    let scope = StoreScope::parse_lenient(query.store.as_deref());
    let files = state
        .uploads
        .list_uploads(scope, query.name.as_deref())
        .await?;
    Ok(Json(UploadListing { files }))
}

/// GET `/blobs/{*key}` — serve a raw blob; the locators returned by the
/// store resolve here.
pub async fn get_blob(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let bytes = state.store.fetch(&key).await?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    Ok(response)
}
