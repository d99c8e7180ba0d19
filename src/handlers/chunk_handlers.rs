//! HTTP handlers for the chunked transfer endpoints.
//! Streams download bodies chunk-by-chunk and delegates storage concerns to
//! `ChunkService`.

use crate::{
    errors::AppError,
    models::scope::StoreScope,
    services::chunk_service::{ChunkUpload, ChunkWriteResult},
    state::AppState,
};
use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;

/// Characters escaped in the disposition filename; everything outside the
/// `encodeURIComponent` survivor set.
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Query params accepted by the chunk upload endpoint.
#[derive(Debug, Deserialize)]
pub struct ChunkQuery {
    pub store: Option<String>,
}

/// Query params accepted by the download endpoint.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub id: Option<String>,
    pub store: Option<String>,
}

/// POST `/api/chunk?store=` — persist one chunk delivered as a raw body with
/// `x-file-id` / `x-chunk-index` / `x-total-chunks` / `x-total-size` headers.
pub async fn upload_chunk(
    State(state): State<AppState>,
    Query(query): Query<ChunkQuery>,
    headers: HeaderMap,
    payload: Bytes,
) -> Result<Json<ChunkWriteResult>, AppError> {
    let scope = StoreScope::parse_lenient(query.store.as_deref());
    let upload = parse_chunk_headers(&headers, scope)?;
    let result = state.chunks.write_chunk(&upload, payload).await?;
    Ok(Json(result))
}

/// GET `/api/download?id=&store=` — stream the reassembled file.
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    let file_id = query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing id"))?;
    let scope = StoreScope::parse_lenient(query.store.as_deref());

    let download = state.chunks.open_download(scope, file_id).await?;

    let mut response = Response::new(Body::from_stream(download.stream));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();

    let content_type = if download.manifest.content_type.is_empty() {
        "application/octet-stream"
    } else {
        download.manifest.content_type.as_str()
    };
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    let filename =
        utf8_percent_encode(&download.manifest.original_name, FILENAME_ENCODE_SET).to_string();
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );

    if let Some(length) = download.content_length {
        headers.insert(
            header::CONTENT_LENGTH,
            HeaderValue::from_str(&length.to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("0")),
        );
    }

    Ok(response)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Pull the chunk metadata out of the request headers. All four required
/// fields must be present and the numeric ones must parse.
fn parse_chunk_headers(headers: &HeaderMap, scope: StoreScope) -> Result<ChunkUpload, AppError> {
    let (Some(file_id), Some(chunk_index), Some(total_chunks), Some(total_size)) = (
        header_str(headers, "x-file-id"),
        header_str(headers, "x-chunk-index"),
        header_str(headers, "x-total-chunks"),
        header_str(headers, "x-total-size"),
    ) else {
        return Err(AppError::bad_request(
            "Missing chunk metadata headers (file-id, chunk-index, total-chunks, total-size).",
        ));
    };

    let invalid = || AppError::bad_request("Invalid chunk indexes.");
    let chunk_index: u64 = chunk_index.parse().map_err(|_| invalid())?;
    let total_chunks: u64 = total_chunks.parse().map_err(|_| invalid())?;
    let total_size: u64 = total_size.parse().map_err(|_| invalid())?;

    Ok(ChunkUpload {
        scope,
        file_id: file_id.to_string(),
        chunk_index,
        total_chunks,
        total_size,
        original_name: header_str(headers, "x-original-name")
            .unwrap_or("upload.bin")
            .to_string(),
        content_type: header_str(headers, "x-content-type")
            .unwrap_or("application/octet-stream")
            .to_string(),
    })
}
