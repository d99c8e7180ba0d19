//! Core data models for the file-share service.
//!
//! These types describe the manifest persisted next to chunked uploads, the
//! scope namespaces partitioning them, and the wire records for upload
//! listings. They serialize via `serde` with camelCase field names matching
//! the persisted and HTTP JSON formats.

pub mod manifest;
pub mod scope;
pub mod upload;
