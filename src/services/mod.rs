//! Service layer: the blob store collaborator and the operations built on it.

pub mod blob_store;
pub mod chunk_service;
pub mod purge_service;
pub mod upload_service;
