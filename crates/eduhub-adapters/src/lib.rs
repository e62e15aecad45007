//! Infrastructure adapters for EduHub.
//!
//! This crate implements the ports defined in `eduhub-core::application::ports`.
//! It contains all storage I/O.

pub mod document_store;

// Re-export commonly used adapters
pub use document_store::{InMemoryDocumentStore, JsonFileStore};
