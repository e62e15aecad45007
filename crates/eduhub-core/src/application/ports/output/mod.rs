//! Driven (output) ports - implemented by infrastructure.
//!
//! The `eduhub-adapters` crate provides implementations.

use crate::domain::{CollectionSchema, Document, DocumentId, Filter, IndexSpec, Record, Update};
use crate::error::EduhubResult;

/// Outcome of [`DocumentStore::update_one`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// A document matched the filter.
    pub matched: bool,
    /// The matched document actually changed.
    pub modified: bool,
}

/// Port for a document database.
///
/// Implemented by:
/// - `eduhub_adapters::document_store::InMemoryDocumentStore` (tests, demos)
/// - `eduhub_adapters::document_store::JsonFileStore` (CLI, persisted)
///
/// ## Semantics
///
/// - Writes auto-create their collection; reads of an unknown collection
///   see nothing.
/// - Unique indexes are enforced on insert, update and index creation. A
///   violating write fails with `ApplicationError::DuplicateKey` and persists
///   nothing.
/// - A collection may carry a [`CollectionSchema`]. Inserts and updates that
///   break it fail with `ApplicationError::SchemaViolation` and persist
///   nothing. Documents already stored are not re-checked.
/// - `find` returns documents in insertion order.
#[cfg_attr(test, mockall::automock)]
pub trait DocumentStore: Send + Sync {
    /// Create an empty collection. Creating an existing one is a no-op.
    fn create_collection(&self, name: &str) -> EduhubResult<()>;

    /// Drop a collection with its documents and indexes.
    /// Returns whether it existed.
    fn drop_collection(&self, name: &str) -> EduhubResult<bool>;

    /// Names of all collections, sorted.
    fn list_collections(&self) -> EduhubResult<Vec<String>>;

    /// Insert a record and return its new id.
    fn insert_one(&self, collection: &str, record: Record) -> EduhubResult<DocumentId>;

    /// Insert records in order, stopping at the first failure.
    fn insert_many(&self, collection: &str, records: Vec<Record>) -> EduhubResult<Vec<DocumentId>> {
        records
            .into_iter()
            .map(|record| self.insert_one(collection, record))
            .collect()
    }

    fn find(&self, collection: &str, filter: &Filter) -> EduhubResult<Vec<Document>>;

    /// First document matching the filter.
    fn find_one(&self, collection: &str, filter: &Filter) -> EduhubResult<Option<Document>> {
        Ok(self.find(collection, filter)?.into_iter().next())
    }

    /// Apply `update` to the first matching document.
    fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> EduhubResult<UpdateResult>;

    /// Delete the first matching document. Returns the number deleted.
    fn delete_one(&self, collection: &str, filter: &Filter) -> EduhubResult<u64>;

    /// Delete every matching document. Returns the number deleted.
    fn delete_many(&self, collection: &str, filter: &Filter) -> EduhubResult<u64>;

    /// Create an index and return its name.
    ///
    /// Re-creating an identical index is a no-op.
    fn create_index(&self, collection: &str, spec: IndexSpec) -> EduhubResult<String>;

    fn drop_index(&self, collection: &str, name: &str) -> EduhubResult<()>;

    fn list_indexes(&self, collection: &str) -> EduhubResult<Vec<IndexSpec>>;

    /// Attach a schema to a collection (creating it), or remove it with
    /// `None`. Fails with `DomainError::InvalidSchema` for a definition that
    /// cannot be evaluated.
    fn set_schema(&self, collection: &str, schema: Option<CollectionSchema>) -> EduhubResult<()>;

    fn schema(&self, collection: &str) -> EduhubResult<Option<CollectionSchema>>;
}
