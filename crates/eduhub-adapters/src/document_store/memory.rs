//! In-memory document store.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use eduhub_core::{
    application::{
        ApplicationError,
        ports::{DocumentStore, UpdateResult},
    },
    domain::{CollectionSchema, Document, DocumentId, Filter, IndexSpec, Record, Update},
    error::EduhubResult,
};

use super::state::StoreState;

/// Thread-safe in-memory document store.
///
/// Cloning yields another handle to the same data. Unique indexes are checked
/// and documents written under one write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<RwLock<StoreState>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection (0 when it does not exist).
    pub fn count(&self, collection: &str) -> EduhubResult<usize> {
        Ok(self.read()?.count(collection))
    }

    fn read(&self) -> EduhubResult<RwLockReadGuard<'_, StoreState>> {
        self.inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError.into())
    }

    fn write(&self) -> EduhubResult<RwLockWriteGuard<'_, StoreState>> {
        self.inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError.into())
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn create_collection(&self, name: &str) -> EduhubResult<()> {
        self.write()?.create_collection(name);
        Ok(())
    }

    fn drop_collection(&self, name: &str) -> EduhubResult<bool> {
        Ok(self.write()?.drop_collection(name))
    }

    fn list_collections(&self) -> EduhubResult<Vec<String>> {
        Ok(self.read()?.list_collections())
    }

    fn insert_one(&self, collection: &str, record: Record) -> EduhubResult<DocumentId> {
        self.write()?.insert_one(collection, record)
    }

    fn find(&self, collection: &str, filter: &Filter) -> EduhubResult<Vec<Document>> {
        Ok(self.read()?.find(collection, filter))
    }

    fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> EduhubResult<UpdateResult> {
        self.write()?.update_one(collection, filter, update)
    }

    fn delete_one(&self, collection: &str, filter: &Filter) -> EduhubResult<u64> {
        Ok(self.write()?.delete_one(collection, filter))
    }

    fn delete_many(&self, collection: &str, filter: &Filter) -> EduhubResult<u64> {
        Ok(self.write()?.delete_many(collection, filter))
    }

    fn create_index(&self, collection: &str, spec: IndexSpec) -> EduhubResult<String> {
        self.write()?.create_index(collection, spec)
    }

    fn drop_index(&self, collection: &str, name: &str) -> EduhubResult<()> {
        self.write()?.drop_index(collection, name)
    }

    fn list_indexes(&self, collection: &str) -> EduhubResult<Vec<IndexSpec>> {
        Ok(self.read()?.list_indexes(collection))
    }

    fn set_schema(&self, collection: &str, schema: Option<CollectionSchema>) -> EduhubResult<()> {
        self.write()?.set_schema(collection, schema)
    }

    fn schema(&self, collection: &str) -> EduhubResult<Option<CollectionSchema>> {
        Ok(self.read()?.schema(collection))
    }
}
