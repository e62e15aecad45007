//! Store engine shared by the adapters.
//!
//! Every operation either completes or leaves the state untouched, so callers
//! can hold a single write lock and rely on "nothing persisted on failure".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use eduhub_core::{
    application::{ApplicationError, ports::UpdateResult},
    domain::{CollectionSchema, Document, DocumentId, Filter, IndexSpec, Record, Update},
    error::{EduhubError, EduhubResult},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
    #[serde(default)]
    collections: BTreeMap<String, Collection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Collection {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    indexes: Vec<IndexSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema: Option<CollectionSchema>,
}

impl Collection {
    fn check_schema(&self, collection: &str, candidate: &Document) -> EduhubResult<()> {
        let Some(schema) = &self.schema else {
            return Ok(());
        };
        let report = schema.check(&candidate.fields);
        if report.is_valid() {
            return Ok(());
        }
        Err(ApplicationError::SchemaViolation {
            collection: collection.to_string(),
            report,
        }
        .into())
    }

    /// Fail if `candidate` would collide with another document on a unique
    /// index. `own_id` is ignored, so an updated document does not collide
    /// with its previous version.
    fn check_unique(
        &self,
        collection: &str,
        candidate: &Document,
        own_id: Option<DocumentId>,
    ) -> EduhubResult<()> {
        for spec in self.indexes.iter().filter(|s| s.unique) {
            let key = spec.key_for(candidate);
            let clash = self
                .documents
                .iter()
                .filter(|d| Some(d.id) != own_id)
                .any(|d| IndexSpec::keys_equal(&spec.key_for(d), &key));
            if clash {
                return Err(duplicate_key(collection, spec, &key));
            }
        }
        Ok(())
    }
}

fn duplicate_key(collection: &str, spec: &IndexSpec, key: &[serde_json::Value]) -> EduhubError {
    let (field, value) = spec.describe_key(key);
    ApplicationError::DuplicateKey {
        collection: collection.to_string(),
        index: spec.name.clone(),
        field,
        value,
    }
    .into()
}

impl StoreState {
    /// Returns whether the collection was created.
    pub fn create_collection(&mut self, name: &str) -> bool {
        if self.collections.contains_key(name) {
            return false;
        }
        self.collections.insert(name.to_string(), Collection::default());
        true
    }

    pub fn drop_collection(&mut self, name: &str) -> bool {
        self.collections.remove(name).is_some()
    }

    pub fn list_collections(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }

    pub fn insert_one(&mut self, collection: &str, record: Record) -> EduhubResult<DocumentId> {
        let doc = Document::new(DocumentId::new(), record);
        let coll = self.collections.entry(collection.to_string()).or_default();
        coll.check_schema(collection, &doc)?;
        coll.check_unique(collection, &doc, None)?;
        let id = doc.id;
        coll.documents.push(doc);
        Ok(id)
    }

    pub fn find(&self, collection: &str, filter: &Filter) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|c| {
                c.documents
                    .iter()
                    .filter(|d| filter.matches(d))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn update_one(
        &mut self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> EduhubResult<UpdateResult> {
        let Some(coll) = self.collections.get_mut(collection) else {
            return Ok(UpdateResult::default());
        };
        let Some(pos) = coll.documents.iter().position(|d| filter.matches(d)) else {
            return Ok(UpdateResult::default());
        };

        let mut updated = coll.documents[pos].clone();
        let modified = update.apply(&mut updated)?;
        if modified {
            coll.check_schema(collection, &updated)?;
            coll.check_unique(collection, &updated, Some(updated.id))?;
            coll.documents[pos] = updated;
        }

        Ok(UpdateResult {
            matched: true,
            modified,
        })
    }

    pub fn delete_one(&mut self, collection: &str, filter: &Filter) -> u64 {
        let Some(coll) = self.collections.get_mut(collection) else {
            return 0;
        };
        match coll.documents.iter().position(|d| filter.matches(d)) {
            Some(pos) => {
                coll.documents.remove(pos);
                1
            }
            None => 0,
        }
    }

    pub fn delete_many(&mut self, collection: &str, filter: &Filter) -> u64 {
        let Some(coll) = self.collections.get_mut(collection) else {
            return 0;
        };
        let before = coll.documents.len();
        coll.documents.retain(|d| !filter.matches(d));
        (before - coll.documents.len()) as u64
    }

    pub fn create_index(&mut self, collection: &str, spec: IndexSpec) -> EduhubResult<String> {
        let coll = self.collections.entry(collection.to_string()).or_default();

        if let Some(existing) = coll.indexes.iter().find(|s| s.name == spec.name) {
            if existing.same_definition(&spec) {
                return Ok(existing.name.clone());
            }
            return Err(ApplicationError::IndexConflict {
                collection: collection.to_string(),
                name: spec.name,
            }
            .into());
        }
        if let Some(existing) = coll.indexes.iter().find(|s| s.same_definition(&spec)) {
            return Ok(existing.name.clone());
        }

        if spec.unique {
            let mut seen: Vec<Vec<serde_json::Value>> = Vec::with_capacity(coll.documents.len());
            for doc in &coll.documents {
                let key = spec.key_for(doc);
                if seen.iter().any(|k| IndexSpec::keys_equal(k, &key)) {
                    return Err(duplicate_key(collection, &spec, &key));
                }
                seen.push(key);
            }
        }

        let name = spec.name.clone();
        coll.indexes.push(spec);
        Ok(name)
    }

    pub fn drop_index(&mut self, collection: &str, name: &str) -> EduhubResult<()> {
        let removed = self.collections.get_mut(collection).is_some_and(|coll| {
            let before = coll.indexes.len();
            coll.indexes.retain(|s| s.name != name);
            coll.indexes.len() < before
        });
        if !removed {
            return Err(ApplicationError::IndexNotFound {
                collection: collection.to_string(),
                name: name.to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn set_schema(
        &mut self,
        collection: &str,
        schema: Option<CollectionSchema>,
    ) -> EduhubResult<()> {
        if let Some(schema) = &schema {
            schema.validate_definition()?;
        }
        self.collections.entry(collection.to_string()).or_default().schema = schema;
        Ok(())
    }

    pub fn schema(&self, collection: &str) -> Option<CollectionSchema> {
        self.collections
            .get(collection)
            .and_then(|c| c.schema.clone())
    }

    pub fn list_indexes(&self, collection: &str) -> Vec<IndexSpec> {
        self.collections
            .get(collection)
            .map(|c| c.indexes.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map_or(0, |c| c.documents.len())
    }
}
