//! In-memory storage backend.
//!
//! Documents are held per collection in an [`IndexMap`] keyed by the document id, so an
//! unsorted query returns documents in insertion order.

use async_trait::async_trait;
use bson::Document as BsonDocument;
use indexmap::IndexMap;
use mea::rwlock::RwLock;
use std::{collections::HashMap, sync::Arc};

use scaffold_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::DocumentId,
    error::{ScaffoldError, ScaffoldResult},
    query::{Query, SortDirection},
};

use crate::evaluator::{DocumentEvaluator, compare_field};

type CollectionMap = IndexMap<DocumentId, BsonDocument>;
type StoreMap = HashMap<String, CollectionMap>;

/// A thread-safe in-memory store backend.
///
/// Clones share the same underlying data. Nothing is persisted across restarts.
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder
    }

    /// Runs `query` over one collection: filter, then sort, then offset and limit.
    fn select(collection: &CollectionMap, query: &Query) -> ScaffoldResult<Vec<BsonDocument>> {
        let mut selected = Vec::new();

        for document in collection.values() {
            let keep = match &query.filter {
                Some(filter) => DocumentEvaluator::matches(document, filter)?,
                None => true,
            };

            if keep {
                selected.push(document);
            }
        }

        if let Some(sort) = &query.sort {
            // stable, so ties keep insertion order
            selected.sort_by(|a, b| {
                let ordering = compare_field(a, b, &sort.field);

                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        Ok(selected
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

fn missing(collection: &str) -> ScaffoldError {
    ScaffoldError::CollectionNotFound(collection.to_string())
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_one(
        &self,
        collection: &str,
        id: DocumentId,
        document: BsonDocument,
    ) -> ScaffoldResult<()> {
        let mut store = self.store.write().await;
        let documents = store
            .get_mut(collection)
            .ok_or_else(|| missing(collection))?;

        if documents.contains_key(&id) {
            return Err(ScaffoldError::DocumentAlreadyExists(
                id.to_string(),
                collection.to_string(),
            ));
        }

        documents.insert(id, document);
        Ok(())
    }

    async fn find_one(&self, collection: &str, query: Query) -> ScaffoldResult<Option<BsonDocument>> {
        let store = self.store.read().await;
        let documents = store
            .get(collection)
            .ok_or_else(|| missing(collection))?;

        let offset = query.offset.unwrap_or(0);

        Ok(Self::select(documents, &query.window(offset, 1))?
            .into_iter()
            .next())
    }

    async fn find_many(&self, collection: &str, query: Query) -> ScaffoldResult<Vec<BsonDocument>> {
        let store = self.store.read().await;
        let documents = store
            .get(collection)
            .ok_or_else(|| missing(collection))?;

        Self::select(documents, &query)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: DocumentId,
        patch: BsonDocument,
    ) -> ScaffoldResult<()> {
        let mut store = self.store.write().await;
        let stored = store
            .get_mut(collection)
            .ok_or_else(|| missing(collection))?
            .get_mut(&id)
            .ok_or_else(|| ScaffoldError::DocumentNotFound(id.to_string(), collection.to_string()))?;

        for (key, value) in patch {
            stored.insert(key, value);
        }

        Ok(())
    }

    async fn delete_by_id(&self, collection: &str, id: DocumentId) -> ScaffoldResult<()> {
        let mut store = self.store.write().await;
        let documents = store
            .get_mut(collection)
            .ok_or_else(|| missing(collection))?;

        // shift_remove keeps the remaining documents in insertion order
        match documents.shift_remove(&id) {
            Some(_) => Ok(()),
            None => Err(ScaffoldError::DocumentNotFound(
                id.to_string(),
                collection.to_string(),
            )),
        }
    }

    async fn create_collection(&self, name: &str) -> ScaffoldResult<()> {
        self.store
            .write()
            .await
            .entry(name.to_string())
            .or_default();

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> ScaffoldResult<()> {
        match self.store.write().await.remove(name) {
            Some(_) => Ok(()),
            None => Err(missing(name)),
        }
    }

    async fn list_collections(&self) -> ScaffoldResult<Vec<String>> {
        let mut names: Vec<String> = self
            .store
            .read()
            .await
            .keys()
            .cloned()
            .collect();
        names.sort();

        Ok(names)
    }

    async fn shutdown(&self) -> ScaffoldResult<()> {
        tracing::debug!("in-memory store released");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> ScaffoldResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
