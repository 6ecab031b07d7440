#![allow(dead_code)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use scaffold::{
    bson::Document as BsonDocument, collection::CollectionConfigBuilder, memory::InMemoryStore, prelude::*,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Record)]
pub struct Task {
    pub title: String,
    #[serde(rename = "isDone")]
    pub done: bool,
    pub points: i64,
}

impl Task {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            done: false,
            points: 1,
        }
    }
}

/// Wraps an in-memory store and counts reads and partial updates.
#[derive(Debug, Clone, Default)]
pub struct CountingStore {
    inner: InMemoryStore,
    updates: Arc<AtomicUsize>,
    lookups: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreBackend for CountingStore {
    async fn insert_one(&self, collection: &str, id: DocumentId, document: BsonDocument) -> ScaffoldResult<()> {
        self.inner.insert_one(collection, id, document).await
    }

    async fn find_one(&self, collection: &str, query: Query) -> ScaffoldResult<Option<BsonDocument>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_one(collection, query).await
    }

    async fn find_many(&self, collection: &str, query: Query) -> ScaffoldResult<Vec<BsonDocument>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_many(collection, query).await
    }

    async fn update_by_id(&self, collection: &str, id: DocumentId, patch: BsonDocument) -> ScaffoldResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_by_id(collection, id, patch).await
    }

    async fn delete_by_id(&self, collection: &str, id: DocumentId) -> ScaffoldResult<()> {
        self.inner.delete_by_id(collection, id).await
    }

    async fn create_collection(&self, name: &str) -> ScaffoldResult<()> {
        self.inner.create_collection(name).await
    }

    async fn drop_collection(&self, name: &str) -> ScaffoldResult<()> {
        self.inner.drop_collection(name).await
    }

    async fn list_collections(&self) -> ScaffoldResult<Vec<String>> {
        self.inner.list_collections().await
    }
}

/// A task collection over a fresh counting store.
pub async fn tasks(config: CollectionConfigBuilder<Task>) -> (Collection<Task>, CountingStore) {
    let counting = CountingStore::new();
    let store = DocumentStore::new(counting.clone());

    let collection = config
        .build()
        .activate(&store)
        .await
        .unwrap();

    (collection, counting)
}
