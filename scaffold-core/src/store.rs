//! The process-wide document store shared by every collection.
//!
//! A [`DocumentStore`] is a cheap-to-clone handle over one [`StoreBackend`]. Typed
//! collections reach the backend through a [`StoreCollection`], which binds the backend to
//! a single collection name and works in the stored (BSON) representation.

use bson::Document as BsonDocument;
use std::sync::Arc;

use crate::{
    backend::StoreBackend,
    document::DocumentId,
    error::ScaffoldResult,
    query::Query,
};

/// Handle to the configured storage backend.
///
/// # Example
///
/// ```ignore
/// let store = DocumentStore::new(InMemoryStore::new());
/// store.create_collection("users").await?;
///
/// let users = store.collection("users");
/// users.insert_one(id, doc! { "id": id.to_string(), "name": "Alice" }).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DocumentStore {
    backend: Arc<dyn StoreBackend>,
}

impl DocumentStore {
    pub fn new(backend: impl StoreBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn from_arc(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    /// Binds the backend to the collection called `name`. Does not create it.
    pub fn collection(&self, name: &str) -> StoreCollection {
        StoreCollection::new(name.to_string(), self.backend.clone())
    }

    pub async fn create_collection(&self, name: &str) -> ScaffoldResult<()> {
        self.backend
            .create_collection(name)
            .await
    }

    pub async fn drop_collection(&self, name: &str) -> ScaffoldResult<()> {
        self.backend.drop_collection(name).await
    }

    pub async fn list_collections(&self) -> ScaffoldResult<Vec<String>> {
        self.backend.list_collections().await
    }

    pub async fn shutdown(&self) -> ScaffoldResult<()> {
        tracing::debug!(backend = ?self.backend, "shutting down document store");

        self.backend.shutdown().await
    }
}

/// A backend bound to one named collection.
#[derive(Debug, Clone)]
pub struct StoreCollection {
    name: String,
    backend: Arc<dyn StoreBackend>,
}

impl StoreCollection {
    pub(crate) fn new(name: String, backend: Arc<dyn StoreBackend>) -> Self {
        Self { name, backend }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn insert_one(&self, id: DocumentId, document: BsonDocument) -> ScaffoldResult<()> {
        self.backend
            .insert_one(&self.name, id, document)
            .await
    }

    pub async fn find_one(&self, query: Query) -> ScaffoldResult<Option<BsonDocument>> {
        self.backend.find_one(&self.name, query).await
    }

    pub async fn find_many(&self, query: Query) -> ScaffoldResult<Vec<BsonDocument>> {
        self.backend.find_many(&self.name, query).await
    }

    /// Merges `patch` into the stored document.
    pub async fn update_by_id(&self, id: DocumentId, patch: BsonDocument) -> ScaffoldResult<()> {
        self.backend
            .update_by_id(&self.name, id, patch)
            .await
    }

    pub async fn delete_by_id(&self, id: DocumentId) -> ScaffoldResult<()> {
        self.backend
            .delete_by_id(&self.name, id)
            .await
    }
}
