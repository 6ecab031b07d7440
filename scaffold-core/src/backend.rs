//! Storage backend abstraction for collections.
//!
//! A [`StoreBackend`] persists documents in their stored form (a BSON document keyed by its
//! [`DocumentId`]) inside named collections. Backends know nothing about records, hooks, or
//! reconciliation: those live in [`Collection`](crate::collection::Collection), which speaks
//! to a backend through a [`DocumentStore`](crate::store::DocumentStore).
//!
//! Implementations must be thread-safe and support concurrent access from many requests.
//!
//! # Examples
//!
//! ```ignore
//! use scaffold::backend::StoreBackend;
//! use bson::doc;
//!
//! let backend = MyBackend::new();
//! let id = DocumentId::new();
//!
//! backend.create_collection("users").await?;
//! backend.insert_one("users", id, doc! { "id": id.to_string(), "name": "Alice" }).await?;
//! let found = backend.find_one("users", Query::new().filter(Filter::id(id))).await?;
//! ```

use async_trait::async_trait;
use bson::Document as BsonDocument;
use std::{fmt::Debug, sync::Arc};

use crate::{document::DocumentId, error::ScaffoldResult, query::Query};

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. The concurrency model (lock-based, delegated
/// to a database driver) is up to the implementation.
///
/// # Collections
///
/// Operations that target a collection that does not exist should fail with an error rather
/// than creating it implicitly. Collections are created during resource activation.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Stores a new document under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ScaffoldError::DocumentAlreadyExists`](crate::error::ScaffoldError::DocumentAlreadyExists)
    /// if a document with the same id is already stored.
    async fn insert_one(
        &self,
        collection: &str,
        id: DocumentId,
        document: BsonDocument,
    ) -> ScaffoldResult<()>;

    /// Returns the first document matching `query`, honouring its sort and offset.
    async fn find_one(&self, collection: &str, query: Query) -> ScaffoldResult<Option<BsonDocument>>;

    /// Returns every document matching `query` after sort, offset, and limit are applied.
    async fn find_many(&self, collection: &str, query: Query) -> ScaffoldResult<Vec<BsonDocument>>;

    /// Merges `patch` into the stored document with the given id.
    ///
    /// Keys present in `patch` replace the stored values. Other keys are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ScaffoldError::DocumentNotFound`](crate::error::ScaffoldError::DocumentNotFound)
    /// if no document has that id.
    async fn update_by_id(
        &self,
        collection: &str,
        id: DocumentId,
        patch: BsonDocument,
    ) -> ScaffoldResult<()>;

    /// Removes the document with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`ScaffoldError::DocumentNotFound`](crate::error::ScaffoldError::DocumentNotFound)
    /// if no document has that id.
    async fn delete_by_id(&self, collection: &str, id: DocumentId) -> ScaffoldResult<()>;

    /// Creates a collection. Creating an existing collection is not an error.
    async fn create_collection(&self, name: &str) -> ScaffoldResult<()>;

    /// Drops a collection and all of its documents.
    async fn drop_collection(&self, name: &str) -> ScaffoldResult<()>;

    async fn list_collections(&self) -> ScaffoldResult<Vec<String>>;

    /// Releases any resources held by the backend.
    async fn shutdown(&self) -> ScaffoldResult<()> {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for Arc<B>
where
    B: StoreBackend + ?Sized,
{
    async fn insert_one(
        &self,
        collection: &str,
        id: DocumentId,
        document: BsonDocument,
    ) -> ScaffoldResult<()> {
        (**self)
            .insert_one(collection, id, document)
            .await
    }

    async fn find_one(&self, collection: &str, query: Query) -> ScaffoldResult<Option<BsonDocument>> {
        (**self).find_one(collection, query).await
    }

    async fn find_many(&self, collection: &str, query: Query) -> ScaffoldResult<Vec<BsonDocument>> {
        (**self).find_many(collection, query).await
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: DocumentId,
        patch: BsonDocument,
    ) -> ScaffoldResult<()> {
        (**self)
            .update_by_id(collection, id, patch)
            .await
    }

    async fn delete_by_id(&self, collection: &str, id: DocumentId) -> ScaffoldResult<()> {
        (**self).delete_by_id(collection, id).await
    }

    async fn create_collection(&self, name: &str) -> ScaffoldResult<()> {
        (**self).create_collection(name).await
    }

    async fn drop_collection(&self, name: &str) -> ScaffoldResult<()> {
        (**self).drop_collection(name).await
    }

    async fn list_collections(&self) -> ScaffoldResult<Vec<String>> {
        (**self).list_collections().await
    }

    async fn shutdown(&self) -> ScaffoldResult<()> {
        (**self).shutdown().await
    }
}

/// Factory for store backends.
///
/// Separates backend configuration (connection strings, database names) from the
/// potentially asynchronous work of connecting.
///
/// ```ignore
/// let backend = MongoStoreBuilder::new("mongodb://localhost:27017", "app")
///     .build()
///     .await?;
/// ```
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> ScaffoldResult<Self::Backend>;
}
