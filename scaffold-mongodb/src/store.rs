use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, FindOptions},
};

use scaffold_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::DocumentId,
    error::{ScaffoldError, ScaffoldResult},
    query::{Query, SortDirection},
};

use crate::query::MongoQueryTranslator;

const DUPLICATE_KEY: i32 = 11000;

/// A store backend over one MongoDB database.
///
/// Each document is stored with `_id` set to its identifier as a binary UUID, alongside
/// the `id` string field the document itself serializes. `_id` is stripped on the way out.
#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: impl Into<String>) -> Self {
        Self {
            client,
            database: database.into(),
        }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn collection(&self, name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(name)
    }

    async fn find(&self, collection: &str, query: Query) -> ScaffoldResult<Vec<Document>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if let Some(skip) = query.offset {
            options.skip = Some(skip as u64);
        }
        if let Some(sort) = &query.sort {
            options.sort = Some(doc! {
                sort.field.clone(): match sort.direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                }
            });
        }

        let documents = self
            .collection(collection)
            .find(MongoQueryTranslator::translate(query.filter.as_ref())?)
            .with_options(options)
            .await
            .map_err(backend)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend)?;

        Ok(documents
            .into_iter()
            .map(|mut document| {
                document.remove("_id");
                document
            })
            .collect())
    }
}

fn key(id: DocumentId) -> Bson {
    Bson::from(bson::Uuid::from_bytes(*id.as_uuid().as_bytes()))
}

fn backend(err: MongoError) -> ScaffoldError {
    ScaffoldError::Backend(err.to_string())
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_one(&self, collection: &str, id: DocumentId, mut document: Document) -> ScaffoldResult<()> {
        document.insert("_id", key(id));

        self.collection(collection)
            .insert_one(document)
            .await
            .map_err(|err| {
                if is_duplicate_key(&err) {
                    ScaffoldError::DocumentAlreadyExists(id.to_string(), collection.to_string())
                } else {
                    backend(err)
                }
            })?;

        tracing::trace!(collection, %id, "mongodb insert");
        Ok(())
    }

    async fn find_one(&self, collection: &str, query: Query) -> ScaffoldResult<Option<Document>> {
        let offset = query.offset.unwrap_or(0);

        Ok(self
            .find(collection, query.window(offset, 1))
            .await?
            .into_iter()
            .next())
    }

    async fn find_many(&self, collection: &str, query: Query) -> ScaffoldResult<Vec<Document>> {
        self.find(collection, query).await
    }

    async fn update_by_id(&self, collection: &str, id: DocumentId, patch: Document) -> ScaffoldResult<()> {
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": key(id) }, doc! { "$set": patch })
            .await
            .map_err(backend)?;

        if result.matched_count == 0 {
            return Err(ScaffoldError::DocumentNotFound(id.to_string(), collection.to_string()));
        }

        Ok(())
    }

    async fn delete_by_id(&self, collection: &str, id: DocumentId) -> ScaffoldResult<()> {
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": key(id) })
            .await
            .map_err(backend)?;

        if result.deleted_count == 0 {
            return Err(ScaffoldError::DocumentNotFound(id.to_string(), collection.to_string()));
        }

        Ok(())
    }

    async fn create_collection(&self, name: &str) -> ScaffoldResult<()> {
        let database = self.client.database(&self.database);
        let existing = database
            .list_collection_names()
            .await
            .map_err(backend)?;

        if !existing.iter().any(|existing| existing == name) {
            database
                .create_collection(name)
                .await
                .map_err(backend)?;
        }

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> ScaffoldResult<()> {
        self.collection(name)
            .drop()
            .await
            .map_err(backend)
    }

    async fn list_collections(&self) -> ScaffoldResult<Vec<String>> {
        self.client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(backend)
    }

    async fn shutdown(&self) -> ScaffoldResult<()> {
        self.client.clone().shutdown().await;

        Ok(())
    }
}

/// Connects a [`MongoDbStore`] from a connection string.
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> ScaffoldResult<Self::Backend> {
        let options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| ScaffoldError::Initialization(e.to_string()))?;
        let client = Client::with_options(options).map_err(|e| ScaffoldError::Initialization(e.to_string()))?;

        tracing::info!(database = %self.database, "connected to mongodb");
        Ok(MongoDbStore::new(client, self.database))
    }
}
