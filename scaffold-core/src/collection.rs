//! Typed collections: the CRUD engine behind every resource.
//!
//! A [`CollectionConfig`] describes a collection (its name, slug, hooks, and seed
//! documents). Activating it against a [`DocumentStore`] creates the backing store
//! collection, inserts any missing seed documents, and yields a live [`Collection`].
//!
//! Every operation on a [`Collection`] runs through its [`Hooks`]:
//!
//! - [`Collection::insert`]: write, persist, read, after-insert.
//! - [`Collection::find`]: lookup, read.
//! - [`Collection::find_by_id`]: access, lookup, read.
//! - [`Collection::find_many`]: lookup, then per document access (failures skip the
//!   document) and read.
//! - [`Collection::update`]: update, reconcile, persist the changed fields, read.
//! - [`Collection::delete`]: delete, remove.
//! - [`Collection::delete_by_id`]: delete, access, lookup, read, remove.
//!
//! # Example
//!
//! ```ignore
//! let users = CollectionConfig::<User>::builder("Users", "users")
//!     .read(|_ctx, _id, mut user| async move {
//!         user.password.clear();
//!         Ok(user)
//!     })
//!     .default_document(DefaultDocument::new(admin_id, admin))
//!     .build()
//!     .activate(&store)
//!     .await?;
//!
//! let mut alice = users.insert(&ctx, User::new("alice")).await?;
//! alice.set(&users, &ctx, "name", "Alice").await?;
//! ```

use std::{fmt, future::Future, sync::Arc};
use tracing::{debug, info};

use crate::{
    context::Context,
    document::{DefaultDocument, Document, DocumentId, now},
    error::{ScaffoldError, ScaffoldResult},
    hooks::{Hooks, HooksBuilder},
    page::{Page, PaginationParams},
    query::{Filter, Query},
    reconcile::{reconcile, stored_patch},
    record::{FieldSet, Record},
    store::{DocumentStore, StoreCollection},
};

/// What a reconciliation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Every proposed value equalled the stored one. Nothing was written.
    Unchanged,
    /// The listed fields (by external name) were persisted.
    Updated { fields: Vec<String> },
}

impl UpdateOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, UpdateOutcome::Updated { .. })
    }
}

/// Static description of a collection, ready to be activated.
pub struct CollectionConfig<R: Record> {
    name: String,
    slug: String,
    hooks: Hooks<R>,
    defaults: Vec<DefaultDocument<R>>,
}

impl<R: Record> CollectionConfig<R> {
    /// Starts describing a collection. `slug` is both its route segment and its store
    /// collection name.
    pub fn builder(name: impl Into<String>, slug: impl Into<String>) -> CollectionConfigBuilder<R> {
        CollectionConfigBuilder {
            name: name.into(),
            slug: slug.into(),
            hooks: HooksBuilder::new(),
            defaults: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Creates the store collection, seeds it, and returns the live collection.
    ///
    /// # Errors
    ///
    /// Fails if the store collection cannot be created or a seed lookup or insert fails.
    pub async fn activate(self, store: &DocumentStore) -> ScaffoldResult<Collection<R>> {
        store.create_collection(&self.slug).await?;

        let backing = store.collection(&self.slug);
        let seeded = seed(&backing, self.defaults).await?;

        info!(
            target: "scaffold::collection",
            collection = %self.name,
            slug = %self.slug,
            seeded,
            "collection activated"
        );

        Ok(Collection {
            inner: Arc::new(CollectionInner {
                name: self.name,
                slug: self.slug,
                hooks: self.hooks,
                store: backing,
            }),
        })
    }
}

impl<R: Record> fmt::Debug for CollectionConfig<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionConfig")
            .field("name", &self.name)
            .field("slug", &self.slug)
            .field("defaults", &self.defaults.len())
            .finish_non_exhaustive()
    }
}

/// Inserts every default document whose id is not stored yet, bypassing all hooks.
async fn seed<R: Record>(
    store: &StoreCollection,
    defaults: Vec<DefaultDocument<R>>,
) -> ScaffoldResult<usize> {
    let mut inserted = 0;

    for default in defaults {
        if store
            .find_one(Query::filtered(Filter::id(default.id)))
            .await?
            .is_some()
        {
            debug!(target: "scaffold::collection", id = %default.id, "seed already present");
            continue;
        }

        let document = default.into_document(now());
        store
            .insert_one(document.id, document.to_bson()?)
            .await?;
        inserted += 1;
    }

    Ok(inserted)
}

/// Builder for [`CollectionConfig`]. Hook setters fill the matching [`Hooks`] slot.
pub struct CollectionConfigBuilder<R: Record> {
    name: String,
    slug: String,
    hooks: HooksBuilder<R>,
    defaults: Vec<DefaultDocument<R>>,
}

impl<R: Record> CollectionConfigBuilder<R> {
    /// Replaces every hook with those configured on `hooks`.
    pub fn hooks(mut self, hooks: HooksBuilder<R>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn access<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, DocumentId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ScaffoldResult<()>> + Send + 'static,
    {
        self.hooks = self.hooks.access(f);
        self
    }

    pub fn read<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, DocumentId, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ScaffoldResult<R>> + Send + 'static,
    {
        self.hooks = self.hooks.read(f);
        self
    }

    pub fn write<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, DocumentId, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ScaffoldResult<R>> + Send + 'static,
    {
        self.hooks = self.hooks.write(f);
        self
    }

    pub fn update<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, DocumentId, R, FieldSet) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ScaffoldResult<FieldSet>> + Send + 'static,
    {
        self.hooks = self.hooks.update(f);
        self
    }

    pub fn delete<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, DocumentId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ScaffoldResult<()>> + Send + 'static,
    {
        self.hooks = self.hooks.delete(f);
        self
    }

    pub fn after_insert<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, Document<R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.hooks = self.hooks.after_insert(f);
        self
    }

    /// Adds a document to insert at activation if its id is not stored yet.
    pub fn default_document(mut self, document: DefaultDocument<R>) -> Self {
        self.defaults.push(document);
        self
    }

    pub fn default_documents(mut self, documents: impl IntoIterator<Item = DefaultDocument<R>>) -> Self {
        self.defaults.extend(documents);
        self
    }

    pub fn build(self) -> CollectionConfig<R> {
        CollectionConfig {
            name: self.name,
            slug: self.slug,
            hooks: self.hooks.build(),
            defaults: self.defaults,
        }
    }
}

struct CollectionInner<R: Record> {
    name: String,
    slug: String,
    hooks: Hooks<R>,
    store: StoreCollection,
}

/// A live, typed collection. Cloning is cheap and clones share state.
pub struct Collection<R: Record> {
    inner: Arc<CollectionInner<R>>,
}

impl<R: Record> Clone for Collection<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Record> fmt::Debug for Collection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.inner.name)
            .field("slug", &self.inner.slug)
            .finish_non_exhaustive()
    }
}

impl<R: Record> Collection<R> {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn slug(&self) -> &str {
        &self.inner.slug
    }

    pub fn hooks(&self) -> &Hooks<R> {
        &self.inner.hooks
    }

    /// Stores `record` as a new document.
    ///
    /// The write hook sees the record before it is persisted; the returned document
    /// carries the read hook's view of it. If the read hook fails, the persisted document
    /// stays in the store.
    pub async fn insert(&self, ctx: &Context, record: R) -> ScaffoldResult<Document<R>> {
        let hooks = &self.inner.hooks;
        let id = DocumentId::new();
        let timestamp = now();

        let record = hooks.write(ctx, id, record).await?;
        let document = Document {
            id,
            created: timestamp,
            last_updated: timestamp,
            data: record,
        };

        self.inner
            .store
            .insert_one(id, document.to_bson()?)
            .await?;
        debug!(target: "scaffold::collection", collection = %self.name(), %id, "document inserted");

        let document = self.surface(ctx, document).await?;
        hooks.after_insert(ctx, document.clone()).await;

        Ok(document)
    }

    /// Returns the first document matching `query`.
    ///
    /// Runs the read hook but not the access hook; see [`Collection::find_by_id`].
    pub async fn find(&self, ctx: &Context, query: impl Into<Query>) -> ScaffoldResult<Document<R>> {
        let stored = self
            .inner
            .store
            .find_one(query.into())
            .await?
            .ok_or_else(ScaffoldError::not_found)?;

        self.surface(ctx, Document::from_bson(stored)?)
            .await
    }

    /// Returns the document with the given id once the access hook allows it.
    pub async fn find_by_id(&self, ctx: &Context, id: DocumentId) -> ScaffoldResult<Document<R>> {
        self.inner.hooks.access(ctx, id).await?;

        debug!(target: "scaffold::collection", collection = %self.name(), %id, "find by id");
        self.find(ctx, Filter::id(id)).await
    }

    /// Returns page `page` (1-indexed) of `limit` documents matching `query`.
    ///
    /// Documents the access hook rejects are left out, so a page may hold fewer than
    /// `limit` documents. A read hook failure aborts the whole listing.
    pub async fn find_many(
        &self,
        ctx: &Context,
        query: impl Into<Query>,
        limit: usize,
        page: usize,
    ) -> ScaffoldResult<Vec<Document<R>>> {
        let page = self
            .find_page(ctx, query, PaginationParams::new(page, limit))
            .await?;

        Ok(page.items)
    }

    /// Like [`Collection::find_many`], returning the page position alongside the documents.
    pub async fn find_page(
        &self,
        ctx: &Context,
        query: impl Into<Query>,
        params: PaginationParams,
    ) -> ScaffoldResult<Page<Document<R>>> {
        let offset = params.offset()?;
        let stored = self
            .inner
            .store
            .find_many(query.into().window(offset, params.per_page))
            .await?;

        let mut documents = Vec::with_capacity(stored.len());
        for raw in stored {
            let document = Document::<R>::from_bson(raw)?;

            if let Err(err) = self.inner.hooks.access(ctx, document.id).await {
                debug!(
                    target: "scaffold::collection",
                    collection = %self.name(),
                    id = %document.id,
                    reason = %err,
                    "document skipped by access hook"
                );
                continue;
            }

            documents.push(self.surface(ctx, document).await?);
        }

        Ok(Page::new(documents, params.page))
    }

    /// Reconciles `fields` into `document` and persists the fields that changed.
    ///
    /// The update hook resolves the proposed fields first. Values are matched to record
    /// fields by external name, then internal name; unknown names are ignored. If any
    /// matched value has the wrong type nothing is written and `document` is untouched.
    /// When nothing changes no write happens and `last_updated` keeps its value.
    pub async fn update(
        &self,
        ctx: &Context,
        document: &mut Document<R>,
        fields: FieldSet,
    ) -> ScaffoldResult<UpdateOutcome> {
        let id = document.id;
        let resolved = self
            .inner
            .hooks
            .update(ctx, id, document.data.clone(), fields)
            .await?;

        let Some(plan) = reconcile(&document.data, &resolved)? else {
            debug!(target: "scaffold::collection", collection = %self.name(), %id, "update changed nothing");
            return Ok(UpdateOutcome::Unchanged);
        };

        let written = plan.external_names();
        let updated = Document {
            id,
            created: document.created,
            last_updated: now().max(document.last_updated),
            data: plan.record,
        };
        let patch = stored_patch(&updated, &plan.changed)?;

        self.inner
            .store
            .update_by_id(id, patch)
            .await?;
        debug!(target: "scaffold::collection", collection = %self.name(), %id, fields = ?written, "document updated");

        *document = updated;
        document.data = self
            .inner
            .hooks
            .read(ctx, id, document.data.clone())
            .await?;

        Ok(UpdateOutcome::Updated { fields: written })
    }

    /// Removes `document` once the delete hook allows it.
    pub async fn delete(&self, ctx: &Context, document: &Document<R>) -> ScaffoldResult<()> {
        self.inner.hooks.delete(ctx, document.id).await?;
        self.remove(document.id).await
    }

    /// Deletes the document with the given id.
    ///
    /// The delete hook runs before the lookup, so a veto is reported even for an id that
    /// does not exist. The lookup then goes through [`Collection::find_by_id`], access
    /// hook included. The delete hook is not run a second time.
    pub async fn delete_by_id(&self, ctx: &Context, id: DocumentId) -> ScaffoldResult<()> {
        self.inner.hooks.delete(ctx, id).await?;

        let document = self.find_by_id(ctx, id).await?;
        self.remove(document.id).await
    }

    async fn remove(&self, id: DocumentId) -> ScaffoldResult<()> {
        self.inner
            .store
            .delete_by_id(id)
            .await?;

        debug!(target: "scaffold::collection", collection = %self.name(), %id, "document deleted");
        Ok(())
    }

    async fn surface(&self, ctx: &Context, document: Document<R>) -> ScaffoldResult<Document<R>> {
        let data = self
            .inner
            .hooks
            .read(ctx, document.id, document.data)
            .await?;

        Ok(Document { data, ..document })
    }
}
