//! The interception pipeline run around every collection operation.
//!
//! A [`Hooks`] value holds six async function values. Every slot is filled at construction
//! time: slots left unset on the [`HooksBuilder`] get a passthrough default, so a collection
//! built with no hooks at all performs plain CRUD.
//!
//! | slot         | runs                                        | default            |
//! |--------------|---------------------------------------------|--------------------|
//! | access       | before any read of a document by id         | allow              |
//! | read         | on every record leaving the store           | identity           |
//! | write        | on a new record before its first persist    | identity           |
//! | update       | on a proposed field set before reconciling  | identity           |
//! | delete       | before physical deletion                    | allow              |
//! | after_insert | after a committed, read-transformed insert  | no-op              |
//!
//! # Example
//!
//! ```ignore
//! let hooks = Hooks::<User>::builder()
//!     .access(|ctx, _id| async move {
//!         match ctx.get_str("user") {
//!             Some(_) => Ok(()),
//!             None => Err(ScaffoldError::unauthorized("")),
//!         }
//!     })
//!     .read(|_ctx, _id, mut user| async move {
//!         user.password.clear();
//!         Ok(user)
//!     })
//!     .build();
//! ```

use futures::future::{BoxFuture, FutureExt};
use std::{fmt, future::Future, sync::Arc};

use crate::{
    context::Context,
    document::{Document, DocumentId},
    error::ScaffoldResult,
    record::{FieldSet, Record},
};

pub type AccessFn = Arc<dyn Fn(Context, DocumentId) -> BoxFuture<'static, ScaffoldResult<()>> + Send + Sync>;
pub type ReadFn<R> = Arc<dyn Fn(Context, DocumentId, R) -> BoxFuture<'static, ScaffoldResult<R>> + Send + Sync>;
pub type WriteFn<R> = Arc<dyn Fn(Context, DocumentId, R) -> BoxFuture<'static, ScaffoldResult<R>> + Send + Sync>;
pub type UpdateFn<R> =
    Arc<dyn Fn(Context, DocumentId, R, FieldSet) -> BoxFuture<'static, ScaffoldResult<FieldSet>> + Send + Sync>;
pub type DeleteFn = Arc<dyn Fn(Context, DocumentId) -> BoxFuture<'static, ScaffoldResult<()>> + Send + Sync>;
pub type AfterInsertFn<R> = Arc<dyn Fn(Context, Document<R>) -> BoxFuture<'static, ()> + Send + Sync>;

/// The six hook slots of a collection.
pub struct Hooks<R: Record> {
    access: AccessFn,
    read: ReadFn<R>,
    write: WriteFn<R>,
    update: UpdateFn<R>,
    delete: DeleteFn,
    after_insert: AfterInsertFn<R>,
}

impl<R: Record> Hooks<R> {
    pub fn builder() -> HooksBuilder<R> {
        HooksBuilder::new()
    }

    /// Gates access to an existing document.
    pub async fn access(&self, ctx: &Context, id: DocumentId) -> ScaffoldResult<()> {
        (self.access)(ctx.clone(), id).await
    }

    /// Transforms a record on its way out of the store.
    pub async fn read(&self, ctx: &Context, id: DocumentId, record: R) -> ScaffoldResult<R> {
        (self.read)(ctx.clone(), id, record).await
    }

    /// Transforms a new record before it is first persisted.
    pub async fn write(&self, ctx: &Context, id: DocumentId, record: R) -> ScaffoldResult<R> {
        (self.write)(ctx.clone(), id, record).await
    }

    /// Resolves a proposed field set against the currently stored record.
    pub async fn update(
        &self,
        ctx: &Context,
        id: DocumentId,
        current: R,
        proposed: FieldSet,
    ) -> ScaffoldResult<FieldSet> {
        (self.update)(ctx.clone(), id, current, proposed).await
    }

    /// Clears (or vetoes) a deletion.
    pub async fn delete(&self, ctx: &Context, id: DocumentId) -> ScaffoldResult<()> {
        (self.delete)(ctx.clone(), id).await
    }

    /// Observes a committed insert.
    pub async fn after_insert(&self, ctx: &Context, document: Document<R>) {
        (self.after_insert)(ctx.clone(), document).await
    }
}

impl<R: Record> Default for Hooks<R> {
    fn default() -> Self {
        HooksBuilder::new().build()
    }
}

impl<R: Record> Clone for Hooks<R> {
    fn clone(&self) -> Self {
        Self {
            access: self.access.clone(),
            read: self.read.clone(),
            write: self.write.clone(),
            update: self.update.clone(),
            delete: self.delete.clone(),
            after_insert: self.after_insert.clone(),
        }
    }
}

impl<R: Record> fmt::Debug for Hooks<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}

/// Builder for [`Hooks`]. Unset slots receive passthrough defaults in [`HooksBuilder::build`].
pub struct HooksBuilder<R: Record> {
    access: Option<AccessFn>,
    read: Option<ReadFn<R>>,
    write: Option<WriteFn<R>>,
    update: Option<UpdateFn<R>>,
    delete: Option<DeleteFn>,
    after_insert: Option<AfterInsertFn<R>>,
}

impl<R: Record> HooksBuilder<R> {
    pub fn new() -> Self {
        Self {
            access: None,
            read: None,
            write: None,
            update: None,
            delete: None,
            after_insert: None,
        }
    }

    /// Sets the access hook. An error denies access to the document.
    pub fn access<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, DocumentId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ScaffoldResult<()>> + Send + 'static,
    {
        self.access = Some(Arc::new(move |ctx, id| f(ctx, id).boxed()));
        self
    }

    /// Sets the read hook.
    pub fn read<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, DocumentId, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ScaffoldResult<R>> + Send + 'static,
    {
        self.read = Some(Arc::new(move |ctx, id, record| f(ctx, id, record).boxed()));
        self
    }

    /// Sets the write hook.
    pub fn write<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, DocumentId, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ScaffoldResult<R>> + Send + 'static,
    {
        self.write = Some(Arc::new(move |ctx, id, record| f(ctx, id, record).boxed()));
        self
    }

    /// Sets the update hook. The returned field set is what gets reconciled.
    pub fn update<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, DocumentId, R, FieldSet) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ScaffoldResult<FieldSet>> + Send + 'static,
    {
        self.update = Some(Arc::new(move |ctx, id, current, proposed| {
            f(ctx, id, current, proposed).boxed()
        }));
        self
    }

    /// Sets the delete hook. An error vetoes the deletion.
    pub fn delete<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, DocumentId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ScaffoldResult<()>> + Send + 'static,
    {
        self.delete = Some(Arc::new(move |ctx, id| f(ctx, id).boxed()));
        self
    }

    /// Sets the after-insert hook. It cannot fail; it must handle its own errors.
    pub fn after_insert<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, Document<R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.after_insert = Some(Arc::new(move |ctx, document| f(ctx, document).boxed()));
        self
    }

    pub fn build(self) -> Hooks<R> {
        let access: AccessFn = self.access.unwrap_or_else(|| Arc::new(allow));
        let read: ReadFn<R> = self.read.unwrap_or_else(|| Arc::new(identity::<R>));
        let write: WriteFn<R> = self.write.unwrap_or_else(|| Arc::new(identity::<R>));
        let update: UpdateFn<R> = self.update.unwrap_or_else(|| Arc::new(passthrough::<R>));
        let delete: DeleteFn = self.delete.unwrap_or_else(|| Arc::new(allow));
        let after_insert: AfterInsertFn<R> = self
            .after_insert
            .unwrap_or_else(|| Arc::new(ignore::<R>));

        Hooks {
            access,
            read,
            write,
            update,
            delete,
            after_insert,
        }
    }
}

fn allow(_: Context, _: DocumentId) -> BoxFuture<'static, ScaffoldResult<()>> {
    async { Ok(()) }.boxed()
}

fn identity<R: Record>(_: Context, _: DocumentId, record: R) -> BoxFuture<'static, ScaffoldResult<R>> {
    async move { Ok(record) }.boxed()
}

fn passthrough<R: Record>(
    _: Context,
    _: DocumentId,
    _: R,
    proposed: FieldSet,
) -> BoxFuture<'static, ScaffoldResult<FieldSet>> {
    async move { Ok(proposed) }.boxed()
}

fn ignore<R: Record>(_: Context, _: Document<R>) -> BoxFuture<'static, ()> {
    async {}.boxed()
}

impl<R: Record> Default for HooksBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}
