//! Mountable resources: a collection description plus how to serve it.

use async_trait::async_trait;
use axum::Router;

use scaffold_core::{
    collection::{Collection, CollectionConfig},
    error::ScaffoldResult,
    record::Record,
    store::DocumentStore,
};

use crate::routes::collection_routes;

/// Something the server can activate against a store and route to.
#[async_trait]
pub trait Resource: Send {
    fn name(&self) -> &str;

    fn slug(&self) -> &str;

    /// Activates the backing collection (creating and seeding it) and returns its routes.
    async fn mount(self: Box<Self>, store: &DocumentStore) -> ScaffoldResult<Router>;
}

#[async_trait]
impl<R: Record> Resource for CollectionConfig<R> {
    fn name(&self) -> &str {
        CollectionConfig::name(self)
    }

    fn slug(&self) -> &str {
        CollectionConfig::slug(self)
    }

    async fn mount(self: Box<Self>, store: &DocumentStore) -> ScaffoldResult<Router> {
        let collection = self.activate(store).await?;

        Ok(collection_routes(collection))
    }
}

type Middleware = Box<dyn FnOnce(Router) -> Router + Send>;
type ExtraRoutes<R> = Box<dyn FnOnce(Collection<R>) -> Router + Send>;

/// A collection served with its own middleware and additional routes.
///
/// Extra routes are merged with the CRUD routes before middleware is applied, so
/// middleware covers both. Middleware registered first ends up innermost.
///
/// ```ignore
/// let users = RestCollection::new(config)
///     .middleware(|router| router.layer(axum::middleware::from_fn(require_user)))
///     .route(|users| {
///         Router::new()
///             .route("/users/me", get(me))
///             .with_state(users)
///     });
/// ```
pub struct RestCollection<R: Record> {
    config: CollectionConfig<R>,
    middleware: Vec<Middleware>,
    routes: Vec<ExtraRoutes<R>>,
}

impl<R: Record> RestCollection<R> {
    pub fn new(config: CollectionConfig<R>) -> Self {
        Self {
            config,
            middleware: Vec::new(),
            routes: Vec::new(),
        }
    }

    pub fn middleware(mut self, apply: impl FnOnce(Router) -> Router + Send + 'static) -> Self {
        self.middleware.push(Box::new(apply));
        self
    }

    /// Adds routes built from the live collection.
    pub fn route(mut self, build: impl FnOnce(Collection<R>) -> Router + Send + 'static) -> Self {
        self.routes.push(Box::new(build));
        self
    }
}

impl<R: Record> From<CollectionConfig<R>> for RestCollection<R> {
    fn from(config: CollectionConfig<R>) -> Self {
        Self::new(config)
    }
}

#[async_trait]
impl<R: Record> Resource for RestCollection<R> {
    fn name(&self) -> &str {
        self.config.name()
    }

    fn slug(&self) -> &str {
        self.config.slug()
    }

    async fn mount(self: Box<Self>, store: &DocumentStore) -> ScaffoldResult<Router> {
        let RestCollection {
            config,
            middleware,
            routes,
        } = *self;

        let collection = config.activate(store).await?;
        let mut router = routes
            .into_iter()
            .fold(collection_routes(collection.clone()), |router, build| {
                router.merge(build(collection.clone()))
            });

        for apply in middleware {
            router = apply(router);
        }

        Ok(router)
    }
}
