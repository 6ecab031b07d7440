//! Process bootstrap: pick a store, mount resources, serve.

use axum::Router;
use std::collections::HashSet;
use tracing::info;

use scaffold_core::{
    backend::StoreBackendBuilder,
    error::{ScaffoldError, ScaffoldResult},
    store::DocumentStore,
};
use scaffold_http::{HttpServer, Resource, shutdown_signal};
use scaffold_memory::InMemoryStore;

use crate::{config::ScaffoldConfig, telemetry};

/// Collects resources and runs them behind one HTTP server.
///
/// ```ignore
/// Scaffold::new(ScaffoldConfig::from_env()?)
///     .collection(tasks)
///     .collection(RestCollection::new(users).middleware(require_user))
///     .run()
///     .await?;
/// ```
pub struct Scaffold {
    config: ScaffoldConfig,
    resources: Vec<Box<dyn Resource>>,
    store: Option<DocumentStore>,
}

impl Scaffold {
    pub fn new(config: ScaffoldConfig) -> Self {
        Self {
            config,
            resources: Vec::new(),
            store: None,
        }
    }

    pub fn config(&self) -> &ScaffoldConfig {
        &self.config
    }

    pub fn collection(mut self, resource: impl Resource + 'static) -> Self {
        self.resources.push(Box::new(resource));
        self
    }

    /// Uses `store` instead of the backend the configuration selects.
    pub fn with_store(mut self, store: DocumentStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Connects the store and activates every resource, in registration order.
    ///
    /// # Errors
    ///
    /// Fails on duplicate slugs, an unavailable backend, or a failed activation.
    pub async fn mount(self) -> ScaffoldResult<Mounted> {
        let mut slugs = HashSet::new();
        for resource in &self.resources {
            if !slugs.insert(resource.slug().to_string()) {
                return Err(ScaffoldError::Initialization(format!(
                    "slug {} is used by more than one collection",
                    resource.slug()
                )));
            }
        }

        let store = match self.store {
            Some(store) => store,
            None => connect(&self.config).await?,
        };

        let mut server = HttpServer::new().timeout(self.config.request_timeout);
        for resource in self.resources {
            info!(target: "scaffold::app", name = %resource.name(), slug = %resource.slug(), "mounting collection");
            server = server.merge(resource.mount(&store).await?);
        }

        Ok(Mounted {
            server,
            store,
            address: self.config.address,
        })
    }

    /// Mounts everything and returns the complete router.
    pub async fn router(self) -> ScaffoldResult<Router> {
        Ok(self.mount().await?.into_router())
    }

    /// Installs logging, mounts, and serves until Ctrl-C, then shuts the store down.
    pub async fn run(self) -> ScaffoldResult<()> {
        telemetry::init(&self.config.log_filter)?;

        let mounted = self.mount().await?;
        let store = mounted.store.clone();

        let served = mounted.serve(shutdown_signal()).await;
        store.shutdown().await?;

        served
    }
}

/// A store with every resource activated against it.
#[derive(Debug)]
pub struct Mounted {
    server: HttpServer,
    store: DocumentStore,
    address: String,
}

impl Mounted {
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn into_router(self) -> Router {
        self.server.into_router()
    }

    pub async fn serve<F>(self, shutdown: F) -> ScaffoldResult<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.server
            .serve(&self.address, shutdown)
            .await
    }
}

/// Builds the backend the configuration selects.
async fn connect(config: &ScaffoldConfig) -> ScaffoldResult<DocumentStore> {
    match config.mongo_uri.as_deref() {
        #[cfg(feature = "mongodb")]
        Some(uri) => {
            let backend = scaffold_mongodb::MongoDbStore::builder(uri, &config.database)
                .build()
                .await?;

            Ok(DocumentStore::new(backend))
        }
        #[cfg(not(feature = "mongodb"))]
        Some(_) => Err(ScaffoldError::Initialization(
            "a MongoDB URI is configured but the mongodb feature is disabled".to_string(),
        )),
        None => {
            info!(target: "scaffold::app", "no MongoDB URI configured, storing documents in memory");
            Ok(DocumentStore::new(InMemoryStore::builder().build().await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "mongodb"))]
    #[tokio::test]
    async fn mongo_uri_without_the_feature_fails() {
        let config = ScaffoldConfig::builder()
            .mongo_uri("mongodb://localhost:27017")
            .build();

        let err = Scaffold::new(config).mount().await.unwrap_err();

        assert!(matches!(err, ScaffoldError::Initialization(_)));
    }

    #[tokio::test]
    async fn defaults_to_memory() {
        let mounted = Scaffold::new(ScaffoldConfig::default())
            .mount()
            .await
            .unwrap();

        assert!(mounted.store().list_collections().await.unwrap().is_empty());
    }
}
