//! Declarative CRUD REST resources over a document store.
//!
//! Describe a record type, configure its hooks, and `scaffold` serves it:
//!
//! ```ignore
//! use scaffold::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Record)]
//! pub struct Task {
//!     pub title: String,
//!     #[serde(rename = "isDone")]
//!     pub done: bool,
//! }
//!
//! #[tokio::main]
//! async fn main() -> ScaffoldResult<()> {
//!     let tasks = CollectionConfig::<Task>::builder("Tasks", "tasks")
//!         .access(|ctx, _id| async move {
//!             match ctx.get_str("user") {
//!                 Some(_) => Ok(()),
//!                 None => Err(ScaffoldError::unauthorized("")),
//!             }
//!         })
//!         .build();
//!
//!     Scaffold::new(ScaffoldConfig::from_env()?)
//!         .collection(tasks)
//!         .run()
//!         .await
//! }
//! ```
//!
//! This serves `POST /tasks`, `GET /tasks?limit=&page=`, and `GET`, `PATCH`, `DELETE`
//! on `/tasks/{id}`. A `PATCH` body is reconciled field by field: only values that
//! differ from the stored document are written, and a value of the wrong type rejects
//! the whole update.
//!
//! # Backends
//!
//! - [`memory`]: in-process storage, used when no MongoDB URI is configured
//! - `mongodb`: MongoDB storage (requires the `mongodb` feature)

pub mod app;
pub mod config;
pub mod prelude;
pub mod telemetry;

pub use scaffold_core::{
    backend, collection, context, document, error, hooks, page, query, reconcile, record, store,
};
pub use scaffold_http as http;
pub use scaffold_macros::Record;

pub use app::{Mounted, Scaffold};
pub use config::ScaffoldConfig;

pub use bson;

/// In-memory storage backend.
pub mod memory {
    pub use scaffold_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use scaffold_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
