//! MongoDB storage backend for scaffold.
//!
//! Enable it with the `mongodb` feature of the `scaffold` crate and set a connection
//! string (`SCAFFOLD_MONGO_URI`) to make it the active backend:
//!
//! ```toml
//! [dependencies]
//! scaffold = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! Filters are translated into MongoDB query documents and evaluated by the server.
//! Partial updates are applied with `$set`, so only the changed fields are written.
//!
//! ```ignore
//! use scaffold::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
//!
//! let backend = MongoDbStore::builder("mongodb://localhost:27017", "app")
//!     .build()
//!     .await?;
//! ```

pub mod store;

mod query;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
