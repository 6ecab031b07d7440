//! Core of the scaffold workspace: typed document collections with an interception
//! pipeline, served as CRUD resources by `scaffold-http`.
//!
//! - **Records** ([`record`]) - the user schema and its static field table
//! - **Documents** ([`document`]) - identifier and timestamps around a record
//! - **Hooks** ([`hooks`]) - access, read, write, update, delete, and after-insert interception
//! - **Collections** ([`collection`]) - the CRUD engine, seeding, and activation
//! - **Reconciliation** ([`reconcile`]) - type-checked partial updates
//! - **Store** ([`store`], [`backend`]) - the storage abstraction shared by every collection
//! - **Queries** ([`query`], [`page`]) - backend-neutral filters and page arithmetic
//! - **Errors** ([`error`]) - the error taxonomy every layer reports in
//!
//! # Example
//!
//! ```ignore
//! use scaffold::prelude::*;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Record)]
//! pub struct Task {
//!     pub title: String,
//!     pub done: bool,
//! }
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let tasks = CollectionConfig::<Task>::builder("Tasks", "tasks")
//!     .build()
//!     .activate(&store)
//!     .await?;
//!
//! let task = tasks.insert(&Context::new(), Task { title: "write docs".into(), done: false }).await?;
//! ```

// The `Record` derive emits `::scaffold::...` paths; these aliases let the derive be used
// inside this crate and its unit tests.
#[allow(unused_extern_crates)]
extern crate self as scaffold_core;
#[allow(unused_extern_crates)]
extern crate self as scaffold;

pub mod backend;
pub mod collection;
pub mod context;
pub mod document;
pub mod error;
pub mod hooks;
pub mod page;
pub mod query;
pub mod reconcile;
pub mod record;
pub mod store;
