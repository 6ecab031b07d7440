//! In-memory storage backend for scaffold.
//!
//! [`InMemoryStore`] keeps every collection in process behind an async read-write lock. It
//! evaluates query filters and sorting itself and returns unsorted results in insertion
//! order. It is the default backend when no MongoDB URI is configured, and the backend
//! used throughout the test suites.
//!
//! ```ignore
//! use scaffold::{DocumentStore, memory::InMemoryStore};
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! ```

pub mod store;

mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
