//! The types most applications need, in one import:
//!
//! ```ignore
//! use scaffold::prelude::*;
//! ```

pub use scaffold_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    collection::{Collection, CollectionConfig, UpdateOutcome},
    context::Context,
    document::{DefaultDocument, Document, DocumentId},
    error::{ErrorKind, ScaffoldError, ScaffoldResult},
    hooks::{Hooks, HooksBuilder},
    page::{Page, PaginationParams},
    query::{Expr, Filter, Query, SortDirection},
    record::{FieldSet, Record},
    store::DocumentStore,
};
pub use scaffold_http::{Resource, RestCollection};
pub use scaffold_macros::Record;
pub use scaffold_memory::InMemoryStore;

pub use crate::{app::Scaffold, config::ScaffoldConfig};
