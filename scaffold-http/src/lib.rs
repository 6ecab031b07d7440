//! HTTP transport for scaffold collections, built on axum.
//!
//! Each collection is served under its slug:
//!
//! | method   | path           | operation                      | success |
//! |----------|----------------|--------------------------------|---------|
//! | `POST`   | `/{slug}`      | insert                         | 201     |
//! | `GET`    | `/{slug}`      | paginated listing              | 200     |
//! | `GET`    | `/{slug}/{id}` | lookup by id                   | 200     |
//! | `PATCH`  | `/{slug}/{id}` | lookup, then partial update    | 200     |
//! | `DELETE` | `/{slug}/{id}` | delete hook, lookup, remove    | 200     |
//!
//! Responses use the envelope `{ "error"?: string, "data"?: T }`; listings add `count`
//! and `page`. Errors map onto statuses by their [`ErrorKind`](scaffold_core::error::ErrorKind).

pub mod error;
pub mod resource;
pub mod response;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use resource::{Resource, RestCollection};
pub use response::{ApiResponse, PaginatedResponse};
pub use routes::{RequestContext, collection_routes};
pub use server::{HttpServer, shutdown_signal};
