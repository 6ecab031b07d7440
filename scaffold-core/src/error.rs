//! Error types and result types for collection and store operations.
//!
//! Every fallible operation in the workspace returns [`ScaffoldResult<T>`]. Errors carry
//! an [`ErrorKind`] which the HTTP layer maps onto a status code, so hooks choose how a
//! veto is reported simply by picking the variant they return.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised by collections, hooks, and store backends.
#[derive(Error, Debug)]
pub enum ScaffoldError {
    /// No document matched the lookup.
    #[error("{0}")]
    NotFound(String),
    /// The caller supplied malformed input.
    #[error("{0}")]
    BadRequest(String),
    /// A reconciliation value did not match the declared type of the named field.
    #[error("value type does not match field type for {0}")]
    InvalidFieldType(String),
    /// The caller is not authenticated. Usually returned by an access or delete hook.
    #[error("{0}")]
    Unauthorized(String),
    /// The caller is authenticated but not allowed to touch the document.
    #[error("{0}")]
    Forbidden(String),
    /// An unclassified failure.
    #[error("{0}")]
    Internal(String),
    /// A document with the given ID already exists in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// The document with the given ID does not exist in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("document {0} not found in collection {1}")]
    DocumentNotFound(String, String),
    /// The named store collection does not exist.
    #[error("collection {0} not found")]
    CollectionNotFound(String),
    /// A stored value does not have the shape of a document.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    /// Conversion between BSON, JSON, and record types failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Store or server setup failed.
    #[error("initialization error: {0}")]
    Initialization(String),
    /// The underlying storage backend reported an error.
    #[error("backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for scaffold operations.
pub type ScaffoldResult<T> = Result<T, ScaffoldError>;

/// Coarse classification of a [`ScaffoldError`], used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Unauthorized,
    Forbidden,
    MethodNotAllowed,
    Internal,
}

impl ErrorKind {
    /// The phrase reported when an error of this kind carries no message.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::BadRequest => "bad request",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::MethodNotAllowed => "method not allowed",
            ErrorKind::Internal => "internal server error",
        }
    }
}

impl ScaffoldError {
    /// Shorthand for a [`ScaffoldError::NotFound`] with the default message.
    pub fn not_found() -> Self {
        ScaffoldError::NotFound(String::new())
    }

    /// Shorthand for a [`ScaffoldError::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        ScaffoldError::BadRequest(message.into())
    }

    /// Shorthand for a [`ScaffoldError::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ScaffoldError::Unauthorized(message.into())
    }

    /// Shorthand for a [`ScaffoldError::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        ScaffoldError::Forbidden(message.into())
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScaffoldError::NotFound(_) | ScaffoldError::DocumentNotFound(..) => ErrorKind::NotFound,
            ScaffoldError::BadRequest(_)
            | ScaffoldError::InvalidFieldType(_)
            | ScaffoldError::DocumentAlreadyExists(..) => ErrorKind::BadRequest,
            ScaffoldError::Unauthorized(_) => ErrorKind::Unauthorized,
            ScaffoldError::Forbidden(_) => ErrorKind::Forbidden,
            ScaffoldError::Internal(_)
            | ScaffoldError::CollectionNotFound(_)
            | ScaffoldError::InvalidDocument(_)
            | ScaffoldError::Serialization(_)
            | ScaffoldError::Initialization(_)
            | ScaffoldError::Backend(_) => ErrorKind::Internal,
        }
    }

    /// Returns the user-facing message, falling back to the kind's default phrase
    /// when the error was raised without one.
    pub fn message(&self) -> String {
        let message = self.to_string();

        if message.trim().is_empty() {
            self.kind()
                .default_message()
                .to_string()
        } else {
            message
        }
    }
}

impl From<BsonError> for ScaffoldError {
    fn from(err: BsonError) -> Self {
        ScaffoldError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for ScaffoldError {
    fn from(err: SerdeJsonError) -> Self {
        ScaffoldError::Serialization(err.to_string())
    }
}
