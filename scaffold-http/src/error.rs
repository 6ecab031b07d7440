//! Mapping of [`ScaffoldError`] onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use scaffold_core::error::{ErrorKind, ScaffoldError};

use crate::response::ApiResponse;

/// A [`ScaffoldError`] on its way out as a JSON error response.
///
/// Handlers return `Result<_, ApiError>` and use `?` on collection operations.
#[derive(Debug)]
pub struct ApiError(pub ScaffoldError);

impl From<ScaffoldError> for ApiError {
    fn from(err: ScaffoldError) -> Self {
        Self(err)
    }
}

pub fn status_of(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Builds the error response for `kind` with its default message.
pub fn error_response(kind: ErrorKind) -> Response {
    (status_of(kind), Json(ApiResponse::error(kind.default_message()))).into_response()
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        status_of(self.0.kind())
    }

    /// The message sent to the client. Store and codec failures are reported with the
    /// generic phrase; explicit `Internal` messages raised by hooks pass through.
    pub fn public_message(&self) -> String {
        match &self.0 {
            ScaffoldError::Internal(_) => self.0.message(),
            err if err.kind() == ErrorKind::Internal => ErrorKind::Internal
                .default_message()
                .to_string(),
            err => err.message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(target: "scaffold::http", error = %self.0, "request failed");
        } else {
            tracing::debug!(target: "scaffold::http", error = %self.0, %status, "request rejected");
        }

        (status, Json(ApiResponse::error(self.public_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(ApiError(ScaffoldError::not_found()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError(ScaffoldError::InvalidFieldType("age".into())).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(ScaffoldError::forbidden("")).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError(ScaffoldError::Backend("down".into())).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_failures_are_not_leaked() {
        assert_eq!(
            ApiError(ScaffoldError::Backend("connection refused".into())).public_message(),
            "internal server error"
        );
        assert_eq!(ApiError(ScaffoldError::Internal("quota".into())).public_message(), "quota");
        assert_eq!(ApiError(ScaffoldError::unauthorized("")).public_message(), "unauthorized");
    }
}
