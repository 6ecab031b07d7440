//! CRUD endpoints for one collection.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequestParts, Path, Query as QueryParams, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE, request::Parts},
    response::Response,
    routing::get,
};
use serde_json::Value;
use std::{collections::HashMap, convert::Infallible};

use scaffold_core::{
    collection::Collection,
    context::Context,
    document::{Document, DocumentId},
    error::{ErrorKind, ScaffoldError},
    page::PaginationParams,
    query::Query,
    record::Record,
};

use crate::{
    error::{ApiError, error_response},
    response::{ApiResponse, PaginatedResponse},
};

const DEFAULT_LIMIT: i64 = 10;
const DEFAULT_PAGE: i64 = 1;

type ApiResult<T> = Result<T, ApiError>;

/// The request [`Context`], or an empty one when no middleware installed it.
#[derive(Debug, Clone, Default)]
pub struct RequestContext(pub Context);

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<Context>()
                .cloned()
                .unwrap_or_default(),
        ))
    }
}

/// Builds the five CRUD routes for `collection` under `/{slug}` and `/{slug}/{id}`.
pub fn collection_routes<R: Record>(collection: Collection<R>) -> Router {
    let base = format!("/{}", collection.slug());
    let item = format!("/{}/{{id}}", collection.slug());

    Router::new()
        .route(
            &base,
            get(list::<R>)
                .post(create::<R>)
                .fallback(method_not_allowed),
        )
        .route(
            &item,
            get(read::<R>)
                .patch(update::<R>)
                .delete(remove::<R>)
                .fallback(method_not_allowed),
        )
        .with_state(collection)
}

pub(crate) async fn method_not_allowed() -> Response {
    error_response(ErrorKind::MethodNotAllowed)
}

/// Accepts `application/json`, with or without parameters.
fn require_json(headers: &HeaderMap) -> ApiResult<()> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"));

    if is_json {
        Ok(())
    } else {
        Err(ScaffoldError::bad_request("content type must be application/json").into())
    }
}

fn parse_id(raw: &str) -> ApiResult<DocumentId> {
    Ok(raw.parse::<DocumentId>()?)
}

/// Reads a positive integer parameter, falling back to `default` when absent.
fn positive_param(params: &HashMap<String, String>, name: &str, default: i64) -> ApiResult<usize> {
    let value = match params.get(name) {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ScaffoldError::bad_request(format!("{name} must be an integer")))?,
        None => default,
    };

    if value < 1 {
        return Err(ScaffoldError::bad_request(format!("{name} must be greater than 0")).into());
    }

    usize::try_from(value)
        .map_err(|_| ScaffoldError::bad_request(format!("{name} is out of range")).into())
}

async fn create<R: Record>(
    State(collection): State<Collection<R>>,
    RequestContext(ctx): RequestContext,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ApiResponse<Document<R>>>)> {
    require_json(&headers)?;

    let record: R = serde_json::from_slice(&body)
        .map_err(|err| ScaffoldError::bad_request(format!("invalid body: {err}")))?;
    let document = collection.insert(&ctx, record).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::data(document))))
}

async fn list<R: Record>(
    State(collection): State<Collection<R>>,
    RequestContext(ctx): RequestContext,
    QueryParams(params): QueryParams<HashMap<String, String>>,
) -> ApiResult<Json<PaginatedResponse<Document<R>>>> {
    let limit = positive_param(&params, "limit", DEFAULT_LIMIT)?;
    let page = positive_param(&params, "page", DEFAULT_PAGE)?;

    let page = collection
        .find_page(&ctx, Query::new(), PaginationParams::new(page, limit))
        .await?;

    if page.is_empty() {
        return Err(ScaffoldError::bad_request("no data").into());
    }

    Ok(Json(PaginatedResponse::new(page.items, page.page)))
}

async fn read<R: Record>(
    State(collection): State<Collection<R>>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Document<R>>>> {
    let document = collection
        .find_by_id(&ctx, parse_id(&id)?)
        .await?;

    Ok(Json(ApiResponse::data(document)))
}

async fn update<R: Record>(
    State(collection): State<Collection<R>>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<Document<R>>>> {
    require_json(&headers)?;

    let mut document = collection
        .find_by_id(&ctx, parse_id(&id)?)
        .await?;

    let fields = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return Err(ScaffoldError::bad_request("body must be a JSON object").into()),
        Err(err) => return Err(ScaffoldError::bad_request(format!("invalid body: {err}")).into()),
    };

    collection
        .update(&ctx, &mut document, fields)
        .await?;

    Ok(Json(ApiResponse::data(document)))
}

async fn remove<R: Record>(
    State(collection): State<Collection<R>>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    collection
        .delete_by_id(&ctx, parse_id(&id)?)
        .await?;

    Ok(Json(ApiResponse::empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn json_content_type_may_carry_parameters() {
        assert!(require_json(&headers("application/json")).is_ok());
        assert!(require_json(&headers("application/json; charset=utf-8")).is_ok());
        assert!(require_json(&headers("text/plain")).is_err());
        assert!(require_json(&HeaderMap::new()).is_err());
    }

    #[test]
    fn paging_parameters_default_and_validate() {
        assert_eq!(positive_param(&params(&[]), "limit", DEFAULT_LIMIT).unwrap(), 10);
        assert_eq!(positive_param(&params(&[("page", "3")]), "page", DEFAULT_PAGE).unwrap(), 3);

        let zero = positive_param(&params(&[("page", "0")]), "page", DEFAULT_PAGE).unwrap_err();
        assert_eq!(zero.public_message(), "page must be greater than 0");

        let negative = positive_param(&params(&[("limit", "-5")]), "limit", DEFAULT_LIMIT).unwrap_err();
        assert_eq!(negative.public_message(), "limit must be greater than 0");

        assert!(positive_param(&params(&[("limit", "ten")]), "limit", DEFAULT_LIMIT).is_err());
    }

    #[test]
    fn malformed_ids_are_bad_requests() {
        let err = parse_id("not-a-uuid").unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "invalid id");
    }
}
