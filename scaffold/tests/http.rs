mod common;

use axum::{
    Json, Router,
    body::Body,
    extract::{Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

use scaffold::{memory::InMemoryStore, prelude::*};

use common::Task;

#[derive(Debug, Clone, Serialize, Deserialize, Record)]
struct Note {
    body: String,
}

async fn authenticate(mut request: Request, next: Next) -> Response {
    let user = request
        .headers()
        .get("x-user")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    if let Some(user) = user {
        let ctx = request
            .extensions()
            .get::<Context>()
            .cloned()
            .unwrap_or_default()
            .with("user", user);
        request.extensions_mut().insert(ctx);
    }

    next.run(request).await
}

async fn note_stats(State(notes): State<Collection<Note>>) -> Json<Value> {
    let count = notes
        .find_many(&Context::new().with("user", "stats"), Query::new(), 100, 1)
        .await
        .map(|notes| notes.len())
        .unwrap_or_default();

    Json(json!({ "count": count }))
}

fn notes() -> RestCollection<Note> {
    let config = CollectionConfig::builder("Notes", "notes")
        .access(|ctx, _id| async move {
            if ctx.contains("user") {
                Ok(())
            } else {
                Err(ScaffoldError::unauthorized(""))
            }
        })
        .build();

    RestCollection::new(config)
        .middleware(|router| router.layer(middleware::from_fn(authenticate)))
        .route(|notes| {
            Router::new()
                .route("/stats/notes", get(note_stats))
                .with_state(notes)
        })
}

async fn app() -> Router {
    Scaffold::new(ScaffoldConfig::default())
        .with_store(DocumentStore::new(InMemoryStore::new()))
        .collection(CollectionConfig::<Task>::builder("Tasks", "tasks").build())
        .collection(notes())
        .router()
        .await
        .unwrap()
}

async fn send(app: &Router, request: axum::http::Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn create_task(app: &Router, title: &str) -> Value {
    let (status, body) = send(
        app,
        json_request("POST", "/tasks", json!({ "title": title, "isDone": false, "points": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    body["data"].clone()
}

#[tokio::test]
async fn crud_round() {
    let app = app().await;

    let created = create_task(&app, "a").await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["title"], "a");
    assert_eq!(created["created"], created["last_updated"]);

    let (status, body) = send(&app, empty_request("GET", &format!("/tasks/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], created);

    tokio::time::sleep(Duration::from_millis(5)).await;
    let (status, body) = send(
        &app,
        json_request("PATCH", &format!("/tasks/{id}"), json!({ "title": "b", "isDone": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "b");
    assert_eq!(body["data"]["isDone"], true);
    assert_ne!(body["data"]["last_updated"], created["last_updated"]);

    let (status, body) = send(&app, empty_request("DELETE", &format!("/tasks/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, body) = send(&app, empty_request("GET", &format!("/tasks/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "not found" }));

    let (status, _) = send(&app, empty_request("DELETE", &format!("/tasks/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_pages() {
    let app = app().await;

    let (status, body) = send(&app, empty_request("GET", "/tasks")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no data");

    for title in ["a", "b", "c"] {
        create_task(&app, title).await;
    }

    let (status, body) = send(&app, empty_request("GET", "/tasks?limit=2&page=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["page"], 2);
    assert_eq!(body["data"][0]["title"], "c");

    let (status, body) = send(&app, empty_request("GET", "/tasks")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["page"], 1);
}

#[tokio::test]
async fn listing_rejects_bad_parameters() {
    let app = app().await;

    for (uri, message) in [
        ("/tasks?page=0", "page must be greater than 0"),
        ("/tasks?limit=0", "limit must be greater than 0"),
        ("/tasks?limit=-1", "limit must be greater than 0"),
        ("/tasks?page=two", "page must be an integer"),
    ] {
        let (status, body) = send(&app, empty_request("GET", uri)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], message, "{uri}");
    }
}

#[tokio::test]
async fn malformed_input_is_a_bad_request() {
    let app = app().await;
    let id = create_task(&app, "a").await["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, empty_request("GET", "/tasks/not-an-id")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid id");

    let plain = axum::http::Request::builder()
        .method("POST")
        .uri("/tasks")
        .header(CONTENT_TYPE, "text/plain")
        .body(Body::from("title=a"))
        .unwrap();
    assert_eq!(send(&app, plain).await.0, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, json_request("POST", "/tasks", json!({ "title": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, json_request("PATCH", &format!("/tasks/{id}"), json!(["title"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, json_request("PATCH", &format!("/tasks/{id}"), json!({ "points": 1.5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "value type does not match field type for points");
}

#[tokio::test]
async fn charset_parameter_is_accepted() {
    let app = app().await;
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/tasks")
        .header(CONTENT_TYPE, "application/json; charset=utf-8")
        .body(Body::from(json!({ "title": "a", "isDone": false, "points": 1 }).to_string()))
        .unwrap();

    assert_eq!(send(&app, request).await.0, StatusCode::CREATED);
}

#[tokio::test]
async fn unmatched_paths_and_methods() {
    let app = app().await;

    let (status, body) = send(&app, empty_request("GET", "/nothing/here")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found");

    let (status, body) = send(&app, empty_request("PUT", "/tasks")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "method not allowed");
}

#[tokio::test]
async fn collection_middleware_feeds_hooks() {
    let app = app().await;
    let create = |user: Option<&str>| {
        let mut request = axum::http::Request::builder()
            .method("POST")
            .uri("/notes")
            .header(CONTENT_TYPE, "application/json");
        if let Some(user) = user {
            request = request.header("x-user", user);
        }
        request
            .body(Body::from(json!({ "body": "hello" }).to_string()))
            .unwrap()
    };

    let (status, body) = send(&app, create(Some("alice"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, empty_request("GET", &format!("/notes/{id}"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let authorized = axum::http::Request::builder()
        .uri(format!("/notes/{id}"))
        .header("x-user", "alice")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, authorized).await.0, StatusCode::OK);

    let (status, body) = send(&app, empty_request("GET", "/stats/notes")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn slow_requests_time_out() {
    let config = ScaffoldConfig::builder()
        .request_timeout(Duration::from_millis(20))
        .build();
    let slow = CollectionConfig::<Task>::builder("Tasks", "tasks")
        .write(|_ctx, _id, task: Task| async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(task)
        })
        .build();
    let app = Scaffold::new(config)
        .collection(slow)
        .router()
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        json_request("POST", "/tasks", json!({ "title": "a", "isDone": false, "points": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "request timed out");
}

#[tokio::test]
async fn duplicate_slugs_are_rejected() {
    let result = Scaffold::new(ScaffoldConfig::default())
        .collection(CollectionConfig::<Task>::builder("Tasks", "tasks").build())
        .collection(CollectionConfig::<Task>::builder("Other", "tasks").build())
        .mount()
        .await;

    assert!(matches!(result, Err(ScaffoldError::Initialization(_))));
}
