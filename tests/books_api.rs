use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use bookstore_app::Application;
use bookstore_kernel::settings::{DatabaseSettings, Settings};

async fn app() -> Router {
    let settings = Settings {
        database: DatabaseSettings::in_memory(),
        ..Settings::default()
    };
    Application::build(settings).await.unwrap().router()
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, json)
}

fn clean_code() -> Value {
    json!({
        "title": "Clean Code",
        "author": "Robert C. Martin",
        "isbn": "0132350884",
        "publicationYear": 2008
    })
}

#[tokio::test]
async fn create_then_fetch() {
    let app = app().await;

    let (status, created) = send(&app, Method::POST, "/api/books", Some(clean_code())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Clean Code");
    assert_eq!(created["publicationYear"], 2008);
    assert_eq!(created["createdAt"], created["updatedAt"]);
    let id = created["id"].as_i64().unwrap();

    let (status, fetched) = send(&app, Method::GET, &format!("/api/books/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, by_isbn) = send(&app, Method::GET, "/api/books/isbn/0132350884", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_isbn["id"], id);
}

#[tokio::test]
async fn invalid_submission_lists_field_errors() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/books",
        Some(json!({ "title": "", "isbn": "12-34", "publicationYear": 999 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], "Bad Request");
    assert_eq!(body["message"], "validation failed");
    assert_eq!(body["path"], "/api/books");
    assert!(body["timestamp"].is_string());

    let fields: Vec<&str> = body["field_errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["title", "author", "isbn", "publicationYear"]);
}

#[tokio::test]
async fn duplicate_isbn_conflicts() {
    let app = app().await;
    send(&app, Method::POST, "/api/books", Some(clean_code())).await;

    let (status, body) = send(&app, Method::POST, "/api/books", Some(clean_code())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "isbn already registered: 0132350884");
    assert!(body.get("field_errors").is_none());
}

#[tokio::test]
async fn update_rules() {
    let app = app().await;
    let (_, first) = send(&app, Method::POST, "/api/books", Some(clean_code())).await;
    let (_, second) = send(
        &app,
        Method::POST,
        "/api/books",
        Some(json!({
            "title": "Refactoring",
            "author": "Martin Fowler",
            "isbn": "9780201485677",
            "publicationYear": 1999
        })),
    )
    .await;
    let first_uri = format!("/api/books/{}", first["id"]);

    let mut renamed = clean_code();
    renamed["title"] = json!("Clean Code (annotated)");
    let (status, updated) = send(&app, Method::PUT, &first_uri, Some(renamed)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], first["id"]);
    assert_eq!(updated["title"], "Clean Code (annotated)");
    assert_eq!(updated["createdAt"], first["createdAt"]);

    let mut stolen = clean_code();
    stolen["isbn"] = second["isbn"].clone();
    let (status, body) = send(&app, Method::PUT, &first_uri, Some(stolen)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["path"], first_uri);

    let (status, body) = send(&app, Method::PUT, "/api/books/9999", Some(clean_code())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "book not found with id: 9999");
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = app().await;
    let (_, created) = send(&app, Method::POST, "/api/books", Some(clean_code())).await;
    let uri = format!("/api/books/{}", created["id"]);

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["path"], uri);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_returns_all_books() {
    let app = app().await;

    let (status, books) = send(&app, Method::GET, "/api/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(books, json!([]));

    for isbn in ["0132350884", "9780201485677", "0-321-12521-5"] {
        let mut book = clean_code();
        book["isbn"] = json!(isbn);
        let (status, _) = send(&app, Method::POST, "/api/books", Some(book)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, books) = send(&app, Method::GET, "/api/books", None).await;
    assert_eq!(books.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/api/books/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["path"], "/api/books/abc");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/books")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_isbn_and_routes_are_not_found() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/api/books/isbn/0132350884", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "book not found with isbn: 0132350884");

    let (status, body) = send(&app, Method::GET, "/api/authors", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["path"], "/api/authors");
}

#[tokio::test]
async fn health_and_docs_are_served() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));

    let (status, body) = send(&app, Method::GET, "/api/books/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("books module is healthy".into()));

    let (status, spec) = send(&app, Method::GET, "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(spec["paths"]["/api/books"]["post"].is_object());
    assert!(spec["paths"]["/api/books/{id}"]["delete"].is_object());
    assert!(spec["components"]["schemas"]["Book"].is_object());
}
