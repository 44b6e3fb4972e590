//! HTTP surface of the books module, mounted under `/api/books`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};

use bookstore_http::error::{AppError, FieldError};

use super::models::{Book, BookId, BookSubmission};
use super::service::{BookError, BookService};

type ApiResult<T> = Result<T, AppError>;

pub fn router(service: Arc<BookService>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route("/isbn/{isbn}", get(get_book_by_isbn))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(service)
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::Validation(errors) => AppError::validation(
                errors
                    .violations()
                    .iter()
                    .map(|v| FieldError::new(v.field, v.message.clone()))
                    .collect(),
                "validation failed",
            ),
            BookError::Conflict { .. } => AppError::conflict(err.to_string()),
            BookError::NotFoundById(_) | BookError::NotFoundByIsbn(_) => {
                AppError::not_found(err.to_string())
            }
            BookError::Store(source) => AppError::Internal(anyhow::Error::new(source)),
        }
    }
}

fn json_body(payload: Result<Json<BookSubmission>, JsonRejection>) -> ApiResult<BookSubmission> {
    payload
        .map(|Json(submission)| submission)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

fn book_id(id: Result<Path<BookId>, PathRejection>) -> ApiResult<BookId> {
    id.map(|Path(id)| id)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(State(service): State<Arc<BookService>>) -> ApiResult<Json<Vec<Book>>> {
    Ok(Json(service.list_books().await?))
}

async fn create_book(
    State(service): State<Arc<BookService>>,
    payload: Result<Json<BookSubmission>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    let submission = json_body(payload)?;
    let book = service.create_book(&submission).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn get_book(
    State(service): State<Arc<BookService>>,
    id: Result<Path<BookId>, PathRejection>,
) -> ApiResult<Json<Book>> {
    let id = book_id(id)?;
    Ok(Json(service.get_book(id).await?))
}

async fn get_book_by_isbn(
    State(service): State<Arc<BookService>>,
    Path(isbn): Path<String>,
) -> ApiResult<Json<Book>> {
    Ok(Json(service.get_book_by_isbn(&isbn).await?))
}

async fn update_book(
    State(service): State<Arc<BookService>>,
    id: Result<Path<BookId>, PathRejection>,
    payload: Result<Json<BookSubmission>, JsonRejection>,
) -> ApiResult<Json<Book>> {
    let id = book_id(id)?;
    let submission = json_body(payload)?;
    Ok(Json(service.update_book(id, &submission).await?))
}

async fn delete_book(
    State(service): State<Arc<BookService>>,
    id: Result<Path<BookId>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = book_id(id)?;
    service.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
