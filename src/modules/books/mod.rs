pub mod models;
pub mod repository;
pub mod routes;
pub mod service;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookstore_kernel::{InitCtx, Migration, Module};
use sqlx::SqlitePool;

use repository::{BookRepository, SqliteBookRepository};
use service::BookService;

const INIT_SCHEMA: &str = r#"
    CREATE TABLE books (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        title            TEXT    NOT NULL,
        author           TEXT    NOT NULL,
        isbn             TEXT    NOT NULL,
        publication_year INTEGER NOT NULL,
        created_at       TEXT    NOT NULL,
        updated_at       TEXT    NOT NULL
    );
    CREATE UNIQUE INDEX books_isbn_unique ON books (isbn);
"#;

/// Book catalog: SQLite-backed storage behind the `/api/books` routes
pub struct BooksModule {
    repository: Arc<dyn BookRepository>,
    service: Arc<BookService>,
}

impl BooksModule {
    pub fn new(pool: SqlitePool) -> Self {
        let repository: Arc<dyn BookRepository> = Arc::new(SqliteBookRepository::new(pool));
        let service = Arc::new(BookService::new(repository.clone()));
        Self {
            repository,
            service,
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let books = self.repository.count().await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: INIT_SCHEMA,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(pool: SqlitePool) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(pool))
}

fn error_response(description: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let submission_body = serde_json::json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookSubmission" }
            }
        }
    });
    let id_param = serde_json::json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    });

    let collection = serde_json::json!({
        "get": {
            "summary": "List books",
            "tags": ["Books"],
            "responses": {
                "200": {
                    "description": "Every book in the catalog",
                    "content": {
                        "application/json": {
                            "schema": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Book" }
                            }
                        }
                    }
                },
                "500": error_response("Internal server error")
            }
        },
        "post": {
            "summary": "Create a book",
            "tags": ["Books"],
            "requestBody": submission_body,
            "responses": {
                "201": book_response("Book created"),
                "400": error_response("Validation failed or malformed body"),
                "409": error_response("ISBN already registered")
            }
        }
    });

    let health = serde_json::json!({
        "get": {
            "summary": "Books health check",
            "tags": ["Books"],
            "responses": {
                "200": {
                    "description": "OK",
                    "content": { "text/plain": { "schema": { "type": "string" } } }
                }
            }
        }
    });

    let by_isbn = serde_json::json!({
        "get": {
            "summary": "Find a book by ISBN",
            "tags": ["Books"],
            "parameters": [{
                "name": "isbn",
                "in": "path",
                "required": true,
                "schema": { "type": "string" }
            }],
            "responses": {
                "200": book_response("The matching book"),
                "404": error_response("No book with this ISBN")
            }
        }
    });

    let by_id = serde_json::json!({
        "get": {
            "summary": "Get a book",
            "tags": ["Books"],
            "parameters": [id_param],
            "responses": {
                "200": book_response("The requested book"),
                "400": error_response("Malformed id"),
                "404": error_response("No book with this id")
            }
        },
        "put": {
            "summary": "Replace a book's fields",
            "tags": ["Books"],
            "parameters": [id_param],
            "requestBody": submission_body,
            "responses": {
                "200": book_response("Book updated"),
                "400": error_response("Validation failed or malformed body"),
                "404": error_response("No book with this id"),
                "409": error_response("ISBN held by another book")
            }
        },
        "delete": {
            "summary": "Delete a book",
            "tags": ["Books"],
            "parameters": [id_param],
            "responses": {
                "204": { "description": "Book deleted" },
                "404": error_response("No book with this id")
            }
        }
    });

    let book = serde_json::json!({
        "type": "object",
        "properties": {
            "id": { "type": "integer", "format": "int64" },
            "title": { "type": "string", "maxLength": 255 },
            "author": { "type": "string", "maxLength": 255 },
            "isbn": { "type": "string", "description": "ISBN-10 or ISBN-13" },
            "publicationYear": { "type": "integer", "minimum": 1000, "maximum": 2100 },
            "createdAt": { "type": "string", "format": "date-time" },
            "updatedAt": { "type": "string", "format": "date-time" }
        },
        "required": ["id", "title", "author", "isbn", "publicationYear", "createdAt", "updatedAt"]
    });

    let submission = serde_json::json!({
        "type": "object",
        "properties": {
            "title": { "type": "string", "minLength": 1, "maxLength": 255 },
            "author": { "type": "string", "minLength": 1, "maxLength": 255 },
            "isbn": { "type": "string" },
            "publicationYear": { "type": "integer", "minimum": 1000, "maximum": 2100 }
        },
        "required": ["title", "author", "isbn", "publicationYear"]
    });

    serde_json::json!({
        "paths": {
            "/": collection,
            "/health": health,
            "/isbn/{isbn}": by_isbn,
            "/{id}": by_id
        },
        "components": {
            "schemas": {
                "Book": book,
                "BookSubmission": submission
            }
        }
    })
}
