mod sqlite;

pub use sqlite::SqliteBookRepository;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::models::{Book, BookId, NewBook};

#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    /// The unique ISBN index rejected the write.
    #[error("isbn {0} is already registered")]
    DuplicateIsbn(String),

    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable book storage. Writes are atomic per call; the store's unique index
/// on `isbn` is the final word on duplicates.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Insert a book stamped with `now`, returning it with its assigned id
    async fn insert(&self, book: &NewBook, now: OffsetDateTime) -> Result<Book, RepositoryError>;

    /// Overwrite the mutable fields of `id`; `None` if no such book exists
    async fn update(
        &self,
        id: BookId,
        book: &NewBook,
        now: OffsetDateTime,
    ) -> Result<Option<Book>, RepositoryError>;

    /// Remove a book, returning whether a row was deleted
    async fn delete(&self, id: BookId) -> Result<bool, RepositoryError>;

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError>;

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, RepositoryError>;

    /// Every stored book, ordered by id
    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError>;

    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool, RepositoryError>;

    /// Whether a book other than `id` holds `isbn`
    async fn exists_by_isbn_and_id_not(
        &self,
        isbn: &str,
        id: BookId,
    ) -> Result<bool, RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;
}
