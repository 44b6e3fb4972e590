use std::sync::Arc;

use time::OffsetDateTime;

use super::models::{Book, BookId, BookSubmission};
use super::repository::{BookRepository, RepositoryError};
use super::validation::ValidationErrors;

/// Typed outcomes of catalog operations.
#[derive(thiserror::Error, Debug)]
pub enum BookError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("isbn already registered: {isbn}")]
    Conflict { isbn: String },

    #[error("book not found with id: {0}")]
    NotFoundById(BookId),

    #[error("book not found with isbn: {0}")]
    NotFoundByIsbn(String),

    #[error("storage failure: {0}")]
    Store(#[source] RepositoryError),
}

impl From<RepositoryError> for BookError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateIsbn(isbn) => BookError::Conflict { isbn },
            other => BookError::Store(other),
        }
    }
}

/// Catalog operations: validation, ISBN uniqueness and existence checks over a
/// [`BookRepository`].
pub struct BookService {
    repository: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    pub async fn create_book(&self, submission: &BookSubmission) -> Result<Book, BookError> {
        let book = submission.validate(current_year())?;

        // Early exit for the common case; the unique index still guards races.
        if self.repository.exists_by_isbn(&book.isbn).await? {
            tracing::warn!(isbn = %book.isbn, "rejected create: isbn already registered");
            return Err(BookError::Conflict { isbn: book.isbn });
        }

        let created = self
            .repository
            .insert(&book, OffsetDateTime::now_utc())
            .await
            .inspect_err(|err| log_write_failure("create", err))?;

        tracing::info!(book_id = created.id, isbn = %created.isbn, "book created");
        Ok(created)
    }

    pub async fn list_books(&self) -> Result<Vec<Book>, BookError> {
        Ok(self.repository.find_all().await?)
    }

    pub async fn get_book(&self, id: BookId) -> Result<Book, BookError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(BookError::NotFoundById(id))
    }

    pub async fn get_book_by_isbn(&self, isbn: &str) -> Result<Book, BookError> {
        self.repository
            .find_by_isbn(isbn)
            .await?
            .ok_or_else(|| BookError::NotFoundByIsbn(isbn.to_string()))
    }

    pub async fn update_book(
        &self,
        id: BookId,
        submission: &BookSubmission,
    ) -> Result<Book, BookError> {
        let book = submission.validate(current_year())?;

        let existing = self.get_book(id).await?;
        if existing.isbn != book.isbn
            && self
                .repository
                .exists_by_isbn_and_id_not(&book.isbn, id)
                .await?
        {
            tracing::warn!(book_id = id, isbn = %book.isbn, "rejected update: isbn already registered");
            return Err(BookError::Conflict { isbn: book.isbn });
        }

        let updated = self
            .repository
            .update(id, &book, OffsetDateTime::now_utc())
            .await
            .inspect_err(|err| log_write_failure("update", err))?
            // deleted between the lookup and the write
            .ok_or(BookError::NotFoundById(id))?;

        tracing::info!(book_id = updated.id, isbn = %updated.isbn, "book updated");
        Ok(updated)
    }

    pub async fn delete_book(&self, id: BookId) -> Result<(), BookError> {
        if !self.repository.delete(id).await? {
            return Err(BookError::NotFoundById(id));
        }

        tracing::info!(book_id = id, "book deleted");
        Ok(())
    }
}

fn current_year() -> i32 {
    OffsetDateTime::now_utc().year()
}

fn log_write_failure(operation: &str, err: &RepositoryError) {
    match err {
        RepositoryError::DuplicateIsbn(isbn) => {
            tracing::warn!(operation, isbn = %isbn, "unique index rejected write");
        }
        RepositoryError::Database(source) => {
            tracing::error!(operation, error = %source, "book write failed");
        }
    }
}
