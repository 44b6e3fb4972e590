use async_trait::async_trait;
use sqlx::SqlitePool;
use time::OffsetDateTime;

use super::{BookRepository, RepositoryError};
use crate::modules::books::models::{Book, BookId, NewBook};

#[derive(Clone, Debug)]
pub struct SqliteBookRepository {
    pool: SqlitePool,
}

impl SqliteBookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Unique-index violations become `DuplicateIsbn`; isbn is the only unique column.
fn classify(err: sqlx::Error, isbn: &str) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::DuplicateIsbn(isbn.to_string());
        }
    }
    RepositoryError::Database(err)
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn insert(&self, book: &NewBook, now: OffsetDateTime) -> Result<Book, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let created = sqlx::query_as::<_, Book>(
            r#"INSERT INTO books (title, author, isbn, publication_year, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               RETURNING id, title, author, isbn, publication_year, created_at, updated_at"#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.publication_year)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| classify(err, &book.isbn))?;
        tx.commit().await?;
        Ok(created)
    }

    async fn update(
        &self,
        id: BookId,
        book: &NewBook,
        now: OffsetDateTime,
    ) -> Result<Option<Book>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, Book>(
            r#"UPDATE books
               SET title = ?, author = ?, isbn = ?, publication_year = ?, updated_at = ?
               WHERE id = ?
               RETURNING id, title, author, isbn, publication_year, created_at, updated_at"#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.publication_year)
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| classify(err, &book.isbn))?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete(&self, id: BookId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, isbn, publication_year, created_at, updated_at FROM books WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, RepositoryError> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, isbn, publication_year, created_at, updated_at FROM books WHERE isbn = ?",
        )
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, isbn, publication_year, created_at, updated_at FROM books ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = ?)")
            .bind(isbn)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn exists_by_isbn_and_id_not(
        &self,
        isbn: &str,
        id: BookId,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = ? AND id <> ?)",
        )
        .bind(isbn)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::testing;
    use time::macros::datetime;

    fn new_book(isbn: &str) -> NewBook {
        NewBook {
            title: "Domain-Driven Design".to_string(),
            author: "Eric Evans".to_string(),
            isbn: isbn.to_string(),
            publication_year: 2003,
        }
    }

    async fn repository() -> SqliteBookRepository {
        SqliteBookRepository::new(testing::pool().await)
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() {
        let repo = repository().await;
        let now = datetime!(2024-01-15 09:30:00.123456 UTC);

        let book = repo.insert(&new_book("0321125215"), now).await.unwrap();

        assert!(book.id > 0);
        assert_eq!(book.isbn, "0321125215");
        assert_eq!(book.created_at, now);
        assert_eq!(book.updated_at, now);
        assert_eq!(repo.find_by_id(book.id).await.unwrap(), Some(book));
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicate_isbn() {
        let repo = repository().await;
        let now = OffsetDateTime::now_utc();

        repo.insert(&new_book("0321125215"), now).await.unwrap();
        let err = repo.insert(&new_book("0321125215"), now).await.unwrap_err();

        assert!(matches!(err, RepositoryError::DuplicateIsbn(isbn) if isbn == "0321125215"));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_keeps_creation_time_and_detects_duplicates() {
        let repo = repository().await;
        let created_at = datetime!(2024-01-01 00:00:00 UTC);
        let updated_at = datetime!(2024-02-01 00:00:00 UTC);

        let first = repo.insert(&new_book("0321125215"), created_at).await.unwrap();
        let second = repo.insert(&new_book("9780321125217"), created_at).await.unwrap();

        let mut changed = new_book("0321125215");
        changed.title = "DDD".to_string();
        let updated = repo
            .update(first.id, &changed, updated_at)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.title, "DDD");
        assert_eq!(updated.created_at, created_at);
        assert_eq!(updated.updated_at, updated_at);

        let err = repo
            .update(second.id, &new_book("0321125215"), updated_at)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateIsbn(_)));

        assert!(repo
            .update(9999, &new_book("1111111111"), updated_at)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn isbn_lookups() {
        let repo = repository().await;
        let book = repo
            .insert(&new_book("0321125215"), OffsetDateTime::now_utc())
            .await
            .unwrap();

        assert!(repo.exists_by_isbn("0321125215").await.unwrap());
        assert!(!repo.exists_by_isbn("9780321125217").await.unwrap());
        assert!(!repo
            .exists_by_isbn_and_id_not("0321125215", book.id)
            .await
            .unwrap());
        assert!(repo
            .exists_by_isbn_and_id_not("0321125215", book.id + 1)
            .await
            .unwrap());
        assert_eq!(
            repo.find_by_isbn("0321125215").await.unwrap().map(|b| b.id),
            Some(book.id)
        );
        assert!(repo.find_by_isbn("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_and_list() {
        let repo = repository().await;
        assert!(repo.find_all().await.unwrap().is_empty());

        let now = OffsetDateTime::now_utc();
        let a = repo.insert(&new_book("0321125215"), now).await.unwrap();
        let b = repo.insert(&new_book("9780321125217"), now).await.unwrap();

        let ids: Vec<BookId> = repo.find_all().await.unwrap().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);

        assert!(repo.delete(a.id).await.unwrap());
        assert!(!repo.delete(a.id).await.unwrap());
        assert!(repo.find_by_id(a.id).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
