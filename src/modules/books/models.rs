use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Store-assigned book identifier.
pub type BookId = i64;

/// A persisted catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier, assigned by the store on insert
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// ISBN-10 or ISBN-13, unique across the catalog
    pub isbn: String,
    pub publication_year: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Unvalidated create/update payload. Every field is optional on the wire so
/// that missing fields can be reported as violations instead of parse errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSubmission {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
}

impl BookSubmission {
    pub fn new(title: &str, author: &str, isbn: &str, publication_year: i32) -> Self {
        Self {
            title: Some(title.to_string()),
            author: Some(author.to_string()),
            isbn: Some(isbn.to_string()),
            publication_year: Some(publication_year),
        }
    }
}

/// The mutable fields of a book after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publication_year: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn book_serializes_with_camel_case_and_rfc3339() {
        let book = Book {
            id: 7,
            title: "Clean Code".to_string(),
            author: "Robert C. Martin".to_string(),
            isbn: "0132350884".to_string(),
            publication_year: 2008,
            created_at: datetime!(2024-03-01 12:00:00 UTC),
            updated_at: datetime!(2024-03-02 08:30:00 UTC),
        };

        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["publicationYear"], 2008);
        assert_eq!(json["createdAt"], "2024-03-01T12:00:00Z");
        assert_eq!(json["updatedAt"], "2024-03-02T08:30:00Z");
    }

    #[test]
    fn submission_tolerates_missing_fields() {
        let submission: BookSubmission =
            serde_json::from_str(r#"{"title":"Refactoring","publicationYear":1999}"#).unwrap();
        assert_eq!(submission.title.as_deref(), Some("Refactoring"));
        assert_eq!(submission.publication_year, Some(1999));
        assert!(submission.author.is_none());
        assert!(submission.isbn.is_none());
    }
}
