//! Field rules for book submissions.
//!
//! Every rule runs independently and all violations are reported together.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::models::{BookSubmission, NewBook};

pub const MAX_TEXT_LENGTH: usize = 255;
pub const MIN_PUBLICATION_YEAR: i32 = 1000;
pub const MAX_PUBLICATION_YEAR: i32 = 2100;

/// A single failed rule, keyed by the wire name of the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Non-empty list of violations for one submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} field(s) failed validation", .0.len())]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    pub fn for_field(&self, field: &str) -> Vec<&FieldViolation> {
        self.0.iter().filter(|v| v.field == field).collect()
    }
}

impl BookSubmission {
    /// Check every field rule against `current_year` and return the accepted book.
    pub fn validate(&self, current_year: i32) -> Result<NewBook, ValidationErrors> {
        let mut violations = Vec::new();

        let title = required_text("title", self.title.as_deref(), &mut violations);
        let author = required_text("author", self.author.as_deref(), &mut violations);
        let isbn = required_isbn(self.isbn.as_deref(), &mut violations);
        let publication_year =
            required_year(self.publication_year, current_year, &mut violations);

        match (title, author, isbn, publication_year) {
            (Some(title), Some(author), Some(isbn), Some(publication_year))
                if violations.is_empty() =>
            {
                Ok(NewBook {
                    title,
                    author,
                    isbn,
                    publication_year,
                })
            }
            _ => Err(ValidationErrors(violations)),
        }
    }
}

fn required_text(
    field: &'static str,
    value: Option<&str>,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            violations.push(FieldViolation::new(field, format!("{} is required", field)));
            return None;
        }
    };

    if value.chars().count() > MAX_TEXT_LENGTH {
        violations.push(FieldViolation::new(
            field,
            format!("{} must be between 1 and {} characters", field, MAX_TEXT_LENGTH),
        ));
        return None;
    }

    Some(value.to_string())
}

fn required_isbn(value: Option<&str>, violations: &mut Vec<FieldViolation>) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => {
            if is_valid_isbn(v) {
                Some(v.to_string())
            } else {
                violations.push(FieldViolation::new("isbn", "isbn is invalid"));
                None
            }
        }
        _ => {
            violations.push(FieldViolation::new("isbn", "isbn is required"));
            None
        }
    }
}

fn required_year(
    value: Option<i32>,
    current_year: i32,
    violations: &mut Vec<FieldViolation>,
) -> Option<i32> {
    let Some(year) = value else {
        violations.push(FieldViolation::new(
            "publicationYear",
            "publicationYear is required",
        ));
        return None;
    };

    let before = violations.len();
    if year < MIN_PUBLICATION_YEAR {
        violations.push(FieldViolation::new(
            "publicationYear",
            format!("publicationYear must be at least {}", MIN_PUBLICATION_YEAR),
        ));
    }
    if year > MAX_PUBLICATION_YEAR {
        violations.push(FieldViolation::new(
            "publicationYear",
            format!("publicationYear must not be greater than {}", MAX_PUBLICATION_YEAR),
        ));
    }
    if year > current_year {
        violations.push(FieldViolation::new(
            "publicationYear",
            "publicationYear must not be greater than the current year",
        ));
    }

    (violations.len() == before).then_some(year)
}

static ISBN_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ISBN(?:-1[03])?:? ").expect("isbn prefix pattern"));

// Accepted shapes of the number once the prefix is stripped.
static ISBN_SHAPES: Lazy<[Regex; 4]> = Lazy::new(|| {
    [
        // 10 symbols, no separators
        r"^[0-9X]{10}$",
        // 13 symbols of digits and X, with separators
        r"^[- 0-9X]{13}$",
        // bare ISBN-13
        r"^97[89][0-9]{10}$",
        // ISBN-13 with four separators
        r"^[- 0-9]{17}$",
    ]
    .map(|pattern| Regex::new(pattern).expect("isbn shape pattern"))
});

static THREE_SEPARATED_GROUPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[0-9]+[- ]){3}").expect("isbn group pattern"));

static FOUR_SEPARATED_GROUPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[0-9]+[- ]){4}").expect("isbn group pattern"));

static ISBN_STRUCTURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:97[89][- ]?)?[0-9]{1,5}[- ]?[0-9]+[- ]?[0-9]+[- ]?[0-9X]$")
        .expect("isbn structure pattern")
});

/// Surface syntax of ISBN-10/ISBN-13. The check digit is not verified.
pub fn is_valid_isbn(value: &str) -> bool {
    let number = match ISBN_PREFIX.find(value) {
        Some(prefix) => &value[prefix.end()..],
        None => value,
    };

    let [ten, thirteen_separated, thirteen, seventeen] = &*ISBN_SHAPES;
    let shaped = ten.is_match(number)
        || (thirteen_separated.is_match(number) && THREE_SEPARATED_GROUPS.is_match(number))
        || thirteen.is_match(number)
        || (seventeen.is_match(number) && FOUR_SEPARATED_GROUPS.is_match(number));

    shaped && ISBN_STRUCTURE.is_match(number)
}
