//! Book records and loan state.
//!
//! # Invariants
//! - `Book::loan` is `Some` exactly when the book is on loan; holder and due
//!   date travel together inside `Loan` and are never set independently.
//! - Loan state is changed only by the lending service, never by `BookPatch`.

use super::{require_text, trim_optional, trim_text, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Surrogate primary key of `Books`.
pub type BookId = i64;

/// Storage format of `Books.expiration_date`.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Two-state lending lifecycle of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Available,
    OnLoan,
}

/// Active loan: who holds the book and when it is due back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// External `Students.uuid` of the holder.
    pub student_uuid: String,
    pub due_date: NaiveDate,
}

/// Persisted book row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub isbn: String,
    pub loan: Option<Loan>,
}

impl Book {
    pub fn status(&self) -> BookStatus {
        if self.loan.is_some() {
            BookStatus::OnLoan
        } else {
            BookStatus::Available
        }
    }

    pub fn is_on_loan(&self) -> bool {
        self.loan.is_some()
    }

    /// Holder uuid while on loan.
    pub fn current_student(&self) -> Option<&str> {
        self.loan.as_ref().map(|loan| loan.student_uuid.as_str())
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.loan.as_ref().map(|loan| loan.due_date)
    }
}

/// Catalog input for a new book. New books always start available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub isbn: String,
}

impl NewBook {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            publisher: None,
            isbn: isbn.into(),
        }
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    /// Returns a copy with surrounding whitespace removed from every field.
    pub fn normalized(&self) -> Self {
        Self {
            title: trim_text(&self.title),
            author: trim_text(&self.author),
            publisher: trim_optional(self.publisher.as_deref()),
            isbn: trim_text(&self.isbn),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("author", &self.author)?;
        require_text("isbn", &self.isbn)
    }
}

/// Sparse update for catalog fields. Loan fields are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub isbn: Option<String>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.publisher.is_none()
            && self.isbn.is_none()
    }

    pub fn normalized(&self) -> Self {
        Self {
            title: self.title.as_deref().map(trim_text),
            author: self.author.as_deref().map(trim_text),
            publisher: self.publisher.as_deref().map(trim_text),
            isbn: self.isbn.as_deref().map(trim_text),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(author) = &self.author {
            require_text("author", author)?;
        }
        if let Some(isbn) = &self.isbn {
            require_text("isbn", isbn)?;
        }
        Ok(())
    }
}

/// Lookup criteria for a single book. Present criteria are OR-ed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookSearch {
    pub id: Option<BookId>,
    pub isbn: Option<String>,
    pub title: Option<String>,
}

impl BookSearch {
    pub fn by_isbn(isbn: impl Into<String>) -> Self {
        Self {
            isbn: Some(isbn.into()),
            ..Self::default()
        }
    }

    pub fn by_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.isbn.is_none() && self.title.is_none()
    }
}

/// Query options for listing books.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookListQuery {
    pub status: Option<BookStatus>,
    /// Only books held by this student uuid.
    pub holder_uuid: Option<String>,
}
