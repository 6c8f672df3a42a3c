//! Domain model for students, books and the lending audit log.
//!
//! # Responsibility
//! - Define the records persisted by the repository layer.
//! - Validate caller input before it reaches SQL.
//!
//! # Invariants
//! - A book's holder and due date are either both set or both absent; the
//!   `Book::loan` option is the only place this state lives.
//! - Log entries are append-only and never change after insert.

pub mod book;
pub mod log_entry;
pub mod student;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field-level validation failure for model input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trimming.
    BlankField(&'static str),
    /// Email address does not look like `local@domain.tld`.
    InvalidEmail(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
        }
    }
}

impl Error for ValidationError {}

/// Trims surrounding whitespace; stored text and lookups use this form.
pub(crate) fn trim_text(value: &str) -> String {
    value.trim().to_string()
}

/// Trims an optional field; blank optional text becomes `None`.
pub(crate) fn trim_optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}
