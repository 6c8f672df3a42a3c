//! Append-only lending audit log.

use super::book::BookId;
use super::student::StudentId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Surrogate primary key of `DataLog`.
pub type LogEntryId = i64;

/// Storage format of SQLite `CURRENT_TIMESTAMP` values (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Lending event recorded in the audit log.
///
/// Serialized with the same tags stored in `DataLog.action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogAction {
    Borrow,
    Return,
}

impl LogAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Borrow => "Borrow",
            Self::Return => "Return",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Borrow" => Some(Self::Borrow),
            "Return" => Some(Self::Return),
            _ => None,
        }
    }
}

/// One audit row. References surrogate ids, not the student uuid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogEntryId,
    pub book_id: BookId,
    pub student_id: StudentId,
    pub action: LogAction,
    /// Assigned by the database at insert time.
    pub timestamp: NaiveDateTime,
}

/// Filters for listing log entries. Results are ordered oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    pub book_id: Option<BookId>,
    pub student_id: Option<StudentId>,
    pub action: Option<LogAction>,
}

impl LogQuery {
    pub fn for_book(book_id: BookId) -> Self {
        Self {
            book_id: Some(book_id),
            ..Self::default()
        }
    }
}
