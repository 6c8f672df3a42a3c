//! Core record keeping for a small school library.
//! Tracks students, books and an append-only borrow/return log in SQLite.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::book::{
    Book, BookId, BookListQuery, BookPatch, BookSearch, BookStatus, Loan, NewBook,
};
pub use model::log_entry::{LogAction, LogEntry, LogEntryId, LogQuery};
pub use model::student::{NewStudent, Student, StudentId, StudentPatch, StudentSearch};
pub use model::ValidationError;
pub use repo::book_repo::{BookRepository, SqliteBookRepository};
pub use repo::log_repo::{LogRepository, SqliteLogRepository};
pub use repo::student_repo::{SqliteStudentRepository, StudentRepository};
pub use repo::{RecordKey, RepoError, RepoResult};
pub use service::lending_service::{LendingError, LendingErrorKind, LendingService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
