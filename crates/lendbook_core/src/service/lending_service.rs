//! Borrow/return use-case service.
//!
//! # Responsibility
//! - Move a book between Available and OnLoan.
//! - Record every transition in the audit log.
//!
//! # Invariants
//! - Each operation runs in one IMMEDIATE transaction on the injected
//!   connection: lookup, loan mutation and log append commit together or
//!   roll back together.
//! - A failed log append fails the whole operation.
//! - Log rows reference surrogate student ids, never the uuid.

use crate::model::book::{BookId, Loan};
use crate::model::log_entry::{LogAction, LogEntry};
use crate::repo::book_repo::{BookRepository, SqliteBookRepository};
use crate::repo::log_repo::{LogRepository, SqliteLogRepository};
use crate::repo::student_repo::{SqliteStudentRepository, StudentRepository};
use crate::repo::RepoError;
use chrono::NaiveDate;
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Coarse error category for callers that only branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LendingErrorKind {
    /// A referenced student or book does not exist.
    NotFound,
    /// The book is not in the state the operation requires.
    InvalidState,
    /// Storage, validation or constraint failure.
    Storage,
}

/// Errors from borrow/return operations.
#[derive(Debug)]
pub enum LendingError {
    /// No student with the given uuid.
    StudentNotFound(String),
    BookNotFound(BookId),
    /// The book's recorded holder no longer exists.
    HolderNotFound { book_id: BookId, student_uuid: String },
    AlreadyOnLoan { book_id: BookId, student_uuid: String },
    NotOnLoan(BookId),
    Repo(RepoError),
}

impl LendingError {
    pub fn kind(&self) -> LendingErrorKind {
        match self {
            Self::StudentNotFound(_) | Self::BookNotFound(_) | Self::HolderNotFound { .. } => {
                LendingErrorKind::NotFound
            }
            Self::AlreadyOnLoan { .. } | Self::NotOnLoan(_) => LendingErrorKind::InvalidState,
            Self::Repo(_) => LendingErrorKind::Storage,
        }
    }

    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StudentNotFound(_) => "student_not_found",
            Self::BookNotFound(_) => "book_not_found",
            Self::HolderNotFound { .. } => "holder_not_found",
            Self::AlreadyOnLoan { .. } => "already_on_loan",
            Self::NotOnLoan(_) => "not_on_loan",
            Self::Repo(_) => "storage_error",
        }
    }
}

impl Display for LendingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StudentNotFound(uuid) => write!(f, "no student found with uuid `{uuid}`"),
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::HolderNotFound {
                book_id,
                student_uuid,
            } => write!(
                f,
                "book {book_id} is held by unknown student uuid `{student_uuid}`"
            ),
            Self::AlreadyOnLoan {
                book_id,
                student_uuid,
            } => write!(
                f,
                "book {book_id} is already on loan to student uuid `{student_uuid}`"
            ),
            Self::NotOnLoan(id) => write!(f, "book {id} is not on loan"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LendingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LendingError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for LendingError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Lending service bound to a caller-owned connection.
pub struct LendingService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> LendingService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Lends `book_id` to the student identified by `student_uuid` until
    /// `due_date`, and returns the appended `Borrow` log entry.
    ///
    /// # Errors
    /// - `StudentNotFound` when no student has `student_uuid`.
    /// - `BookNotFound` when `book_id` does not exist.
    /// - `AlreadyOnLoan` when the book already has a holder.
    pub fn borrow_book(
        &self,
        book_id: BookId,
        student_uuid: &str,
        due_date: NaiveDate,
    ) -> Result<LogEntry, LendingError> {
        let started_at = Instant::now();
        let result = self.borrow_in_tx(book_id, student_uuid, due_date);
        log_outcome("book_borrow", book_id, &result, started_at);
        result
    }

    /// Takes `book_id` back from its holder and returns the appended
    /// `Return` log entry.
    ///
    /// # Errors
    /// - `BookNotFound` when `book_id` does not exist.
    /// - `NotOnLoan` when the book has no holder; nothing is logged.
    /// - `HolderNotFound` when the recorded holder was removed.
    pub fn return_book(&self, book_id: BookId) -> Result<LogEntry, LendingError> {
        let started_at = Instant::now();
        let result = self.return_in_tx(book_id);
        log_outcome("book_return", book_id, &result, started_at);
        result
    }

    fn borrow_in_tx(
        &self,
        book_id: BookId,
        student_uuid: &str,
        due_date: NaiveDate,
    ) -> Result<LogEntry, LendingError> {
        let student_uuid = student_uuid.trim();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let students = SqliteStudentRepository::new(&tx);
        let books = SqliteBookRepository::new(&tx);
        let logs = SqliteLogRepository::new(&tx);

        let student_id = students
            .student_id_for_uuid(student_uuid)?
            .ok_or_else(|| LendingError::StudentNotFound(student_uuid.to_string()))?;

        let book = books
            .get_book(book_id)?
            .ok_or(LendingError::BookNotFound(book_id))?;
        if let Some(loan) = book.loan {
            return Err(LendingError::AlreadyOnLoan {
                book_id,
                student_uuid: loan.student_uuid,
            });
        }

        books.set_loan(
            book_id,
            &Loan {
                student_uuid: student_uuid.to_string(),
                due_date,
            },
        )?;
        let entry = logs.append_entry(book_id, student_id, LogAction::Borrow)?;

        tx.commit()?;
        Ok(entry)
    }

    fn return_in_tx(&self, book_id: BookId) -> Result<LogEntry, LendingError> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let students = SqliteStudentRepository::new(&tx);
        let books = SqliteBookRepository::new(&tx);
        let logs = SqliteLogRepository::new(&tx);

        let book = books
            .get_book(book_id)?
            .ok_or(LendingError::BookNotFound(book_id))?;
        let loan = book.loan.ok_or(LendingError::NotOnLoan(book_id))?;

        let student_id = students
            .student_id_for_uuid(&loan.student_uuid)?
            .ok_or_else(|| LendingError::HolderNotFound {
                book_id,
                student_uuid: loan.student_uuid.clone(),
            })?;

        books.clear_loan(book_id)?;
        let entry = logs.append_entry(book_id, student_id, LogAction::Return)?;

        tx.commit()?;
        Ok(entry)
    }
}

fn log_outcome(
    event: &str,
    book_id: BookId,
    result: &Result<LogEntry, LendingError>,
    started_at: Instant,
) {
    match result {
        Ok(entry) => info!(
            "event={event} module=lending status=ok book_id={book_id} student_id={} log_id={} duration_ms={}",
            entry.student_id,
            entry.id,
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={event} module=lending status=error book_id={book_id} error_code={} duration_ms={}",
            err.code(),
            started_at.elapsed().as_millis()
        ),
    }
}
