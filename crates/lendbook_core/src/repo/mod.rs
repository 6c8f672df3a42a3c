//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define per-entity data access contracts for students, books and the
//!   audit log.
//! - Keep SQL details out of the lending service.
//!
//! # Invariants
//! - Write paths validate model input before any SQL runs.
//! - Repositories borrow a caller-owned connection; a `Transaction` derefs
//!   to `Connection`, so the same repositories run inside a transaction.
//! - Missing rows surface as `RepoError::NotFound`, constraint violations as
//!   `RepoError::Constraint`, never as raw SQLite errors.

pub mod book_repo;
pub mod log_repo;
pub mod student_repo;

use crate::db::DbError;
use crate::model::book::BookId;
use crate::model::log_entry::LogEntryId;
use crate::model::student::StudentId;
use crate::model::ValidationError;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Identifies the row a repository call was looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    Student(StudentId),
    StudentUuid(String),
    Book(BookId),
    LogEntry(LogEntryId),
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student(id) => write!(f, "student id={id}"),
            Self::StudentUuid(uuid) => write!(f, "student uuid={uuid}"),
            Self::Book(id) => write!(f, "book id={id}"),
            Self::LogEntry(id) => write!(f, "log entry id={id}"),
        }
    }
}

/// Repository error shared by all entity repositories.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound(RecordKey),
    /// A search was issued without any criteria.
    MissingCriteria,
    /// UNIQUE/CHECK/FOREIGN KEY violation reported by SQLite.
    Constraint(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(key) => write!(f, "record not found: {key}"),
            Self::MissingCriteria => {
                write!(f, "at least one search parameter must be provided")
            }
            Self::Constraint(message) => write!(f, "constraint violation: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        if value.is_constraint_violation() {
            return Self::Constraint(value.to_string());
        }
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        DbError::Sqlite(value).into()
    }
}

/// Collects `column = ?` assignments for a sparse UPDATE.
///
/// Only present values are bound; column names come from code, never from
/// caller input.
#[derive(Debug, Default)]
pub(crate) struct SparseUpdate {
    assignments: Vec<&'static str>,
    bind_values: Vec<Value>,
}

impl SparseUpdate {
    pub(crate) fn set_text(&mut self, column: &'static str, value: Option<&str>) {
        if let Some(value) = value {
            self.assignments.push(column);
            self.bind_values.push(Value::Text(value.to_string()));
        }
    }

    /// Builds `UPDATE <table> SET ... WHERE id = ?` and the matching binds.
    pub(crate) fn into_statement(self, table: &str, id: i64) -> (String, Vec<Value>) {
        let set_clause = self
            .assignments
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut bind_values = self.bind_values;
        bind_values.push(Value::Integer(id));
        (
            format!("UPDATE {table} SET {set_clause} WHERE id = ?;"),
            bind_values,
        )
    }
}

/// OR-ed equality criteria for single-row searches.
#[derive(Debug, Default)]
pub(crate) struct AnyOfFilter {
    conditions: Vec<&'static str>,
    bind_values: Vec<Value>,
}

impl AnyOfFilter {
    pub(crate) fn eq_integer(&mut self, column: &'static str, value: Option<i64>) {
        if let Some(value) = value {
            self.conditions.push(column);
            self.bind_values.push(Value::Integer(value));
        }
    }

    pub(crate) fn eq_text(&mut self, column: &'static str, value: Option<&str>) {
        if let Some(value) = value {
            self.conditions.push(column);
            self.bind_values.push(Value::Text(value.to_string()));
        }
    }

    pub(crate) fn into_where_clause(self) -> RepoResult<(String, Vec<Value>)> {
        if self.conditions.is_empty() {
            return Err(RepoError::MissingCriteria);
        }
        let clause = self
            .conditions
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(" OR ");
        Ok((clause, self.bind_values))
    }
}
