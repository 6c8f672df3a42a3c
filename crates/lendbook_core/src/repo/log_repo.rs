//! Audit log repository: append and read only.

use super::{RecordKey, RepoError, RepoResult};
use crate::model::book::BookId;
use crate::model::log_entry::{LogAction, LogEntry, LogEntryId, LogQuery, TIMESTAMP_FORMAT};
use crate::model::student::StudentId;
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const LOG_SELECT_SQL: &str = "SELECT
    id,
    book_id,
    student_id,
    action,
    timestamp
FROM DataLog";

/// Repository interface for the append-only lending log.
pub trait LogRepository {
    /// Appends one entry and returns it with its server-assigned timestamp.
    fn append_entry(
        &self,
        book_id: BookId,
        student_id: StudentId,
        action: LogAction,
    ) -> RepoResult<LogEntry>;
    fn get_entry(&self, id: LogEntryId) -> RepoResult<Option<LogEntry>>;
    fn list_entries(&self, query: &LogQuery) -> RepoResult<Vec<LogEntry>>;
}

/// SQLite-backed log repository.
pub struct SqliteLogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLogRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LogRepository for SqliteLogRepository<'_> {
    fn append_entry(
        &self,
        book_id: BookId,
        student_id: StudentId,
        action: LogAction,
    ) -> RepoResult<LogEntry> {
        self.conn.execute(
            "INSERT INTO DataLog (book_id, student_id, action)
             VALUES (?1, ?2, ?3);",
            params![book_id, student_id, action.as_str()],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_entry(id)?
            .ok_or(RepoError::NotFound(RecordKey::LogEntry(id)))
    }

    fn get_entry(&self, id: LogEntryId) -> RepoResult<Option<LogEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LOG_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_log_row(row)?));
        }

        Ok(None)
    }

    fn list_entries(&self, query: &LogQuery) -> RepoResult<Vec<LogEntry>> {
        let mut sql = format!("{LOG_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(book_id) = query.book_id {
            sql.push_str(" AND book_id = ?");
            bind_values.push(Value::Integer(book_id));
        }
        if let Some(student_id) = query.student_id {
            sql.push_str(" AND student_id = ?");
            bind_values.push(Value::Integer(student_id));
        }
        if let Some(action) = query.action {
            sql.push_str(" AND action = ?");
            bind_values.push(Value::Text(action.as_str().to_string()));
        }

        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next()? {
            entries.push(parse_log_row(row)?);
        }

        Ok(entries)
    }
}

fn parse_log_row(row: &Row<'_>) -> RepoResult<LogEntry> {
    let action_text: String = row.get("action")?;
    let action = LogAction::parse(&action_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid action `{action_text}` in DataLog.action"))
    })?;

    let timestamp_text: String = row.get("timestamp")?;
    let timestamp =
        NaiveDateTime::parse_from_str(&timestamp_text, TIMESTAMP_FORMAT).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid timestamp `{timestamp_text}` in DataLog.timestamp"
            ))
        })?;

    Ok(LogEntry {
        id: row.get("id")?,
        book_id: row.get("book_id")?,
        student_id: row.get("student_id")?,
        action,
        timestamp,
    })
}
