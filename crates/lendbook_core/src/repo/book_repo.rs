//! Book repository contract and SQLite implementation.
//!
//! # Invariants
//! - `current_student` and `expiration_date` are written together by
//!   `set_loan` / `clear_loan` only.
//! - Rows with only one of the two loan columns set are rejected on read.

use super::{AnyOfFilter, RecordKey, RepoError, RepoResult, SparseUpdate};
use crate::model::book::{
    Book, BookId, BookListQuery, BookPatch, BookSearch, BookStatus, Loan, NewBook,
    DUE_DATE_FORMAT,
};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const BOOK_SELECT_SQL: &str = "SELECT
    id,
    title,
    author,
    current_student,
    publishing,
    isbn,
    expiration_date
FROM Books";

/// Repository interface for book catalog and loan state.
pub trait BookRepository {
    fn create_book(&self, book: &NewBook) -> RepoResult<BookId>;
    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;
    /// Returns the first book matching any present criterion.
    fn find_book(&self, search: &BookSearch) -> RepoResult<Option<Book>>;
    fn list_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>>;
    /// Applies a sparse catalog patch. An empty patch is a no-op.
    fn update_book(&self, id: BookId, patch: &BookPatch) -> RepoResult<()>;
    fn delete_book(&self, id: BookId) -> RepoResult<()>;
    /// Marks a book as on loan. Used by the lending service.
    fn set_loan(&self, id: BookId, loan: &Loan) -> RepoResult<()>;
    /// Marks a book as available. Used by the lending service.
    fn clear_loan(&self, id: BookId) -> RepoResult<()>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn create_book(&self, book: &NewBook) -> RepoResult<BookId> {
        let book = book.normalized();
        book.validate()?;

        self.conn.execute(
            "INSERT INTO Books (title, author, publishing, isbn)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                book.title.as_str(),
                book.author.as_str(),
                book.publisher.as_deref(),
                book.isbn.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOOK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_book_row(row)?));
        }

        Ok(None)
    }

    fn find_book(&self, search: &BookSearch) -> RepoResult<Option<Book>> {
        if search.is_empty() {
            return Err(RepoError::MissingCriteria);
        }
        let mut filter = AnyOfFilter::default();
        filter.eq_integer("id", search.id);
        filter.eq_text("isbn", search.isbn.as_deref().map(str::trim));
        filter.eq_text("title", search.title.as_deref().map(str::trim));
        let (where_clause, bind_values) = filter.into_where_clause()?;

        let mut stmt = self.conn.prepare(&format!(
            "{BOOK_SELECT_SQL} WHERE {where_clause} ORDER BY id ASC LIMIT 1;"
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_book_row(row)?));
        }

        Ok(None)
    }

    fn list_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>> {
        let mut sql = format!("{BOOK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        match query.status {
            Some(BookStatus::Available) => sql.push_str(" AND current_student IS NULL"),
            Some(BookStatus::OnLoan) => sql.push_str(" AND current_student IS NOT NULL"),
            None => {}
        }

        if let Some(holder_uuid) = &query.holder_uuid {
            sql.push_str(" AND current_student = ?");
            bind_values.push(Value::Text(holder_uuid.clone()));
        }

        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut books = Vec::new();

        while let Some(row) = rows.next()? {
            books.push(parse_book_row(row)?);
        }

        Ok(books)
    }

    fn update_book(&self, id: BookId, patch: &BookPatch) -> RepoResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let patch = patch.normalized();
        patch.validate()?;

        let mut update = SparseUpdate::default();
        update.set_text("title", patch.title.as_deref());
        update.set_text("author", patch.author.as_deref());
        update.set_text("publishing", patch.publisher.as_deref());
        update.set_text("isbn", patch.isbn.as_deref());

        let (sql, bind_values) = update.into_statement("Books", id);
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordKey::Book(id)));
        }

        Ok(())
    }

    fn delete_book(&self, id: BookId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM Books WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(RecordKey::Book(id)));
        }

        Ok(())
    }

    fn set_loan(&self, id: BookId, loan: &Loan) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE Books
             SET
                current_student = ?2,
                expiration_date = ?3
             WHERE id = ?1;",
            params![
                id,
                loan.student_uuid.as_str(),
                loan.due_date.format(DUE_DATE_FORMAT).to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(RecordKey::Book(id)));
        }

        Ok(())
    }

    fn clear_loan(&self, id: BookId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE Books
             SET
                current_student = NULL,
                expiration_date = NULL
             WHERE id = ?1;",
            [id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(RecordKey::Book(id)));
        }

        Ok(())
    }
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let id: BookId = row.get("id")?;
    let current_student: Option<String> = row.get("current_student")?;
    let expiration_date: Option<String> = row.get("expiration_date")?;

    let loan = match (current_student, expiration_date) {
        (Some(student_uuid), Some(due_text)) => {
            let due_date = NaiveDate::parse_from_str(&due_text, DUE_DATE_FORMAT).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid due date `{due_text}` in Books.expiration_date for book {id}"
                ))
            })?;
            Some(Loan {
                student_uuid,
                due_date,
            })
        }
        (None, None) => None,
        _ => {
            return Err(RepoError::InvalidData(format!(
                "book {id} has only one of current_student/expiration_date set"
            )));
        }
    };

    Ok(Book {
        id,
        title: row.get("title")?,
        author: row.get("author")?,
        publisher: row.get("publishing")?,
        isbn: row.get("isbn")?,
        loan,
    })
}
