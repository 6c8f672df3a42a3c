//! Sample driver for `lendbook_core`.
//!
//! Enrolls a student, catalogs a book, lends it and takes it back, then
//! prints every table. Reads `LENDBOOK_*` settings from the environment.
//! Illustrative only; not a stable interface.

use chrono::NaiveDate;
use lendbook_core::db::open_db;
use lendbook_core::{
    init_logging, BookListQuery, BookRepository, BookSearch, CoreConfig, LendingService,
    LogQuery, LogRepository, NewBook, NewStudent, SqliteBookRepository, SqliteLogRepository,
    SqliteStudentRepository, StudentRepository, StudentSearch,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("lendbook: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env();
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    println!("lendbook_core version={}", lendbook_core::core_version());
    let conn = open_db(&config.db_path)?;
    let students = SqliteStudentRepository::new(&conn);
    let books = SqliteBookRepository::new(&conn);
    let logs = SqliteLogRepository::new(&conn);

    println!("Adding a student...");
    if students
        .find_student(&StudentSearch::by_uuid("uuid-123"))?
        .is_none()
    {
        students.create_student(&NewStudent::new(
            "John Doe",
            "uuid-123",
            Some("Class A".to_string()),
            "john@example.com",
        ))?;
    }

    println!("Adding a book...");
    let book_id = match books.find_book(&BookSearch::by_isbn("isbn-456"))? {
        Some(book) => book.id,
        None => books.create_book(
            &NewBook::new("A Great Book", "Alice Smith", "isbn-456").with_publisher("PublishCorp"),
        )?,
    };

    let due_date = NaiveDate::from_ymd_opt(2023, 12, 31).ok_or("invalid demo due date")?;
    let lending = LendingService::new(&conn);

    println!("Borrowing a book...");
    lending.borrow_book(book_id, "uuid-123", due_date)?;

    println!("Returning a book...");
    lending.return_book(book_id)?;

    println!("All students: {:?}", students.list_students()?);
    println!("All books: {:?}", books.list_books(&BookListQuery::default())?);
    println!("All logs: {:?}", logs.list_entries(&LogQuery::default())?);
    Ok(())
}
