use chrono::NaiveDate;
use lendbook_core::db::open_db_in_memory;
use lendbook_core::{
    BookId, BookRepository, LendingError, LendingErrorKind, LendingService, LogAction, LogQuery,
    LogRepository, NewBook, NewStudent, SqliteBookRepository, SqliteLogRepository,
    SqliteStudentRepository, StudentId, StudentRepository,
};
use rusqlite::Connection;

fn due(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn seed(conn: &Connection) -> (StudentId, BookId) {
    let student_id = SqliteStudentRepository::new(conn)
        .create_student(&NewStudent::new(
            "John Doe",
            "uuid-123",
            Some("Class A".to_string()),
            "john@example.com",
        ))
        .unwrap();
    let book_id = SqliteBookRepository::new(conn)
        .create_book(
            &NewBook::new("A Great Book", "Alice Smith", "isbn-456").with_publisher("PublishCorp"),
        )
        .unwrap();
    (student_id, book_id)
}

fn log_count(conn: &Connection) -> usize {
    SqliteLogRepository::new(conn)
        .list_entries(&LogQuery::default())
        .unwrap()
        .len()
}

#[test]
fn borrow_sets_holder_and_appends_one_borrow_entry() {
    let conn = open_db_in_memory().unwrap();
    let (student_id, book_id) = seed(&conn);
    let service = LendingService::new(&conn);

    let entry = service
        .borrow_book(book_id, "uuid-123", due(2023, 12, 31))
        .unwrap();
    assert_eq!(entry.book_id, book_id);
    assert_eq!(entry.student_id, student_id);
    assert_eq!(entry.action, LogAction::Borrow);

    let book = SqliteBookRepository::new(&conn)
        .get_book(book_id)
        .unwrap()
        .unwrap();
    assert_eq!(book.current_student(), Some("uuid-123"));
    assert_eq!(book.due_date(), Some(due(2023, 12, 31)));

    let entries = SqliteLogRepository::new(&conn)
        .list_entries(&LogQuery::for_book(book_id))
        .unwrap();
    assert_eq!(entries, vec![entry]);
}

#[test]
fn return_clears_holder_and_appends_one_return_entry() {
    let conn = open_db_in_memory().unwrap();
    let (student_id, book_id) = seed(&conn);
    let service = LendingService::new(&conn);
    service
        .borrow_book(book_id, "uuid-123", due(2023, 12, 31))
        .unwrap();

    let entry = service.return_book(book_id).unwrap();
    assert_eq!(entry.action, LogAction::Return);
    assert_eq!(entry.student_id, student_id);

    let book = SqliteBookRepository::new(&conn)
        .get_book(book_id)
        .unwrap()
        .unwrap();
    assert!(book.loan.is_none());

    let returns = SqliteLogRepository::new(&conn)
        .list_entries(&LogQuery {
            action: Some(LogAction::Return),
            ..LogQuery::default()
        })
        .unwrap();
    assert_eq!(returns.len(), 1);
    assert_eq!(log_count(&conn), 2);
}

#[test]
fn return_without_holder_is_invalid_state_and_logs_nothing() {
    let conn = open_db_in_memory().unwrap();
    let (_, book_id) = seed(&conn);
    let service = LendingService::new(&conn);

    let err = service.return_book(book_id).unwrap_err();
    assert!(matches!(err, LendingError::NotOnLoan(id) if id == book_id));
    assert_eq!(err.kind(), LendingErrorKind::InvalidState);
    assert_eq!(log_count(&conn), 0);
}

#[test]
fn borrow_with_unknown_student_is_not_found_and_leaves_book_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let (_, book_id) = seed(&conn);
    let service = LendingService::new(&conn);
    let before = SqliteBookRepository::new(&conn)
        .get_book(book_id)
        .unwrap()
        .unwrap();

    let err = service
        .borrow_book(book_id, "uuid-999", due(2024, 1, 15))
        .unwrap_err();
    assert!(matches!(err, LendingError::StudentNotFound(ref uuid) if uuid == "uuid-999"));
    assert_eq!(err.kind(), LendingErrorKind::NotFound);

    let after = SqliteBookRepository::new(&conn)
        .get_book(book_id)
        .unwrap()
        .unwrap();
    assert_eq!(before, after);
    assert_eq!(log_count(&conn), 0);
}

#[test]
fn borrow_with_padded_uuid_resolves_the_stored_student() {
    let conn = open_db_in_memory().unwrap();
    let (student_id, book_id) = seed(&conn);

    let entry = LendingService::new(&conn)
        .borrow_book(book_id, "  uuid-123 ", due(2024, 5, 1))
        .unwrap();
    assert_eq!(entry.student_id, student_id);

    let book = SqliteBookRepository::new(&conn)
        .get_book(book_id)
        .unwrap()
        .unwrap();
    assert!(book.is_on_loan());
    assert_eq!(book.current_student(), Some("uuid-123"));
}

#[test]
fn borrow_of_missing_book_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let service = LendingService::new(&conn);

    let err = service
        .borrow_book(404, "uuid-123", due(2024, 1, 15))
        .unwrap_err();
    assert!(matches!(err, LendingError::BookNotFound(404)));
    assert_eq!(log_count(&conn), 0);
}

#[test]
fn borrowing_a_book_on_loan_is_invalid_state() {
    let conn = open_db_in_memory().unwrap();
    let (_, book_id) = seed(&conn);
    SqliteStudentRepository::new(&conn)
        .create_student(&NewStudent::new("Jane Roe", "uuid-456", None, "jane@example.com"))
        .unwrap();
    let service = LendingService::new(&conn);
    service
        .borrow_book(book_id, "uuid-123", due(2023, 12, 31))
        .unwrap();

    let err = service
        .borrow_book(book_id, "uuid-456", due(2024, 1, 31))
        .unwrap_err();
    assert!(matches!(
        err,
        LendingError::AlreadyOnLoan { ref student_uuid, .. } if student_uuid == "uuid-123"
    ));
    assert_eq!(err.kind(), LendingErrorKind::InvalidState);

    let book = SqliteBookRepository::new(&conn)
        .get_book(book_id)
        .unwrap()
        .unwrap();
    assert_eq!(book.current_student(), Some("uuid-123"));
    assert_eq!(log_count(&conn), 1);
}

#[test]
fn return_with_removed_holder_is_not_found_and_rolls_back() {
    let conn = open_db_in_memory().unwrap();
    let (student_id, book_id) = seed(&conn);
    let service = LendingService::new(&conn);
    service
        .borrow_book(book_id, "uuid-123", due(2023, 12, 31))
        .unwrap();

    // Simulate a holder row removed behind the store's back.
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    conn.execute("DELETE FROM Students WHERE id = ?1;", [student_id])
        .unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();

    let err = service.return_book(book_id).unwrap_err();
    assert!(matches!(err, LendingError::HolderNotFound { book_id: id, .. } if id == book_id));
    assert_eq!(err.kind(), LendingErrorKind::NotFound);

    let book = SqliteBookRepository::new(&conn)
        .get_book(book_id)
        .unwrap()
        .unwrap();
    assert_eq!(book.current_student(), Some("uuid-123"));
    assert_eq!(log_count(&conn), 1);
}

#[test]
fn failed_log_append_rolls_back_loan_change() {
    let conn = open_db_in_memory().unwrap();
    let (_, book_id) = seed(&conn);
    conn.execute_batch(
        "CREATE TRIGGER reject_log BEFORE INSERT ON DataLog
         BEGIN SELECT RAISE(ABORT, 'log unavailable'); END;",
    )
    .unwrap();
    let service = LendingService::new(&conn);

    let err = service
        .borrow_book(book_id, "uuid-123", due(2023, 12, 31))
        .unwrap_err();
    assert_eq!(err.kind(), LendingErrorKind::Storage);

    let book = SqliteBookRepository::new(&conn)
        .get_book(book_id)
        .unwrap()
        .unwrap();
    assert!(book.loan.is_none());
    assert!(conn.is_autocommit());
}

#[test]
fn library_walkthrough_borrow_then_return() {
    let conn = open_db_in_memory().unwrap();
    let (student_id, book_id) = seed(&conn);
    assert_eq!(book_id, 1);
    let service = LendingService::new(&conn);
    let books = SqliteBookRepository::new(&conn);

    service
        .borrow_book(1, "uuid-123", due(2023, 12, 31))
        .unwrap();
    assert_eq!(
        books.get_book(1).unwrap().unwrap().current_student(),
        Some("uuid-123")
    );

    service.return_book(1).unwrap();
    assert_eq!(books.get_book(1).unwrap().unwrap().current_student(), None);

    let entries = SqliteLogRepository::new(&conn)
        .list_entries(&LogQuery {
            student_id: Some(student_id),
            ..LogQuery::default()
        })
        .unwrap();
    let actions = entries
        .iter()
        .map(|entry| entry.action)
        .collect::<Vec<_>>();
    assert_eq!(actions, vec![LogAction::Borrow, LogAction::Return]);
    assert!(entries[0].timestamp <= entries[1].timestamp);
}

#[test]
fn log_entries_serialize_with_stored_action_tags() {
    let conn = open_db_in_memory().unwrap();
    let (_, book_id) = seed(&conn);
    let entry = LendingService::new(&conn)
        .borrow_book(book_id, "uuid-123", due(2023, 12, 31))
        .unwrap();

    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["action"], "Borrow");
    assert_eq!(json["book_id"], book_id);
}
