use lendbook_core::db::open_db_in_memory;
use lendbook_core::{
    NewStudent, RecordKey, RepoError, SqliteStudentRepository, StudentPatch, StudentRepository,
    StudentSearch, ValidationError,
};

fn john() -> NewStudent {
    NewStudent::new(
        "John Doe",
        "uuid-123",
        Some("Class A".to_string()),
        "john@example.com",
    )
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);

    let id = repo.create_student(&john()).unwrap();
    let loaded = repo.get_student(id).unwrap().unwrap();

    assert_eq!(loaded.id, id);
    assert_eq!(loaded.uuid, "uuid-123");
    assert_eq!(loaded.full_name, "John Doe");
    assert_eq!(loaded.class_label.as_deref(), Some("Class A"));
    assert_eq!(loaded.email, "john@example.com");
}

#[test]
fn create_rejects_invalid_input_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);

    let err = repo
        .create_student(&NewStudent::new("John", "", None, "john@example.com"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::BlankField("uuid"))
    ));
    assert!(repo.list_students().unwrap().is_empty());
}

#[test]
fn duplicate_uuid_or_email_is_a_constraint_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);
    repo.create_student(&john()).unwrap();

    let same_uuid = NewStudent::new("Jane", "uuid-123", None, "jane@example.com");
    assert!(matches!(
        repo.create_student(&same_uuid).unwrap_err(),
        RepoError::Constraint(_)
    ));

    let same_email = NewStudent::new("Jane", "uuid-999", None, "john@example.com");
    assert!(matches!(
        repo.create_student(&same_email).unwrap_err(),
        RepoError::Constraint(_)
    ));
}

#[test]
fn search_without_criteria_fails() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);

    let err = repo.find_student(&StudentSearch::default()).unwrap_err();
    assert!(matches!(err, RepoError::MissingCriteria));
}

#[test]
fn search_matches_any_present_criterion() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);
    let john_id = repo.create_student(&john()).unwrap();
    let jane_id = repo
        .create_student(&NewStudent::new("Jane Roe", "uuid-456", None, "jane@example.com"))
        .unwrap();

    let by_uuid = repo.find_student(&StudentSearch::by_uuid("uuid-456")).unwrap();
    assert_eq!(by_uuid.map(|student| student.id), Some(jane_id));

    let by_name = repo.find_student(&StudentSearch::by_name("John Doe")).unwrap();
    assert_eq!(by_name.map(|student| student.id), Some(john_id));

    let either = StudentSearch {
        id: Some(9999),
        uuid: Some("uuid-456".to_string()),
        full_name: None,
    };
    assert_eq!(
        repo.find_student(&either).unwrap().map(|student| student.id),
        Some(jane_id)
    );

    assert!(repo
        .find_student(&StudentSearch::by_uuid("missing"))
        .unwrap()
        .is_none());
}

#[test]
fn student_id_for_uuid_resolves_surrogate_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);
    let id = repo.create_student(&john()).unwrap();

    assert_eq!(repo.student_id_for_uuid("uuid-123").unwrap(), Some(id));
    assert_eq!(repo.student_id_for_uuid("uuid-000").unwrap(), None);
}

#[test]
fn sparse_update_changes_only_present_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);
    let id = repo.create_student(&john()).unwrap();

    repo.update_student(
        id,
        &StudentPatch {
            class_label: Some("Class B".to_string()),
            email: Some("john.doe@example.com".to_string()),
            ..StudentPatch::default()
        },
    )
    .unwrap();

    let loaded = repo.get_student(id).unwrap().unwrap();
    assert_eq!(loaded.full_name, "John Doe");
    assert_eq!(loaded.uuid, "uuid-123");
    assert_eq!(loaded.class_label.as_deref(), Some("Class B"));
    assert_eq!(loaded.email, "john.doe@example.com");
}

#[test]
fn empty_patch_is_noop_and_missing_row_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);

    repo.update_student(42, &StudentPatch::default()).unwrap();

    let err = repo
        .update_student(
            42,
            &StudentPatch {
                full_name: Some("Ghost".to_string()),
                ..StudentPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(RecordKey::Student(42))));
}

#[test]
fn delete_removes_row_and_reports_missing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);
    let id = repo.create_student(&john()).unwrap();

    repo.delete_student(id).unwrap();
    assert!(repo.get_student(id).unwrap().is_none());

    let err = repo.delete_student(id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(RecordKey::Student(missing)) if missing == id));
}

#[test]
fn list_returns_students_in_enrollment_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);
    repo.create_student(&john()).unwrap();
    repo.create_student(&NewStudent::with_generated_uuid(
        "Jane Roe",
        None,
        "jane@example.com",
    ))
    .unwrap();

    let names = repo
        .list_students()
        .unwrap()
        .into_iter()
        .map(|student| student.full_name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["John Doe".to_string(), "Jane Roe".to_string()]);
}

#[test]
fn padded_input_is_stored_trimmed_and_cannot_bypass_unique_email() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);

    let id = repo
        .create_student(&NewStudent::new(
            "  John ",
            " uuid-1 ",
            None,
            " john@example.com ",
        ))
        .unwrap();
    let stored = repo.get_student(id).unwrap().unwrap();
    assert_eq!(stored.full_name, "John");
    assert_eq!(stored.uuid, "uuid-1");
    assert_eq!(stored.email, "john@example.com");

    let err = repo
        .create_student(&NewStudent::new("J", "uuid-2", None, "john@example.com"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Constraint(_)));
    assert_eq!(repo.list_students().unwrap().len(), 1);

    assert_eq!(repo.student_id_for_uuid("uuid-1").unwrap(), Some(id));
    assert_eq!(repo.student_id_for_uuid(" uuid-1").unwrap(), Some(id));
}

#[test]
fn padded_patch_email_collides_with_existing_email() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);
    repo.create_student(&john()).unwrap();
    let jane_id = repo
        .create_student(&NewStudent::new("Jane Roe", "uuid-456", None, "jane@example.com"))
        .unwrap();

    let err = repo
        .update_student(
            jane_id,
            &StudentPatch {
                email: Some("  john@example.com ".to_string()),
                ..StudentPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::Constraint(_)));
}
