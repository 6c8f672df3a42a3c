//! Student repository contract and SQLite implementation.

use super::{AnyOfFilter, RecordKey, RepoError, RepoResult, SparseUpdate};
use crate::model::student::{NewStudent, Student, StudentId, StudentPatch, StudentSearch};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const STUDENT_SELECT_SQL: &str = "SELECT
    id,
    full_name,
    uuid,
    class,
    email
FROM Students";

/// Repository interface for student CRUD and lookup.
pub trait StudentRepository {
    fn create_student(&self, student: &NewStudent) -> RepoResult<StudentId>;
    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>>;
    /// Returns the first student matching any present criterion.
    ///
    /// Fails with `RepoError::MissingCriteria` when `search` is empty.
    fn find_student(&self, search: &StudentSearch) -> RepoResult<Option<Student>>;
    /// Resolves the surrogate id for an external uuid.
    fn student_id_for_uuid(&self, uuid: &str) -> RepoResult<Option<StudentId>>;
    fn list_students(&self) -> RepoResult<Vec<Student>>;
    /// Applies a sparse patch. An empty patch is a no-op.
    fn update_student(&self, id: StudentId, patch: &StudentPatch) -> RepoResult<()>;
    fn delete_student(&self, id: StudentId) -> RepoResult<()>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn create_student(&self, student: &NewStudent) -> RepoResult<StudentId> {
        let student = student.normalized();
        student.validate()?;

        self.conn.execute(
            "INSERT INTO Students (full_name, uuid, class, email)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                student.full_name.as_str(),
                student.uuid.as_str(),
                student.class_label.as_deref(),
                student.email.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>> {
        self.find_student(&StudentSearch::by_id(id))
    }

    fn find_student(&self, search: &StudentSearch) -> RepoResult<Option<Student>> {
        if search.is_empty() {
            return Err(RepoError::MissingCriteria);
        }
        let mut filter = AnyOfFilter::default();
        filter.eq_integer("id", search.id);
        filter.eq_text("uuid", search.uuid.as_deref().map(str::trim));
        filter.eq_text("full_name", search.full_name.as_deref().map(str::trim));
        let (where_clause, bind_values) = filter.into_where_clause()?;

        let mut stmt = self.conn.prepare(&format!(
            "{STUDENT_SELECT_SQL} WHERE {where_clause} ORDER BY id ASC LIMIT 1;"
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_student_row(row)?));
        }

        Ok(None)
    }

    fn student_id_for_uuid(&self, uuid: &str) -> RepoResult<Option<StudentId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM Students WHERE uuid = ?1;",
                [uuid.trim()],
                |row| row.get::<_, StudentId>(0),
            )
            .optional()?;
        Ok(id)
    }

    fn list_students(&self) -> RepoResult<Vec<Student>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{STUDENT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut students = Vec::new();

        while let Some(row) = rows.next()? {
            students.push(parse_student_row(row)?);
        }

        Ok(students)
    }

    fn update_student(&self, id: StudentId, patch: &StudentPatch) -> RepoResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let patch = patch.normalized();
        patch.validate()?;

        let mut update = SparseUpdate::default();
        update.set_text("full_name", patch.full_name.as_deref());
        update.set_text("uuid", patch.uuid.as_deref());
        update.set_text("class", patch.class_label.as_deref());
        update.set_text("email", patch.email.as_deref());

        let (sql, bind_values) = update.into_statement("Students", id);
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordKey::Student(id)));
        }

        Ok(())
    }

    fn delete_student(&self, id: StudentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM Students WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(RecordKey::Student(id)));
        }

        Ok(())
    }
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    Ok(Student {
        id: row.get("id")?,
        uuid: row.get("uuid")?,
        full_name: row.get("full_name")?,
        class_label: row.get("class")?,
        email: row.get("email")?,
    })
}
