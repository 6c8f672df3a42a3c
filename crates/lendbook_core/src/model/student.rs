//! Student records.
//!
//! A student carries two identities: the surrogate `id` used by foreign
//! keys in the audit log, and the externally assigned `uuid` that books
//! reference while on loan.

use super::{require_text, trim_optional, trim_text, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Surrogate primary key of `Students`.
pub type StudentId = i64;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
});

/// Persisted student row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub uuid: String,
    pub full_name: String,
    /// Class label such as `Class A`. Optional in storage.
    pub class_label: Option<String>,
    pub email: String,
}

/// Enrollment input for a new student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub uuid: String,
    pub full_name: String,
    pub class_label: Option<String>,
    pub email: String,
}

impl NewStudent {
    /// Creates enrollment input with a caller-provided external identifier.
    pub fn new(
        full_name: impl Into<String>,
        uuid: impl Into<String>,
        class_label: Option<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            full_name: full_name.into(),
            class_label,
            email: email.into(),
        }
    }

    /// Creates enrollment input with a freshly generated v4 identifier.
    ///
    /// Used when the school has no external id for the student yet.
    pub fn with_generated_uuid(
        full_name: impl Into<String>,
        class_label: Option<String>,
        email: impl Into<String>,
    ) -> Self {
        Self::new(full_name, Uuid::new_v4().to_string(), class_label, email)
    }

    /// Returns a copy with surrounding whitespace removed from every field.
    pub fn normalized(&self) -> Self {
        Self {
            uuid: trim_text(&self.uuid),
            full_name: trim_text(&self.full_name),
            class_label: trim_optional(self.class_label.as_deref()),
            email: trim_text(&self.email),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("full_name", &self.full_name)?;
        require_text("uuid", &self.uuid)?;
        validate_email(&self.email)
    }
}

/// Sparse update for a student row. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentPatch {
    pub full_name: Option<String>,
    pub uuid: Option<String>,
    pub class_label: Option<String>,
    pub email: Option<String>,
}

impl StudentPatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.uuid.is_none()
            && self.class_label.is_none()
            && self.email.is_none()
    }

    /// Trims every present field. A blank class label stays `Some("")` so the
    /// patch still clears it.
    pub fn normalized(&self) -> Self {
        Self {
            full_name: self.full_name.as_deref().map(trim_text),
            uuid: self.uuid.as_deref().map(trim_text),
            class_label: self.class_label.as_deref().map(trim_text),
            email: self.email.as_deref().map(trim_text),
        }
    }

    /// Validates every field that is present in the patch.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(full_name) = &self.full_name {
            require_text("full_name", full_name)?;
        }
        if let Some(uuid) = &self.uuid {
            require_text("uuid", uuid)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

/// Lookup criteria for a single student.
///
/// Present criteria are OR-ed; the first matching row by id wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentSearch {
    pub id: Option<StudentId>,
    pub uuid: Option<String>,
    pub full_name: Option<String>,
}

impl StudentSearch {
    pub fn by_id(id: StudentId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_uuid(uuid: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid.into()),
            ..Self::default()
        }
    }

    pub fn by_name(full_name: impl Into<String>) -> Self {
        Self {
            full_name: Some(full_name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.uuid.is_none() && self.full_name.is_none()
    }
}

fn validate_email(value: &str) -> Result<(), ValidationError> {
    if EMAIL_PATTERN.is_match(value.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(value.to_string()))
    }
}
