use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::utc_or_now;

/// One subject mark for one student in one term.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentResult {
    pub id: String,
    pub student_id: String,
    pub student_name: String, // Denormalized at write time, never re-synced
    pub subject_name: String,
    /// Free text: "92%", "88", "A+" all occur.
    pub marks: String,
    /// Free-text term label, e.g. "Term 1 - 2024".
    pub term: String,
    pub comments: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbStudentResult {
    pub id: Option<String>,
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub subject_name: Option<String>,
    pub marks: Option<String>,
    pub term: Option<String>,
    pub comments: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbStudentResult> for StudentResult {
    fn from(db: DbStudentResult) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            student_id: db.student_id.unwrap_or_default(),
            student_name: db.student_name.unwrap_or_default(),
            subject_name: db.subject_name.unwrap_or_default(),
            marks: db.marks.unwrap_or_default(),
            term: db.term.unwrap_or_default(),
            comments: db.comments.unwrap_or_default(),
            created_at: utc_or_now(db.created_at),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultEntry {
    pub subject_name: String,
    pub marks: String,
    pub comments: String,
}

#[derive(Debug, Clone, Default)]
pub struct ResultPatch {
    pub subject_name: Option<String>,
    pub marks: Option<String>,
    pub term: Option<String>,
    pub comments: Option<String>,
}
