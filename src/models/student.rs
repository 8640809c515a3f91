use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::utc_or_now;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub student_name: String,
    /// School-issued student number, not the record id.
    pub student_number: String,
    pub grade_level: String,
    pub date_of_birth: Option<String>,
    pub parent_name: Option<String>,
    pub parent_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbStudent {
    pub id: Option<String>,
    pub student_name: Option<String>,
    pub student_number: Option<String>,
    pub grade_level: Option<String>,
    pub date_of_birth: Option<String>,
    pub parent_name: Option<String>,
    pub parent_email: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbStudent> for Student {
    fn from(db: DbStudent) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            student_name: db.student_name.unwrap_or_default(),
            student_number: db.student_number.unwrap_or_default(),
            grade_level: db.grade_level.unwrap_or_default(),
            date_of_birth: db.date_of_birth,
            parent_name: db.parent_name,
            parent_email: db.parent_email,
            created_at: utc_or_now(db.created_at),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub student_name: String,
    pub student_number: String,
    pub grade_level: String,
    pub date_of_birth: Option<String>,
    pub parent_name: Option<String>,
    pub parent_email: Option<String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct StudentPatch {
    pub student_name: Option<String>,
    pub student_number: Option<String>,
    pub grade_level: Option<String>,
    pub date_of_birth: Option<String>,
    pub parent_name: Option<String>,
    pub parent_email: Option<String>,
}
