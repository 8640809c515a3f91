use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::utc_or_now;

pub const NO_CLASS_TEACHER: &str = "N/A";
pub const UNASSIGNED_TEACHER: &str = "Unassigned";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: String,
    pub teacher_name: String,
    pub teacher_number: String,
    pub subjects_taught: Option<String>,
    pub department: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbTeacher {
    pub id: Option<String>,
    pub teacher_name: Option<String>,
    pub teacher_number: Option<String>,
    pub subjects_taught: Option<String>,
    pub department: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbTeacher> for Teacher {
    fn from(db: DbTeacher) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            teacher_name: db.teacher_name.unwrap_or_default(),
            teacher_number: db.teacher_number.unwrap_or_default(),
            subjects_taught: db.subjects_taught,
            department: db.department,
            email: db.email.unwrap_or_default(),
            phone: db.phone,
            bio: db.bio,
            created_at: utc_or_now(db.created_at),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewTeacher {
    pub teacher_name: String,
    pub teacher_number: String,
    pub subjects_taught: Option<String>,
    pub department: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TeacherPatch {
    pub teacher_name: Option<String>,
    pub teacher_number: Option<String>,
    pub subjects_taught: Option<String>,
    pub department: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    pub id: String,
    pub class_name: String,
    pub grade_level: String,
    pub section: Option<String>,
    pub class_teacher_id: Option<String>,
    pub class_teacher_name: String, // Denormalized for convenience
    pub capacity: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbClass {
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub grade_level: Option<String>,
    pub section: Option<String>,
    pub class_teacher_id: Option<String>,
    pub class_teacher_name: Option<String>,
    pub capacity: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbClass> for Class {
    fn from(db: DbClass) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            class_name: db.class_name.unwrap_or_default(),
            grade_level: db.grade_level.unwrap_or_default(),
            section: db.section,
            class_teacher_id: db.class_teacher_id,
            class_teacher_name: db
                .class_teacher_name
                .unwrap_or_else(|| NO_CLASS_TEACHER.to_string()),
            capacity: db.capacity.unwrap_or_default(),
            created_at: utc_or_now(db.created_at),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewClass {
    pub class_name: String,
    pub grade_level: String,
    pub section: Option<String>,
    pub class_teacher_id: Option<String>,
    pub capacity: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ClassPatch {
    pub class_name: Option<String>,
    pub grade_level: Option<String>,
    pub section: Option<String>,
    pub class_teacher_id: Option<String>,
    pub capacity: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub subject_name: String,
    pub subject_code: String,
    pub applicable_grade_levels: String,
    pub assigned_teacher_id: Option<String>,
    pub assigned_teacher_name: String, // Denormalized for convenience
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbSubject {
    pub id: Option<String>,
    pub subject_name: Option<String>,
    pub subject_code: Option<String>,
    pub applicable_grade_levels: Option<String>,
    pub assigned_teacher_id: Option<String>,
    pub assigned_teacher_name: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbSubject> for Subject {
    fn from(db: DbSubject) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            subject_name: db.subject_name.unwrap_or_default(),
            subject_code: db.subject_code.unwrap_or_default(),
            applicable_grade_levels: db.applicable_grade_levels.unwrap_or_default(),
            assigned_teacher_id: db.assigned_teacher_id,
            assigned_teacher_name: db
                .assigned_teacher_name
                .unwrap_or_else(|| UNASSIGNED_TEACHER.to_string()),
            created_at: utc_or_now(db.created_at),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSubject {
    pub subject_name: String,
    pub subject_code: String,
    pub applicable_grade_levels: String,
    pub assigned_teacher_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SubjectPatch {
    pub subject_name: Option<String>,
    pub subject_code: Option<String>,
    pub applicable_grade_levels: Option<String>,
    pub assigned_teacher_id: Option<String>,
}
