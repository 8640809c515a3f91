use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::utc_or_now;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Excused => "Excused",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "Present" => Ok(AttendanceStatus::Present),
            "Absent" => Ok(AttendanceStatus::Absent),
            "Late" => Ok(AttendanceStatus::Late),
            "Excused" => Ok(AttendanceStatus::Excused),
            _ => Err(AppError::Validation(format!(
                "Unknown attendance status: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub student_name: String, // Denormalized at write time, never re-synced
    pub date: String,
    pub status: AttendanceStatus,
    pub subject: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbAttendanceRecord {
    pub id: Option<String>,
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub date: Option<String>,
    pub status: Option<String>,
    pub subject: Option<String>,
    pub reason: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbAttendanceRecord> for AttendanceRecord {
    fn from(db: DbAttendanceRecord) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            student_id: db.student_id.unwrap_or_default(),
            student_name: db.student_name.unwrap_or_default(),
            date: db.date.unwrap_or_default(),
            status: db
                .status
                .as_deref()
                .and_then(|s| AttendanceStatus::parse(s).ok())
                .unwrap_or(AttendanceStatus::Present),
            subject: db.subject,
            reason: db.reason,
            created_at: utc_or_now(db.created_at),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub student_id: String,
    pub date: String,
    pub status: AttendanceStatus,
    pub subject: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AttendancePatch {
    pub date: Option<String>,
    pub status: Option<AttendanceStatus>,
    pub subject: Option<String>,
    pub reason: Option<String>,
}
