use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use super::{ensure_found, get_student, new_id, now};
use crate::error::AppError;
use crate::models::{AttendancePatch, AttendanceRecord, DbAttendanceRecord, NewAttendance};

const ATTENDANCE_COLUMNS: &str =
    "id, student_id, student_name, date, status, subject, reason, created_at";

#[instrument(skip(pool))]
pub async fn list_attendance(pool: &Pool<Sqlite>) -> Result<Vec<AttendanceRecord>, AppError> {
    info!("Listing attendance records");
    let rows = sqlx::query_as::<_, DbAttendanceRecord>(&format!(
        "SELECT {} FROM attendance_records ORDER BY created_at DESC, rowid DESC",
        ATTENDANCE_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(AttendanceRecord::from).collect())
}

#[instrument(skip(pool))]
pub async fn list_attendance_for_student(
    pool: &Pool<Sqlite>,
    student_id: &str,
) -> Result<Vec<AttendanceRecord>, AppError> {
    info!("Listing attendance for student");
    let rows = sqlx::query_as::<_, DbAttendanceRecord>(&format!(
        "SELECT {} FROM attendance_records WHERE student_id = ? ORDER BY date DESC, created_at DESC, rowid DESC",
        ATTENDANCE_COLUMNS
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(AttendanceRecord::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_attendance(pool: &Pool<Sqlite>, id: &str) -> Result<AttendanceRecord, AppError> {
    info!("Fetching attendance record by ID");
    let row = sqlx::query_as::<_, DbAttendanceRecord>(&format!(
        "SELECT {} FROM attendance_records WHERE id = ?",
        ATTENDANCE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(AttendanceRecord::from).ok_or_else(|| {
        AppError::NotFound(format!(
            "Attendance record with id {} not found in database",
            id
        ))
    })
}

#[instrument(skip(pool))]
pub async fn create_attendance(
    pool: &Pool<Sqlite>,
    record: &NewAttendance,
) -> Result<AttendanceRecord, AppError> {
    info!("Recording attendance");
    let student = get_student(pool, &record.student_id).await?;
    let id = new_id();

    sqlx::query(
        "INSERT INTO attendance_records
         (id, student_id, student_name, date, status, subject, reason, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&student.id)
    .bind(&student.student_name)
    .bind(&record.date)
    .bind(record.status.as_str())
    .bind(&record.subject)
    .bind(&record.reason)
    .bind(now())
    .execute(pool)
    .await?;

    get_attendance(pool, &id).await
}

#[instrument(skip(pool))]
pub async fn update_attendance(
    pool: &Pool<Sqlite>,
    id: &str,
    patch: &AttendancePatch,
) -> Result<AttendanceRecord, AppError> {
    info!("Updating attendance record");
    let res = sqlx::query(
        "UPDATE attendance_records SET
            date = COALESCE(?, date),
            status = COALESCE(?, status),
            subject = COALESCE(?, subject),
            reason = COALESCE(?, reason)
         WHERE id = ?",
    )
    .bind(&patch.date)
    .bind(patch.status.map(|s| s.as_str()))
    .bind(&patch.subject)
    .bind(&patch.reason)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_found(res.rows_affected(), "Attendance record", id)?;
    get_attendance(pool, id).await
}

#[instrument(skip(pool))]
pub async fn delete_attendance(pool: &Pool<Sqlite>, id: &str) -> Result<(), AppError> {
    info!("Deleting attendance record");
    let res = sqlx::query("DELETE FROM attendance_records WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    ensure_found(res.rows_affected(), "Attendance record", id)
}
