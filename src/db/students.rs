use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use super::{ensure_found, new_id, now};
use crate::error::AppError;
use crate::models::{DbStudent, NewStudent, Student, StudentPatch};

const STUDENT_COLUMNS: &str = "id, student_name, student_number, grade_level, date_of_birth, parent_name, parent_email, created_at";

#[instrument(skip(pool))]
pub async fn list_students(pool: &Pool<Sqlite>) -> Result<Vec<Student>, AppError> {
    info!("Listing students");
    let rows = sqlx::query_as::<_, DbStudent>(&format!(
        "SELECT {} FROM students ORDER BY created_at DESC, rowid DESC",
        STUDENT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Student::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_student(pool: &Pool<Sqlite>, id: &str) -> Result<Student, AppError> {
    info!("Fetching student by ID");
    let row = sqlx::query_as::<_, DbStudent>(&format!(
        "SELECT {} FROM students WHERE id = ?",
        STUDENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(student) => Ok(Student::from(student)),
        _ => Err(AppError::NotFound(format!(
            "Student with id {} not found in database",
            id
        ))),
    }
}

/// Students whose `parent_email` matches, ignoring case. More than one
/// child may share a parent.
#[instrument(skip(pool))]
pub async fn find_students_by_parent_email(
    pool: &Pool<Sqlite>,
    parent_email: &str,
) -> Result<Vec<Student>, AppError> {
    info!("Finding students linked to parent email");
    let rows = sqlx::query_as::<_, DbStudent>(&format!(
        "SELECT {} FROM students WHERE parent_email = ? COLLATE NOCASE ORDER BY student_name",
        STUDENT_COLUMNS
    ))
    .bind(parent_email.trim())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Student::from).collect())
}

#[instrument(skip(pool))]
pub async fn create_student(pool: &Pool<Sqlite>, student: &NewStudent) -> Result<Student, AppError> {
    info!("Creating student");
    let id = new_id();

    sqlx::query(
        "INSERT INTO students
         (id, student_name, student_number, grade_level, date_of_birth, parent_name, parent_email, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&student.student_name)
    .bind(&student.student_number)
    .bind(&student.grade_level)
    .bind(&student.date_of_birth)
    .bind(&student.parent_name)
    .bind(student.parent_email.as_deref().map(str::trim))
    .bind(now())
    .execute(pool)
    .await?;

    get_student(pool, &id).await
}

/// Merges `patch` into the stored student. Records that copied the old name
/// (results, fees, attendance) keep their copy.
#[instrument(skip(pool))]
pub async fn update_student(
    pool: &Pool<Sqlite>,
    id: &str,
    patch: &StudentPatch,
) -> Result<Student, AppError> {
    info!("Updating student");
    let res = sqlx::query(
        "UPDATE students SET
            student_name = COALESCE(?, student_name),
            student_number = COALESCE(?, student_number),
            grade_level = COALESCE(?, grade_level),
            date_of_birth = COALESCE(?, date_of_birth),
            parent_name = COALESCE(?, parent_name),
            parent_email = COALESCE(?, parent_email)
         WHERE id = ?",
    )
    .bind(&patch.student_name)
    .bind(&patch.student_number)
    .bind(&patch.grade_level)
    .bind(&patch.date_of_birth)
    .bind(&patch.parent_name)
    .bind(patch.parent_email.as_deref().map(str::trim))
    .bind(id)
    .execute(pool)
    .await?;

    ensure_found(res.rows_affected(), "Student", id)?;
    get_student(pool, id).await
}

/// Hard delete. Results, fees and attendance that reference the student are
/// left in place.
#[instrument(skip(pool))]
pub async fn delete_student(pool: &Pool<Sqlite>, id: &str) -> Result<(), AppError> {
    info!("Deleting student");
    let res = sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    ensure_found(res.rows_affected(), "Student", id)
}
