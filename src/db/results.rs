use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use super::{ensure_found, get_student, new_id, now};
use crate::error::AppError;
use crate::models::{DbStudentResult, ResultEntry, ResultPatch, StudentResult};

const RESULT_COLUMNS: &str =
    "id, student_id, student_name, subject_name, marks, term, comments, created_at";

/// Writes one result row per entry, each carrying the student's name as it
/// reads right now. Rows are inserted one at a time with no transaction.
#[instrument(skip(pool, entries), fields(entries = entries.len()))]
pub async fn create_results(
    pool: &Pool<Sqlite>,
    student_id: &str,
    term: &str,
    entries: &[ResultEntry],
) -> Result<Vec<StudentResult>, AppError> {
    info!("Recording result batch");
    let student = get_student(pool, student_id).await?;

    let mut ids = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = new_id();
        sqlx::query(
            "INSERT INTO results
             (id, student_id, student_name, subject_name, marks, term, comments, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&student.id)
        .bind(&student.student_name)
        .bind(&entry.subject_name)
        .bind(&entry.marks)
        .bind(term)
        .bind(&entry.comments)
        .bind(now())
        .execute(pool)
        .await?;
        ids.push(id);
    }

    let mut created = Vec::with_capacity(ids.len());
    for id in &ids {
        created.push(get_result(pool, id).await?);
    }
    Ok(created)
}

#[instrument(skip(pool))]
pub async fn list_results(pool: &Pool<Sqlite>) -> Result<Vec<StudentResult>, AppError> {
    info!("Listing results");
    let rows = sqlx::query_as::<_, DbStudentResult>(&format!(
        "SELECT {} FROM results ORDER BY created_at DESC, rowid DESC",
        RESULT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(StudentResult::from).collect())
}

/// Grades listing for one student, latest term label first.
#[instrument(skip(pool))]
pub async fn list_results_for_student(
    pool: &Pool<Sqlite>,
    student_id: &str,
) -> Result<Vec<StudentResult>, AppError> {
    info!("Listing results for student");
    let rows = sqlx::query_as::<_, DbStudentResult>(&format!(
        "SELECT {} FROM results WHERE student_id = ? ORDER BY term DESC, created_at DESC, rowid DESC",
        RESULT_COLUMNS
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(StudentResult::from).collect())
}

/// Results in the order they were recorded, as the report card lists them.
#[instrument(skip(pool))]
pub async fn results_for_report(
    pool: &Pool<Sqlite>,
    student_id: &str,
) -> Result<Vec<StudentResult>, AppError> {
    info!("Loading results for report card");
    let rows = sqlx::query_as::<_, DbStudentResult>(&format!(
        "SELECT {} FROM results WHERE student_id = ? ORDER BY created_at ASC, rowid ASC",
        RESULT_COLUMNS
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(StudentResult::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_result(pool: &Pool<Sqlite>, id: &str) -> Result<StudentResult, AppError> {
    info!("Fetching result by ID");
    let row = sqlx::query_as::<_, DbStudentResult>(&format!(
        "SELECT {} FROM results WHERE id = ?",
        RESULT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(StudentResult::from)
        .ok_or_else(|| AppError::NotFound(format!("Result with id {} not found in database", id)))
}

#[instrument(skip(pool))]
pub async fn update_result(
    pool: &Pool<Sqlite>,
    id: &str,
    patch: &ResultPatch,
) -> Result<StudentResult, AppError> {
    info!("Updating result");
    let res = sqlx::query(
        "UPDATE results SET
            subject_name = COALESCE(?, subject_name),
            marks = COALESCE(?, marks),
            term = COALESCE(?, term),
            comments = COALESCE(?, comments)
         WHERE id = ?",
    )
    .bind(&patch.subject_name)
    .bind(&patch.marks)
    .bind(&patch.term)
    .bind(&patch.comments)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_found(res.rows_affected(), "Result", id)?;
    get_result(pool, id).await
}

#[instrument(skip(pool))]
pub async fn delete_result(pool: &Pool<Sqlite>, id: &str) -> Result<(), AppError> {
    info!("Deleting result");
    let res = sqlx::query("DELETE FROM results WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    ensure_found(res.rows_affected(), "Result", id)
}
