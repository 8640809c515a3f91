use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use super::{ensure_found, get_student, new_id, now};
use crate::error::AppError;
use crate::models::{DbFee, Fee, FeePatch, NewFee, settle_new_fee, settle_updated_fee};

const FEE_COLUMNS: &str = "id, student_id, student_name, fee_title, amount_due, amount_paid, due_date, status, payment_date, notes, created_at";

#[instrument(skip(pool))]
pub async fn list_fees(pool: &Pool<Sqlite>) -> Result<Vec<Fee>, AppError> {
    info!("Listing fees");
    let rows = sqlx::query_as::<_, DbFee>(&format!(
        "SELECT {} FROM fees ORDER BY created_at DESC, rowid DESC",
        FEE_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Fee::from).collect())
}

#[instrument(skip(pool))]
pub async fn list_fees_for_student(
    pool: &Pool<Sqlite>,
    student_id: &str,
) -> Result<Vec<Fee>, AppError> {
    info!("Listing fees for student");
    let rows = sqlx::query_as::<_, DbFee>(&format!(
        "SELECT {} FROM fees WHERE student_id = ? ORDER BY due_date DESC, created_at DESC, rowid DESC",
        FEE_COLUMNS
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Fee::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_fee(pool: &Pool<Sqlite>, id: &str) -> Result<Fee, AppError> {
    info!("Fetching fee by ID");
    let row = sqlx::query_as::<_, DbFee>(&format!("SELECT {} FROM fees WHERE id = ?", FEE_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(Fee::from)
        .ok_or_else(|| AppError::NotFound(format!("Fee with id {} not found in database", id)))
}

#[instrument(skip(pool))]
pub async fn create_fee(pool: &Pool<Sqlite>, fee: &NewFee) -> Result<Fee, AppError> {
    info!("Creating fee");
    let created_at = now();
    let settlement = settle_new_fee(fee.status, fee.amount_due, fee.amount_paid, created_at)?;
    let student = get_student(pool, &fee.student_id).await?;
    let id = new_id();

    sqlx::query(
        "INSERT INTO fees
         (id, student_id, student_name, fee_title, amount_due, amount_paid, due_date, status, payment_date, notes, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&student.id)
    .bind(&student.student_name)
    .bind(&fee.fee_title)
    .bind(fee.amount_due)
    .bind(settlement.amount_paid)
    .bind(&fee.due_date)
    .bind(fee.status.as_str())
    .bind(settlement.payment_date)
    .bind(&fee.notes)
    .bind(created_at)
    .execute(pool)
    .await?;

    get_fee(pool, &id).await
}

/// Merges `patch` into the stored fee and re-applies the payment rules to
/// the merged record. Read and write are separate statements, so two
/// concurrent edits resolve as last write wins.
#[instrument(skip(pool))]
pub async fn update_fee(pool: &Pool<Sqlite>, id: &str, patch: &FeePatch) -> Result<Fee, AppError> {
    info!("Updating fee");
    let current = get_fee(pool, id).await?;

    let status = patch.status.unwrap_or(current.status);
    let amount_due = patch.amount_due.unwrap_or(current.amount_due);
    let amount_paid = patch.amount_paid.unwrap_or(current.amount_paid);
    let settlement = settle_updated_fee(
        status,
        amount_due,
        amount_paid,
        current.payment_date.map(|dt| dt.naive_utc()),
        now(),
    )?;

    let res = sqlx::query(
        "UPDATE fees SET
            fee_title = COALESCE(?, fee_title),
            amount_due = ?,
            amount_paid = ?,
            due_date = COALESCE(?, due_date),
            status = ?,
            payment_date = ?,
            notes = COALESCE(?, notes)
         WHERE id = ?",
    )
    .bind(&patch.fee_title)
    .bind(amount_due)
    .bind(settlement.amount_paid)
    .bind(&patch.due_date)
    .bind(status.as_str())
    .bind(settlement.payment_date)
    .bind(&patch.notes)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_found(res.rows_affected(), "Fee", id)?;
    get_fee(pool, id).await
}

#[instrument(skip(pool))]
pub async fn delete_fee(pool: &Pool<Sqlite>, id: &str) -> Result<(), AppError> {
    info!("Deleting fee");
    let res = sqlx::query("DELETE FROM fees WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    ensure_found(res.rows_affected(), "Fee", id)
}
