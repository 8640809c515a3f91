use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use super::{ensure_found, new_id, now};
use crate::error::AppError;
use crate::models::{DbNotice, NewNotice, Notice, NoticePatch, NoticeStatus};

const NOTICE_COLUMNS: &str =
    "id, notice_title, notice_content, audience, publish_date, status, is_urgent, created_at";

#[instrument(skip(pool))]
pub async fn list_notices(pool: &Pool<Sqlite>) -> Result<Vec<Notice>, AppError> {
    info!("Listing notices");
    let rows = sqlx::query_as::<_, DbNotice>(&format!(
        "SELECT {} FROM notices ORDER BY created_at DESC, rowid DESC",
        NOTICE_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Notice::from).collect())
}

#[instrument(skip(pool))]
pub async fn list_published_notices(pool: &Pool<Sqlite>) -> Result<Vec<Notice>, AppError> {
    info!("Listing published notices");
    let rows = sqlx::query_as::<_, DbNotice>(&format!(
        "SELECT {} FROM notices WHERE status = ? ORDER BY publish_date DESC, created_at DESC",
        NOTICE_COLUMNS
    ))
    .bind(NoticeStatus::Published.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Notice::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_notice(pool: &Pool<Sqlite>, id: &str) -> Result<Notice, AppError> {
    info!("Fetching notice by ID");
    let row = sqlx::query_as::<_, DbNotice>(&format!(
        "SELECT {} FROM notices WHERE id = ?",
        NOTICE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Notice::from)
        .ok_or_else(|| AppError::NotFound(format!("Notice with id {} not found in database", id)))
}

#[instrument(skip(pool))]
pub async fn create_notice(pool: &Pool<Sqlite>, notice: &NewNotice) -> Result<Notice, AppError> {
    info!("Creating notice");
    let id = new_id();

    sqlx::query(
        "INSERT INTO notices
         (id, notice_title, notice_content, audience, publish_date, status, is_urgent, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&notice.notice_title)
    .bind(&notice.notice_content)
    .bind(&notice.audience)
    .bind(&notice.publish_date)
    .bind(notice.status.as_str())
    .bind(notice.is_urgent)
    .bind(now())
    .execute(pool)
    .await?;

    get_notice(pool, &id).await
}

#[instrument(skip(pool))]
pub async fn update_notice(
    pool: &Pool<Sqlite>,
    id: &str,
    patch: &NoticePatch,
) -> Result<Notice, AppError> {
    info!("Updating notice");
    let res = sqlx::query(
        "UPDATE notices SET
            notice_title = COALESCE(?, notice_title),
            notice_content = COALESCE(?, notice_content),
            audience = COALESCE(?, audience),
            publish_date = COALESCE(?, publish_date),
            status = COALESCE(?, status),
            is_urgent = COALESCE(?, is_urgent)
         WHERE id = ?",
    )
    .bind(&patch.notice_title)
    .bind(&patch.notice_content)
    .bind(&patch.audience)
    .bind(&patch.publish_date)
    .bind(patch.status.map(|s| s.as_str()))
    .bind(patch.is_urgent)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_found(res.rows_affected(), "Notice", id)?;
    get_notice(pool, id).await
}

#[instrument(skip(pool))]
pub async fn delete_notice(pool: &Pool<Sqlite>, id: &str) -> Result<(), AppError> {
    info!("Deleting notice");
    let res = sqlx::query("DELETE FROM notices WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    ensure_found(res.rows_affected(), "Notice", id)
}
