use serde_json::{Map, Value};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use super::now;
use crate::error::AppError;
use crate::models::{ContentSection, DbWebsiteContent, WebsiteContent, merge_content};

/// Stored content for `section`, or the built-in defaults when nothing has
/// been saved yet.
#[instrument(skip(pool))]
pub async fn get_content(
    pool: &Pool<Sqlite>,
    section: ContentSection,
) -> Result<WebsiteContent, AppError> {
    info!(section = section.key(), "Fetching website content");
    let row = sqlx::query_as::<_, DbWebsiteContent>(
        "SELECT section, body, updated_at FROM website_content WHERE section = ?",
    )
    .bind(section.key())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => WebsiteContent::try_from(row),
        None => Ok(WebsiteContent {
            section: section.key().to_string(),
            body: section.defaults(),
            updated_at: None,
        }),
    }
}

#[instrument(skip(pool, patch))]
pub async fn save_content(
    pool: &Pool<Sqlite>,
    section: ContentSection,
    patch: Map<String, Value>,
) -> Result<WebsiteContent, AppError> {
    info!(section = section.key(), keys = patch.len(), "Saving website content");
    let current = get_content(pool, section).await?;
    let merged = merge_content(current.body, patch);
    let body = serde_json::to_string(&merged)?;

    sqlx::query(
        "INSERT INTO website_content (section, body, updated_at) VALUES (?, ?, ?)
         ON CONFLICT(section) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
    )
    .bind(section.key())
    .bind(body)
    .bind(now())
    .execute(pool)
    .await?;

    get_content(pool, section).await
}
