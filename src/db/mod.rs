mod attendance;
mod content;
mod fees;
mod notices;
mod results;
mod staff;
mod students;
mod users;

pub use attendance::*;
pub use content::*;
pub use fees::*;
pub use notices::*;
pub use results::*;
pub use staff::*;
pub use students::*;
pub use users::*;

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub(crate) fn ensure_found(rows_affected: u64, what: &str, id: &str) -> Result<(), AppError> {
    if rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "{} with id {} not found in database",
            what, id
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize, serde::Deserialize, PartialEq)]
pub struct DashboardCounts {
    pub students: i64,
    pub teachers: i64,
    pub classes: i64,
    pub published_notices: i64,
}

#[instrument(skip(pool))]
pub async fn get_dashboard_counts(pool: &Pool<Sqlite>) -> Result<DashboardCounts, AppError> {
    info!("Counting dashboard totals");

    let students: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
        .fetch_one(pool)
        .await?;
    let teachers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teachers")
        .fetch_one(pool)
        .await?;
    let classes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM classes")
        .fetch_one(pool)
        .await?;
    let published_notices: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM notices WHERE status = 'Published'")
            .fetch_one(pool)
            .await?;

    Ok(DashboardCounts {
        students,
        teachers,
        classes,
        published_notices,
    })
}
