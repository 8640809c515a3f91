use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::utc_or_now;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeStatus {
    Published,
    Draft,
}

impl NoticeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeStatus::Published => "Published",
            NoticeStatus::Draft => "Draft",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "Published" => Ok(NoticeStatus::Published),
            "Draft" => Ok(NoticeStatus::Draft),
            _ => Err(AppError::Validation(format!("Unknown notice status: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: String,
    pub notice_title: String,
    pub notice_content: String,
    pub audience: String,
    pub publish_date: String,
    pub status: NoticeStatus,
    pub is_urgent: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbNotice {
    pub id: Option<String>,
    pub notice_title: Option<String>,
    pub notice_content: Option<String>,
    pub audience: Option<String>,
    pub publish_date: Option<String>,
    pub status: Option<String>,
    pub is_urgent: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbNotice> for Notice {
    fn from(db: DbNotice) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            notice_title: db.notice_title.unwrap_or_default(),
            notice_content: db.notice_content.unwrap_or_default(),
            audience: db.audience.unwrap_or_default(),
            publish_date: db.publish_date.unwrap_or_default(),
            // Anything not explicitly published stays hidden.
            status: db
                .status
                .as_deref()
                .and_then(|s| NoticeStatus::parse(s).ok())
                .unwrap_or(NoticeStatus::Draft),
            is_urgent: db.is_urgent.unwrap_or_default(),
            created_at: utc_or_now(db.created_at),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewNotice {
    pub notice_title: String,
    pub notice_content: String,
    pub audience: String,
    pub publish_date: String,
    pub status: NoticeStatus,
    pub is_urgent: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NoticePatch {
    pub notice_title: Option<String>,
    pub notice_content: Option<String>,
    pub audience: Option<String>,
    pub publish_date: Option<String>,
    pub status: Option<NoticeStatus>,
    pub is_urgent: Option<bool>,
}
