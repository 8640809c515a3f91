use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, User};
use crate::db::{
    create_notice, delete_notice, get_notice, list_notices, list_published_notices, update_notice,
};
use crate::live::{ChangeBus, ChangeKind, Collection};
use crate::models::{NewNotice, Notice, NoticePatch, NoticeStatus};
use crate::validation::{ApiResult, JsonValidateExt};

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct NoticeRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    notice_title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    notice_content: String,
    #[validate(length(min = 1, message = "Audience is required"))]
    audience: String,
    #[validate(length(min = 1, message = "Publish date is required"))]
    publish_date: String,
    status: Option<NoticeStatus>,
    is_urgent: bool,
}

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct NoticeUpdateRequest {
    #[validate(length(min = 1, message = "Title cannot be blank"))]
    notice_title: Option<String>,
    #[validate(length(min = 1, message = "Content cannot be blank"))]
    notice_content: Option<String>,
    #[validate(length(min = 1, message = "Audience cannot be blank"))]
    audience: Option<String>,
    #[validate(length(min = 1, message = "Publish date cannot be blank"))]
    publish_date: Option<String>,
    status: Option<NoticeStatus>,
    is_urgent: Option<bool>,
}

/// Published notices, newest publish date first. Open to anyone.
#[get("/notices/published")]
pub async fn api_published_notices(db: &State<Pool<Sqlite>>) -> ApiResult<Json<Vec<Notice>>> {
    Ok(Json(list_published_notices(db).await?))
}

#[get("/notices")]
pub async fn api_list_notices(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Vec<Notice>>> {
    user.require_permission(Permission::ManageNotices)?;
    Ok(Json(list_notices(db).await?))
}

#[get("/notices/<id>")]
pub async fn api_get_notice(id: &str, user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Notice>> {
    user.require_permission(Permission::ManageNotices)?;
    Ok(Json(get_notice(db, id).await?))
}

#[post("/notices", data = "<notice>")]
pub async fn api_create_notice(
    notice: Json<NoticeRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<(Status, Json<Notice>)> {
    user.require_permission(Permission::ManageNotices)?;
    let validated = notice.validate_custom()?;

    let new_notice = NewNotice {
        notice_title: validated.notice_title.trim().to_string(),
        notice_content: validated.notice_content,
        audience: validated.audience.trim().to_string(),
        publish_date: validated.publish_date.trim().to_string(),
        status: validated.status.unwrap_or(NoticeStatus::Published),
        is_urgent: validated.is_urgent,
    };

    let created = create_notice(db, &new_notice).await?;
    bus.publish(Collection::Notices, ChangeKind::Created, &created.id);

    Ok((Status::Created, Json(created)))
}

#[put("/notices/<id>", data = "<notice>")]
pub async fn api_update_notice(
    id: &str,
    notice: Json<NoticeUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Json<Notice>> {
    user.require_permission(Permission::ManageNotices)?;
    let validated = notice.validate_custom()?;

    let patch = NoticePatch {
        notice_title: validated.notice_title.map(|v| v.trim().to_string()),
        notice_content: validated.notice_content,
        audience: validated.audience.map(|v| v.trim().to_string()),
        publish_date: validated.publish_date.map(|v| v.trim().to_string()),
        status: validated.status,
        is_urgent: validated.is_urgent,
    };

    let updated = update_notice(db, id, &patch).await?;
    bus.publish(Collection::Notices, ChangeKind::Updated, id);

    Ok(Json(updated))
}

#[delete("/notices/<id>")]
pub async fn api_delete_notice(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Status> {
    user.require_permission(Permission::ManageNotices)?;

    delete_notice(db, id).await?;
    bus.publish(Collection::Notices, ChangeKind::Deleted, id);

    Ok(Status::NoContent)
}
