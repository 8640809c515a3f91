use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, User};
use crate::db::{
    create_attendance, delete_attendance, get_attendance, list_attendance, update_attendance,
};
use crate::live::{ChangeBus, ChangeKind, Collection};
use crate::models::{AttendancePatch, AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::validation::{ApiResult, JsonValidateExt, blank_as_none};

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct AttendanceRequest {
    #[validate(length(min = 1, message = "Select a student"))]
    student_id: String,
    #[validate(length(min = 1, message = "Date is required"))]
    date: String,
    #[validate(required(message = "Status is required"))]
    status: Option<AttendanceStatus>,
    #[serde(deserialize_with = "blank_as_none")]
    subject: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    reason: Option<String>,
}

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct AttendanceUpdateRequest {
    #[validate(length(min = 1, message = "Date cannot be blank"))]
    date: Option<String>,
    status: Option<AttendanceStatus>,
    #[serde(deserialize_with = "blank_as_none")]
    subject: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    reason: Option<String>,
}

#[get("/attendance")]
pub async fn api_list_attendance(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<AttendanceRecord>>> {
    user.require_permission(Permission::ManageAcademicRecords)?;
    Ok(Json(list_attendance(db).await?))
}

#[get("/attendance/<id>")]
pub async fn api_get_attendance(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<AttendanceRecord>> {
    user.require_permission(Permission::ManageAcademicRecords)?;
    Ok(Json(get_attendance(db, id).await?))
}

#[post("/attendance", data = "<record>")]
pub async fn api_create_attendance(
    record: Json<AttendanceRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<(Status, Json<AttendanceRecord>)> {
    user.require_permission(Permission::ManageAcademicRecords)?;
    let validated = record.validate_custom()?;

    let new_record = NewAttendance {
        student_id: validated.student_id.trim().to_string(),
        date: validated.date.trim().to_string(),
        status: validated.status.unwrap_or(AttendanceStatus::Present),
        subject: validated.subject,
        reason: validated.reason,
    };

    let created = create_attendance(db, &new_record).await?;
    bus.publish(Collection::Attendance, ChangeKind::Created, &created.id);

    Ok((Status::Created, Json(created)))
}

#[put("/attendance/<id>", data = "<record>")]
pub async fn api_update_attendance(
    id: &str,
    record: Json<AttendanceUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Json<AttendanceRecord>> {
    user.require_permission(Permission::ManageAcademicRecords)?;
    let validated = record.validate_custom()?;

    let patch = AttendancePatch {
        date: validated.date.map(|v| v.trim().to_string()),
        status: validated.status,
        subject: validated.subject,
        reason: validated.reason,
    };

    let updated = update_attendance(db, id, &patch).await?;
    bus.publish(Collection::Attendance, ChangeKind::Updated, id);

    Ok(Json(updated))
}

#[delete("/attendance/<id>")]
pub async fn api_delete_attendance(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Status> {
    user.require_permission(Permission::ManageAcademicRecords)?;

    delete_attendance(db, id).await?;
    bus.publish(Collection::Attendance, ChangeKind::Deleted, id);

    Ok(Status::NoContent)
}
