use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use super::authorize_student_view;
use crate::auth::{Permission, User};
use crate::db::{
    create_student, delete_student, get_student, list_attendance_for_student,
    list_fees_for_student, list_results_for_student, list_students, update_student,
};
use crate::live::{ChangeBus, ChangeKind, Collection};
use crate::models::{AttendanceRecord, Fee, NewStudent, Student, StudentPatch, StudentResult};
use crate::validation::{ApiResult, JsonValidateExt, blank_as_none};

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct StudentRequest {
    #[validate(length(min = 1, message = "Student name is required"))]
    student_name: String,
    #[validate(length(min = 1, message = "Student number is required"))]
    student_number: String,
    #[validate(length(min = 1, message = "Grade level is required"))]
    grade_level: String,
    #[serde(deserialize_with = "blank_as_none")]
    date_of_birth: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    parent_name: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    #[validate(email(message = "Parent email must be a valid email address"))]
    parent_email: Option<String>,
}

impl From<StudentRequest> for NewStudent {
    fn from(req: StudentRequest) -> Self {
        Self {
            student_name: req.student_name.trim().to_string(),
            student_number: req.student_number.trim().to_string(),
            grade_level: req.grade_level.trim().to_string(),
            date_of_birth: req.date_of_birth,
            parent_name: req.parent_name,
            parent_email: req.parent_email,
        }
    }
}

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct StudentUpdateRequest {
    #[validate(length(min = 1, message = "Student name cannot be blank"))]
    student_name: Option<String>,
    #[validate(length(min = 1, message = "Student number cannot be blank"))]
    student_number: Option<String>,
    #[validate(length(min = 1, message = "Grade level cannot be blank"))]
    grade_level: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    date_of_birth: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    parent_name: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    #[validate(email(message = "Parent email must be a valid email address"))]
    parent_email: Option<String>,
}

impl From<StudentUpdateRequest> for StudentPatch {
    fn from(req: StudentUpdateRequest) -> Self {
        Self {
            student_name: req.student_name.map(|v| v.trim().to_string()),
            student_number: req.student_number.map(|v| v.trim().to_string()),
            grade_level: req.grade_level.map(|v| v.trim().to_string()),
            date_of_birth: req.date_of_birth,
            parent_name: req.parent_name,
            parent_email: req.parent_email,
        }
    }
}

#[get("/students")]
pub async fn api_list_students(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Vec<Student>>> {
    user.require_permission(Permission::ViewAllStudents)?;
    Ok(Json(list_students(db).await?))
}

#[get("/students/<id>")]
pub async fn api_get_student(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Student>> {
    let student = match authorize_student_view(db, &user, id).await? {
        Some(student) => student,
        None => get_student(db, id).await?,
    };
    Ok(Json(student))
}

#[post("/students", data = "<student>")]
pub async fn api_create_student(
    student: Json<StudentRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<(Status, Json<Student>)> {
    user.require_permission(Permission::ManageStudents)?;
    let validated = student.validate_custom()?;

    let created = create_student(db, &NewStudent::from(validated)).await?;
    bus.publish(Collection::Students, ChangeKind::Created, &created.id);

    Ok((Status::Created, Json(created)))
}

#[put("/students/<id>", data = "<student>")]
pub async fn api_update_student(
    id: &str,
    student: Json<StudentUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Json<Student>> {
    user.require_permission(Permission::ManageStudents)?;
    let validated = student.validate_custom()?;

    let updated = update_student(db, id, &StudentPatch::from(validated)).await?;
    bus.publish(Collection::Students, ChangeKind::Updated, id);

    Ok(Json(updated))
}

#[delete("/students/<id>")]
pub async fn api_delete_student(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Status> {
    user.require_permission(Permission::ManageStudents)?;

    delete_student(db, id).await?;
    bus.publish(Collection::Students, ChangeKind::Deleted, id);

    Ok(Status::NoContent)
}

#[get("/students/<id>/results")]
pub async fn api_student_results(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<StudentResult>>> {
    authorize_student_view(db, &user, id).await?;
    Ok(Json(list_results_for_student(db, id).await?))
}

#[get("/students/<id>/fees")]
pub async fn api_student_fees(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<Fee>>> {
    authorize_student_view(db, &user, id).await?;
    Ok(Json(list_fees_for_student(db, id).await?))
}

#[get("/students/<id>/attendance")]
pub async fn api_student_attendance(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<AttendanceRecord>>> {
    authorize_student_view(db, &user, id).await?;
    Ok(Json(list_attendance_for_student(db, id).await?))
}
