use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, User};
use crate::db::{
    create_class, create_subject, create_teacher, delete_class, delete_subject, delete_teacher,
    get_class, get_subject, get_teacher, list_classes, list_subjects, list_teachers, update_class,
    update_subject, update_teacher,
};
use crate::live::{ChangeBus, ChangeKind, Collection};
use crate::models::{
    Class, ClassPatch, NewClass, NewSubject, NewTeacher, Subject, SubjectPatch, Teacher,
    TeacherPatch,
};
use crate::validation::{ApiResult, JsonValidateExt, blank_as_none};

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct TeacherRequest {
    #[validate(length(min = 1, message = "Teacher name is required"))]
    teacher_name: String,
    #[validate(length(min = 1, message = "Teacher number is required"))]
    teacher_number: String,
    #[serde(deserialize_with = "blank_as_none")]
    subjects_taught: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    department: Option<String>,
    #[validate(email(message = "Enter a valid email address"))]
    email: String,
    #[serde(deserialize_with = "blank_as_none")]
    phone: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    bio: Option<String>,
}

impl From<TeacherRequest> for NewTeacher {
    fn from(req: TeacherRequest) -> Self {
        Self {
            teacher_name: req.teacher_name.trim().to_string(),
            teacher_number: req.teacher_number.trim().to_string(),
            subjects_taught: req.subjects_taught,
            department: req.department,
            email: req.email.trim().to_string(),
            phone: req.phone,
            bio: req.bio,
        }
    }
}

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct TeacherUpdateRequest {
    #[validate(length(min = 1, message = "Teacher name cannot be blank"))]
    teacher_name: Option<String>,
    #[validate(length(min = 1, message = "Teacher number cannot be blank"))]
    teacher_number: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    subjects_taught: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    department: Option<String>,
    #[validate(email(message = "Enter a valid email address"))]
    email: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    phone: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    bio: Option<String>,
}

impl From<TeacherUpdateRequest> for TeacherPatch {
    fn from(req: TeacherUpdateRequest) -> Self {
        Self {
            teacher_name: req.teacher_name.map(|v| v.trim().to_string()),
            teacher_number: req.teacher_number.map(|v| v.trim().to_string()),
            subjects_taught: req.subjects_taught,
            department: req.department,
            email: req.email.map(|v| v.trim().to_string()),
            phone: req.phone,
            bio: req.bio,
        }
    }
}

#[get("/teachers")]
pub async fn api_list_teachers(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Vec<Teacher>>> {
    user.require_permission(Permission::ManageStaff)?;
    Ok(Json(list_teachers(db).await?))
}

#[get("/teachers/<id>")]
pub async fn api_get_teacher(id: &str, user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Teacher>> {
    user.require_permission(Permission::ManageStaff)?;
    Ok(Json(get_teacher(db, id).await?))
}

#[post("/teachers", data = "<teacher>")]
pub async fn api_create_teacher(
    teacher: Json<TeacherRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<(Status, Json<Teacher>)> {
    user.require_permission(Permission::ManageStaff)?;
    let validated = teacher.validate_custom()?;

    let created = create_teacher(db, &NewTeacher::from(validated)).await?;
    bus.publish(Collection::Teachers, ChangeKind::Created, &created.id);

    Ok((Status::Created, Json(created)))
}

#[put("/teachers/<id>", data = "<teacher>")]
pub async fn api_update_teacher(
    id: &str,
    teacher: Json<TeacherUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Json<Teacher>> {
    user.require_permission(Permission::ManageStaff)?;
    let validated = teacher.validate_custom()?;

    let updated = update_teacher(db, id, &TeacherPatch::from(validated)).await?;
    bus.publish(Collection::Teachers, ChangeKind::Updated, id);

    Ok(Json(updated))
}

#[delete("/teachers/<id>")]
pub async fn api_delete_teacher(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Status> {
    user.require_permission(Permission::ManageStaff)?;

    delete_teacher(db, id).await?;
    bus.publish(Collection::Teachers, ChangeKind::Deleted, id);

    Ok(Status::NoContent)
}

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct ClassRequest {
    #[validate(length(min = 1, message = "Class name is required"))]
    class_name: String,
    #[validate(length(min = 1, message = "Grade level is required"))]
    grade_level: String,
    #[serde(deserialize_with = "blank_as_none")]
    section: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    class_teacher_id: Option<String>,
    #[validate(range(min = 0, message = "Capacity cannot be negative"))]
    capacity: i64,
}

impl From<ClassRequest> for NewClass {
    fn from(req: ClassRequest) -> Self {
        Self {
            class_name: req.class_name.trim().to_string(),
            grade_level: req.grade_level.trim().to_string(),
            section: req.section,
            class_teacher_id: req.class_teacher_id,
            capacity: req.capacity,
        }
    }
}

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct ClassUpdateRequest {
    #[validate(length(min = 1, message = "Class name cannot be blank"))]
    class_name: Option<String>,
    #[validate(length(min = 1, message = "Grade level cannot be blank"))]
    grade_level: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    section: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    class_teacher_id: Option<String>,
    #[validate(range(min = 0, message = "Capacity cannot be negative"))]
    capacity: Option<i64>,
}

impl From<ClassUpdateRequest> for ClassPatch {
    fn from(req: ClassUpdateRequest) -> Self {
        Self {
            class_name: req.class_name.map(|v| v.trim().to_string()),
            grade_level: req.grade_level.map(|v| v.trim().to_string()),
            section: req.section,
            class_teacher_id: req.class_teacher_id,
            capacity: req.capacity,
        }
    }
}

#[get("/classes")]
pub async fn api_list_classes(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Vec<Class>>> {
    user.require_permission(Permission::ManageStaff)?;
    Ok(Json(list_classes(db).await?))
}

#[get("/classes/<id>")]
pub async fn api_get_class(id: &str, user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Class>> {
    user.require_permission(Permission::ManageStaff)?;
    Ok(Json(get_class(db, id).await?))
}

#[post("/classes", data = "<class>")]
pub async fn api_create_class(
    class: Json<ClassRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<(Status, Json<Class>)> {
    user.require_permission(Permission::ManageStaff)?;
    let validated = class.validate_custom()?;

    let created = create_class(db, &NewClass::from(validated)).await?;
    bus.publish(Collection::Classes, ChangeKind::Created, &created.id);

    Ok((Status::Created, Json(created)))
}

#[put("/classes/<id>", data = "<class>")]
pub async fn api_update_class(
    id: &str,
    class: Json<ClassUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Json<Class>> {
    user.require_permission(Permission::ManageStaff)?;
    let validated = class.validate_custom()?;

    let updated = update_class(db, id, &ClassPatch::from(validated)).await?;
    bus.publish(Collection::Classes, ChangeKind::Updated, id);

    Ok(Json(updated))
}

#[delete("/classes/<id>")]
pub async fn api_delete_class(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Status> {
    user.require_permission(Permission::ManageStaff)?;

    delete_class(db, id).await?;
    bus.publish(Collection::Classes, ChangeKind::Deleted, id);

    Ok(Status::NoContent)
}

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct SubjectRequest {
    #[validate(length(min = 1, message = "Subject name is required"))]
    subject_name: String,
    #[validate(length(min = 1, message = "Subject code is required"))]
    subject_code: String,
    #[validate(length(min = 1, message = "Applicable grade levels are required"))]
    applicable_grade_levels: String,
    #[serde(deserialize_with = "blank_as_none")]
    assigned_teacher_id: Option<String>,
}

impl From<SubjectRequest> for NewSubject {
    fn from(req: SubjectRequest) -> Self {
        Self {
            subject_name: req.subject_name.trim().to_string(),
            subject_code: req.subject_code.trim().to_string(),
            applicable_grade_levels: req.applicable_grade_levels.trim().to_string(),
            assigned_teacher_id: req.assigned_teacher_id,
        }
    }
}

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct SubjectUpdateRequest {
    #[validate(length(min = 1, message = "Subject name cannot be blank"))]
    subject_name: Option<String>,
    #[validate(length(min = 1, message = "Subject code cannot be blank"))]
    subject_code: Option<String>,
    #[validate(length(min = 1, message = "Applicable grade levels cannot be blank"))]
    applicable_grade_levels: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    assigned_teacher_id: Option<String>,
}

impl From<SubjectUpdateRequest> for SubjectPatch {
    fn from(req: SubjectUpdateRequest) -> Self {
        Self {
            subject_name: req.subject_name.map(|v| v.trim().to_string()),
            subject_code: req.subject_code.map(|v| v.trim().to_string()),
            applicable_grade_levels: req.applicable_grade_levels.map(|v| v.trim().to_string()),
            assigned_teacher_id: req.assigned_teacher_id,
        }
    }
}

#[get("/subjects")]
pub async fn api_list_subjects(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Vec<Subject>>> {
    user.require_permission(Permission::ManageStaff)?;
    Ok(Json(list_subjects(db).await?))
}

#[get("/subjects/<id>")]
pub async fn api_get_subject(id: &str, user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Subject>> {
    user.require_permission(Permission::ManageStaff)?;
    Ok(Json(get_subject(db, id).await?))
}

#[post("/subjects", data = "<subject>")]
pub async fn api_create_subject(
    subject: Json<SubjectRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<(Status, Json<Subject>)> {
    user.require_permission(Permission::ManageStaff)?;
    let validated = subject.validate_custom()?;

    let created = create_subject(db, &NewSubject::from(validated)).await?;
    bus.publish(Collection::Subjects, ChangeKind::Created, &created.id);

    Ok((Status::Created, Json(created)))
}

#[put("/subjects/<id>", data = "<subject>")]
pub async fn api_update_subject(
    id: &str,
    subject: Json<SubjectUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Json<Subject>> {
    user.require_permission(Permission::ManageStaff)?;
    let validated = subject.validate_custom()?;

    let updated = update_subject(db, id, &SubjectPatch::from(validated)).await?;
    bus.publish(Collection::Subjects, ChangeKind::Updated, id);

    Ok(Json(updated))
}

#[delete("/subjects/<id>")]
pub async fn api_delete_subject(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Status> {
    user.require_permission(Permission::ManageStaff)?;

    delete_subject(db, id).await?;
    bus.publish(Collection::Subjects, ChangeKind::Deleted, id);

    Ok(Status::NoContent)
}
