use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use super::{ensure_found, new_id, now};
use crate::error::AppError;
use crate::models::{
    Class, ClassPatch, DbClass, DbSubject, DbTeacher, NO_CLASS_TEACHER, NewClass, NewSubject,
    NewTeacher, Subject, SubjectPatch, Teacher, TeacherPatch, UNASSIGNED_TEACHER,
};

const TEACHER_COLUMNS: &str =
    "id, teacher_name, teacher_number, subjects_taught, department, email, phone, bio, created_at";
const CLASS_COLUMNS: &str = "id, class_name, grade_level, section, class_teacher_id, class_teacher_name, capacity, created_at";
const SUBJECT_COLUMNS: &str = "id, subject_name, subject_code, applicable_grade_levels, assigned_teacher_id, assigned_teacher_name, created_at";

#[instrument(skip(pool))]
pub async fn list_teachers(pool: &Pool<Sqlite>) -> Result<Vec<Teacher>, AppError> {
    info!("Listing teachers");
    let rows = sqlx::query_as::<_, DbTeacher>(&format!(
        "SELECT {} FROM teachers ORDER BY created_at DESC, rowid DESC",
        TEACHER_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Teacher::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_teacher(pool: &Pool<Sqlite>, id: &str) -> Result<Teacher, AppError> {
    info!("Fetching teacher by ID");
    let row = sqlx::query_as::<_, DbTeacher>(&format!(
        "SELECT {} FROM teachers WHERE id = ?",
        TEACHER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Teacher::from).ok_or_else(|| {
        AppError::NotFound(format!("Teacher with id {} not found in database", id))
    })
}

#[instrument(skip(pool))]
pub async fn create_teacher(pool: &Pool<Sqlite>, teacher: &NewTeacher) -> Result<Teacher, AppError> {
    info!("Creating teacher");
    let id = new_id();

    sqlx::query(
        "INSERT INTO teachers
         (id, teacher_name, teacher_number, subjects_taught, department, email, phone, bio, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&teacher.teacher_name)
    .bind(&teacher.teacher_number)
    .bind(&teacher.subjects_taught)
    .bind(&teacher.department)
    .bind(&teacher.email)
    .bind(&teacher.phone)
    .bind(&teacher.bio)
    .bind(now())
    .execute(pool)
    .await?;

    get_teacher(pool, &id).await
}

/// Classes and subjects keep their own copy of the teacher name; renaming a
/// teacher here does not touch them.
#[instrument(skip(pool))]
pub async fn update_teacher(
    pool: &Pool<Sqlite>,
    id: &str,
    patch: &TeacherPatch,
) -> Result<Teacher, AppError> {
    info!("Updating teacher");
    let res = sqlx::query(
        "UPDATE teachers SET
            teacher_name = COALESCE(?, teacher_name),
            teacher_number = COALESCE(?, teacher_number),
            subjects_taught = COALESCE(?, subjects_taught),
            department = COALESCE(?, department),
            email = COALESCE(?, email),
            phone = COALESCE(?, phone),
            bio = COALESCE(?, bio)
         WHERE id = ?",
    )
    .bind(&patch.teacher_name)
    .bind(&patch.teacher_number)
    .bind(&patch.subjects_taught)
    .bind(&patch.department)
    .bind(&patch.email)
    .bind(&patch.phone)
    .bind(&patch.bio)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_found(res.rows_affected(), "Teacher", id)?;
    get_teacher(pool, id).await
}

#[instrument(skip(pool))]
pub async fn delete_teacher(pool: &Pool<Sqlite>, id: &str) -> Result<(), AppError> {
    info!("Deleting teacher");
    let res = sqlx::query("DELETE FROM teachers WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    ensure_found(res.rows_affected(), "Teacher", id)
}

/// Name to copy onto a class or subject. An id with no matching teacher is
/// copied as-is so the reference stays visible.
#[instrument(skip(pool))]
pub async fn resolve_teacher_name(
    pool: &Pool<Sqlite>,
    teacher_id: Option<&str>,
    fallback: &str,
) -> Result<String, AppError> {
    let Some(teacher_id) = teacher_id.filter(|id| !id.trim().is_empty()) else {
        return Ok(fallback.to_string());
    };

    match get_teacher(pool, teacher_id).await {
        Ok(teacher) => Ok(teacher.teacher_name),
        Err(AppError::NotFound(_)) => {
            warn!(teacher_id = %teacher_id, "Referenced teacher does not exist, storing id as name");
            Ok(teacher_id.to_string())
        }
        Err(err) => Err(err),
    }
}

#[instrument(skip(pool))]
pub async fn list_classes(pool: &Pool<Sqlite>) -> Result<Vec<Class>, AppError> {
    info!("Listing classes");
    let rows = sqlx::query_as::<_, DbClass>(&format!(
        "SELECT {} FROM classes ORDER BY created_at DESC, rowid DESC",
        CLASS_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Class::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_class(pool: &Pool<Sqlite>, id: &str) -> Result<Class, AppError> {
    info!("Fetching class by ID");
    let row = sqlx::query_as::<_, DbClass>(&format!(
        "SELECT {} FROM classes WHERE id = ?",
        CLASS_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Class::from)
        .ok_or_else(|| AppError::NotFound(format!("Class with id {} not found in database", id)))
}

#[instrument(skip(pool))]
pub async fn create_class(pool: &Pool<Sqlite>, class: &NewClass) -> Result<Class, AppError> {
    info!("Creating class");
    let teacher_name =
        resolve_teacher_name(pool, class.class_teacher_id.as_deref(), NO_CLASS_TEACHER).await?;
    let id = new_id();

    sqlx::query(
        "INSERT INTO classes
         (id, class_name, grade_level, section, class_teacher_id, class_teacher_name, capacity, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&class.class_name)
    .bind(&class.grade_level)
    .bind(&class.section)
    .bind(class.class_teacher_id.as_deref().filter(|t| !t.trim().is_empty()))
    .bind(teacher_name)
    .bind(class.capacity)
    .bind(now())
    .execute(pool)
    .await?;

    get_class(pool, &id).await
}

#[instrument(skip(pool))]
pub async fn update_class(
    pool: &Pool<Sqlite>,
    id: &str,
    patch: &ClassPatch,
) -> Result<Class, AppError> {
    info!("Updating class");
    // A new teacher reference re-copies the name; otherwise the stored copy stays.
    let teacher_name = match patch.class_teacher_id.as_deref() {
        Some(teacher_id) => {
            Some(resolve_teacher_name(pool, Some(teacher_id), NO_CLASS_TEACHER).await?)
        }
        None => None,
    };

    let res = sqlx::query(
        "UPDATE classes SET
            class_name = COALESCE(?, class_name),
            grade_level = COALESCE(?, grade_level),
            section = COALESCE(?, section),
            class_teacher_id = COALESCE(?, class_teacher_id),
            class_teacher_name = COALESCE(?, class_teacher_name),
            capacity = COALESCE(?, capacity)
         WHERE id = ?",
    )
    .bind(&patch.class_name)
    .bind(&patch.grade_level)
    .bind(&patch.section)
    .bind(&patch.class_teacher_id)
    .bind(teacher_name)
    .bind(patch.capacity)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_found(res.rows_affected(), "Class", id)?;
    get_class(pool, id).await
}

#[instrument(skip(pool))]
pub async fn delete_class(pool: &Pool<Sqlite>, id: &str) -> Result<(), AppError> {
    info!("Deleting class");
    let res = sqlx::query("DELETE FROM classes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    ensure_found(res.rows_affected(), "Class", id)
}

#[instrument(skip(pool))]
pub async fn list_subjects(pool: &Pool<Sqlite>) -> Result<Vec<Subject>, AppError> {
    info!("Listing subjects");
    let rows = sqlx::query_as::<_, DbSubject>(&format!(
        "SELECT {} FROM subjects ORDER BY created_at DESC, rowid DESC",
        SUBJECT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Subject::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_subject(pool: &Pool<Sqlite>, id: &str) -> Result<Subject, AppError> {
    info!("Fetching subject by ID");
    let row = sqlx::query_as::<_, DbSubject>(&format!(
        "SELECT {} FROM subjects WHERE id = ?",
        SUBJECT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Subject::from).ok_or_else(|| {
        AppError::NotFound(format!("Subject with id {} not found in database", id))
    })
}

#[instrument(skip(pool))]
pub async fn create_subject(pool: &Pool<Sqlite>, subject: &NewSubject) -> Result<Subject, AppError> {
    info!("Creating subject");
    let teacher_name = resolve_teacher_name(
        pool,
        subject.assigned_teacher_id.as_deref(),
        UNASSIGNED_TEACHER,
    )
    .await?;
    let id = new_id();

    sqlx::query(
        "INSERT INTO subjects
         (id, subject_name, subject_code, applicable_grade_levels, assigned_teacher_id, assigned_teacher_name, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&subject.subject_name)
    .bind(&subject.subject_code)
    .bind(&subject.applicable_grade_levels)
    .bind(
        subject
            .assigned_teacher_id
            .as_deref()
            .filter(|t| !t.trim().is_empty()),
    )
    .bind(teacher_name)
    .bind(now())
    .execute(pool)
    .await?;

    get_subject(pool, &id).await
}

#[instrument(skip(pool))]
pub async fn update_subject(
    pool: &Pool<Sqlite>,
    id: &str,
    patch: &SubjectPatch,
) -> Result<Subject, AppError> {
    info!("Updating subject");
    let teacher_name = match patch.assigned_teacher_id.as_deref() {
        Some(teacher_id) => {
            Some(resolve_teacher_name(pool, Some(teacher_id), UNASSIGNED_TEACHER).await?)
        }
        None => None,
    };

    let res = sqlx::query(
        "UPDATE subjects SET
            subject_name = COALESCE(?, subject_name),
            subject_code = COALESCE(?, subject_code),
            applicable_grade_levels = COALESCE(?, applicable_grade_levels),
            assigned_teacher_id = COALESCE(?, assigned_teacher_id),
            assigned_teacher_name = COALESCE(?, assigned_teacher_name)
         WHERE id = ?",
    )
    .bind(&patch.subject_name)
    .bind(&patch.subject_code)
    .bind(&patch.applicable_grade_levels)
    .bind(&patch.assigned_teacher_id)
    .bind(teacher_name)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_found(res.rows_affected(), "Subject", id)?;
    get_subject(pool, id).await
}

#[instrument(skip(pool))]
pub async fn delete_subject(pool: &Pool<Sqlite>, id: &str) -> Result<(), AppError> {
    info!("Deleting subject");
    let res = sqlx::query("DELETE FROM subjects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    ensure_found(res.rows_affected(), "Subject", id)
}
