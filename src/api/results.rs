use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use validator::Validate;

use crate::auth::{Permission, User};
use crate::db::{create_results, delete_result, get_result, list_results, update_result};
use crate::live::{ChangeBus, ChangeKind, Collection};
use crate::models::{ResultEntry, ResultPatch, StudentResult};
use crate::validation::{ApiResult, JsonValidateExt, ValidationResponse};

#[derive(Deserialize, Serialize, Default, Clone)]
#[serde(default)]
pub struct ResultEntryRequest {
    subject_name: String,
    marks: String,
    comments: Option<String>,
}

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct ResultBatchRequest {
    #[validate(length(min = 1, message = "Select a student"))]
    student_id: String,
    #[validate(length(min = 1, message = "Term is required"))]
    term: String,
    #[validate(length(min = 1, message = "Add at least one subject result"))]
    entries: Vec<ResultEntryRequest>,
}

impl ResultBatchRequest {
    /// Per-entry checks, reported as `entries[i].field`. A whitespace-only
    /// term is rejected too; the stored label is otherwise kept verbatim.
    fn entries(&self) -> Result<Vec<ResultEntry>, ValidationResponse> {
        let mut errors: HashMap<String, Vec<String>> = HashMap::new();
        if self.term.trim().is_empty() {
            errors
                .entry("term".to_string())
                .or_default()
                .push("Term is required".to_string());
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.subject_name.trim().is_empty() {
                errors
                    .entry(format!("entries[{}].subject_name", i))
                    .or_default()
                    .push("Subject is required".to_string());
            }
            if entry.marks.trim().is_empty() {
                errors
                    .entry(format!("entries[{}].marks", i))
                    .or_default()
                    .push("Marks are required".to_string());
            }
        }

        if !errors.is_empty() {
            return Err(ValidationResponse::new(errors));
        }

        Ok(self
            .entries
            .iter()
            .map(|entry| ResultEntry {
                subject_name: entry.subject_name.trim().to_string(),
                marks: entry.marks.trim().to_string(),
                comments: entry
                    .comments
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect())
    }
}

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct ResultUpdateRequest {
    #[validate(length(min = 1, message = "Subject cannot be blank"))]
    subject_name: Option<String>,
    #[validate(length(min = 1, message = "Marks cannot be blank"))]
    marks: Option<String>,
    #[validate(length(min = 1, message = "Term cannot be blank"))]
    term: Option<String>,
    comments: Option<String>,
}

impl From<ResultUpdateRequest> for ResultPatch {
    fn from(req: ResultUpdateRequest) -> Self {
        Self {
            subject_name: req.subject_name.map(|v| v.trim().to_string()),
            marks: req.marks.map(|v| v.trim().to_string()),
            // Term labels group report cards by exact text, so they are kept verbatim.
            term: req.term,
            comments: req.comments.map(|v| v.trim().to_string()),
        }
    }
}

#[get("/results")]
pub async fn api_list_results(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<StudentResult>>> {
    user.require_permission(Permission::ManageAcademicRecords)?;
    Ok(Json(list_results(db).await?))
}

#[get("/results/<id>")]
pub async fn api_get_result(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<StudentResult>> {
    user.require_permission(Permission::ManageAcademicRecords)?;
    Ok(Json(get_result(db, id).await?))
}

/// One result row per entry, all for the same student and term.
#[post("/results", data = "<batch>")]
pub async fn api_create_results(
    batch: Json<ResultBatchRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<(Status, Json<Vec<StudentResult>>)> {
    user.require_permission(Permission::ManageAcademicRecords)?;
    let validated = batch.validate_custom()?;
    let entries = validated
        .entries()
        .map_err(|errors| Custom(Status::UnprocessableEntity, Json(errors)))?;

    let created = create_results(db, validated.student_id.trim(), &validated.term, &entries).await?;
    for result in &created {
        bus.publish(Collection::Results, ChangeKind::Created, &result.id);
    }

    Ok((Status::Created, Json(created)))
}

#[put("/results/<id>", data = "<result>")]
pub async fn api_update_result(
    id: &str,
    result: Json<ResultUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Json<StudentResult>> {
    user.require_permission(Permission::ManageAcademicRecords)?;
    let validated = result.validate_custom()?;
    if validated.term.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(Custom(
            Status::UnprocessableEntity,
            Json(ValidationResponse::with_error("term", "Term cannot be blank")),
        ));
    }

    let updated = update_result(db, id, &ResultPatch::from(validated)).await?;
    bus.publish(Collection::Results, ChangeKind::Updated, id);

    Ok(Json(updated))
}

#[delete("/results/<id>")]
pub async fn api_delete_result(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Status> {
    user.require_permission(Permission::ManageAcademicRecords)?;

    delete_result(db, id).await?;
    bus.publish(Collection::Results, ChangeKind::Deleted, id);

    Ok(Status::NoContent)
}
