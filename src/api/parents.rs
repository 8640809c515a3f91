use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, Role, User};
use crate::db::{create_user, find_students_by_parent_email};
use crate::error::AppError;
use crate::models::Student;
use crate::validation::ApiResult;

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct ParentAccountRequest {
    #[validate(email(message = "Enter a valid parent email address"))]
    email: String,
    #[validate(length(min = 6, message = "Temporary password must be at least 6 characters"))]
    password: String,
}

/// Outcome of a provisioning call. `code` names the failure class.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ProvisionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ProvisionResponse {
    fn failure(status: Status, code: &str, message: String) -> Custom<Json<Self>> {
        Custom(
            status,
            Json(Self {
                success: false,
                message,
                uid: None,
                code: Some(code.to_string()),
            }),
        )
    }
}

/// Creates a parent sign-in. The account is linked to children only through
/// matching `parent_email` on student records.
#[post("/admin/parents", data = "<request>")]
pub async fn api_create_parent(
    request: Json<ParentAccountRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Custom<Json<ProvisionResponse>>> {
    user.require_permission(Permission::ManageParents)?;
    let request = request.into_inner();

    if let Err(errors) = request.validate() {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .filter_map(|err| err.message.as_ref().map(|m| m.to_string()))
            .next()
            .unwrap_or_else(|| "Email and password are required".to_string());
        return Ok(ProvisionResponse::failure(
            Status::UnprocessableEntity,
            "invalid-argument",
            message,
        ));
    }

    let email = request.email.trim();
    match create_user(db, email, &request.password, Role::Parent, None).await {
        Ok(uid) => {
            tracing::info!(parent_email = %email, created_by = %user.email, "Parent account created");
            Ok(Custom(
                Status::Created,
                Json(ProvisionResponse {
                    success: true,
                    message: format!("Account for {} created", email),
                    uid: Some(uid),
                    code: None,
                }),
            ))
        }
        Err(AppError::Conflict(message)) => {
            tracing::warn!(parent_email = %email, "Parent account already exists");
            Ok(ProvisionResponse::failure(
                Status::Conflict,
                "already-exists",
                message,
            ))
        }
        Err(err) => {
            err.log_and_record("Parent account provisioning");
            Ok(ProvisionResponse::failure(
                Status::InternalServerError,
                "internal",
                "Could not create the parent account".to_string(),
            ))
        }
    }
}

/// Children linked to the signed-in parent by email.
#[get("/parent/students")]
pub async fn api_parent_students(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<Student>>> {
    user.require_permission(Permission::ViewOwnChildren)?;
    Ok(Json(find_students_by_parent_email(db, &user.email).await?))
}
