use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, User};
use crate::db::{create_fee, delete_fee, get_fee, list_fees, update_fee};
use crate::live::{ChangeBus, ChangeKind, Collection};
use crate::models::{Fee, FeePatch, FeeStatus, NewFee};
use crate::validation::{ApiResult, JsonValidateExt, blank_as_none};

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct FeeRequest {
    #[validate(length(min = 1, message = "Select a student"))]
    student_id: String,
    #[validate(length(min = 1, message = "Fee title is required"))]
    fee_title: String,
    #[validate(range(exclusive_min = 0.0, message = "Amount due must be greater than zero"))]
    amount_due: f64,
    #[validate(range(min = 0.0, message = "Amount paid cannot be negative"))]
    amount_paid: Option<f64>,
    #[validate(length(min = 1, message = "Due date is required"))]
    due_date: String,
    #[validate(required(message = "Status is required"))]
    status: Option<FeeStatus>,
    #[serde(deserialize_with = "blank_as_none")]
    notes: Option<String>,
}

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct FeeUpdateRequest {
    #[validate(length(min = 1, message = "Fee title cannot be blank"))]
    fee_title: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "Amount due must be greater than zero"))]
    amount_due: Option<f64>,
    #[validate(range(min = 0.0, message = "Amount paid cannot be negative"))]
    amount_paid: Option<f64>,
    #[validate(length(min = 1, message = "Due date cannot be blank"))]
    due_date: Option<String>,
    status: Option<FeeStatus>,
    #[serde(deserialize_with = "blank_as_none")]
    notes: Option<String>,
}

impl From<FeeUpdateRequest> for FeePatch {
    fn from(req: FeeUpdateRequest) -> Self {
        Self {
            fee_title: req.fee_title.map(|v| v.trim().to_string()),
            amount_due: req.amount_due,
            amount_paid: req.amount_paid,
            due_date: req.due_date.map(|v| v.trim().to_string()),
            status: req.status,
            notes: req.notes,
        }
    }
}

#[get("/fees")]
pub async fn api_list_fees(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Vec<Fee>>> {
    user.require_permission(Permission::ManageFees)?;
    Ok(Json(list_fees(db).await?))
}

#[get("/fees/<id>")]
pub async fn api_get_fee(id: &str, user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Fee>> {
    user.require_permission(Permission::ManageFees)?;
    Ok(Json(get_fee(db, id).await?))
}

#[post("/fees", data = "<fee>")]
pub async fn api_create_fee(
    fee: Json<FeeRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<(Status, Json<Fee>)> {
    user.require_permission(Permission::ManageFees)?;
    let validated = fee.validate_custom()?;

    let new_fee = NewFee {
        student_id: validated.student_id.trim().to_string(),
        fee_title: validated.fee_title.trim().to_string(),
        amount_due: validated.amount_due,
        amount_paid: validated.amount_paid,
        due_date: validated.due_date.trim().to_string(),
        status: validated.status.unwrap_or(FeeStatus::Pending),
        notes: validated.notes,
    };

    let created = create_fee(db, &new_fee).await?;
    bus.publish(Collection::Fees, ChangeKind::Created, &created.id);

    Ok((Status::Created, Json(created)))
}

#[put("/fees/<id>", data = "<fee>")]
pub async fn api_update_fee(
    id: &str,
    fee: Json<FeeUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Json<Fee>> {
    user.require_permission(Permission::ManageFees)?;
    let validated = fee.validate_custom()?;

    let updated = update_fee(db, id, &FeePatch::from(validated)).await?;
    bus.publish(Collection::Fees, ChangeKind::Updated, id);

    Ok(Json(updated))
}

#[delete("/fees/<id>")]
pub async fn api_delete_fee(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Status> {
    user.require_permission(Permission::ManageFees)?;

    delete_fee(db, id).await?;
    bus.publish(Collection::Fees, ChangeKind::Deleted, id);

    Ok(Status::NoContent)
}
