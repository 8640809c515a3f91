use rocket::State;
use rocket::serde::json::Json;
use sqlx::{Pool, Sqlite};

use crate::auth::{Permission, User};
use crate::db::{DashboardCounts, get_dashboard_counts};
use crate::validation::ApiResult;

#[get("/admin/dashboard")]
pub async fn api_dashboard(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<DashboardCounts>> {
    user.require_permission(Permission::ViewDashboard)?;
    Ok(Json(get_dashboard_counts(db).await?))
}
