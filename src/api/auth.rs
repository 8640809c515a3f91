use chrono::Utc;
use rocket::State;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, SESSION_COOKIE, User, UserSession};
use crate::db::{
    authenticate_user, create_user_session, invalidate_session, update_user_display_name,
    update_user_password,
};
use crate::env::AppConfig;
use crate::validation::{ApiResult, JsonValidateExt, ValidationResponse};

const ROLE_COOKIE: &str = "user_role";

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(email(message = "Enter a valid email address"))]
    email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: Option<UserData>,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserData {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role.to_string(),
        }
    }
}

#[post("/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ApiResult<Json<LoginResponse>> {
    let validated = login.validate_custom()?;

    match authenticate_user(db, &validated.email, &validated.password).await? {
        Some(user) => {
            let token = UserSession::generate_token();
            let expires_at = Utc::now() + chrono::Duration::hours(config.session_hours);

            create_user_session(db, &user.id, &token, expires_at.naive_utc()).await?;

            let max_age = rocket::time::Duration::hours(config.session_hours);
            cookies.add_private(
                Cookie::build((SESSION_COOKIE, token))
                    .same_site(SameSite::Lax)
                    .http_only(true)
                    .max_age(max_age),
            );
            cookies.add_private(
                Cookie::build((ROLE_COOKIE, user.role.to_string()))
                    .same_site(SameSite::Lax)
                    .max_age(max_age),
            );

            tracing::info!(email = %user.email, role = %user.role, "User logged in");

            Ok(Json(LoginResponse {
                success: true,
                user: Some(UserData::from(user)),
                error: None,
            }))
        }
        None => {
            tracing::warn!(email = %validated.email, "Failed login attempt");
            Ok(Json(LoginResponse {
                success: false,
                user: None,
                error: Some("Invalid email or password".to_string()),
            }))
        }
    }
}

#[get("/me")]
pub async fn api_me(user: User) -> Json<UserData> {
    Json(UserData::from(user))
}

#[get("/me", rank = 2)]
pub async fn api_me_unauthorized() -> Status {
    Status::Unauthorized
}

#[post("/logout")]
pub async fn api_logout(cookies: &CookieJar<'_>, db: &State<Pool<Sqlite>>) -> Status {
    let token = cookies
        .get_private(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        if let Err(err) = invalidate_session(db, &token).await {
            err.log_and_record("Logout");
        }
    }

    cookies.remove_private(Cookie::build(SESSION_COOKIE));
    cookies.remove_private(Cookie::build(ROLE_COOKIE));

    Status::NoContent
}

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct PasswordChangeRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    current_password: String,
    #[validate(length(min = 8, message = "New password must be at least 8 characters"))]
    new_password: String,
}

#[post("/change-password", data = "<password>")]
pub async fn api_change_password(
    password: Json<PasswordChangeRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Status> {
    user.require_permission(Permission::EditOwnProfile)?;
    let validated = password.validate_custom()?;

    match authenticate_user(db, &user.email, &validated.current_password).await? {
        Some(_) => {
            update_user_password(db, &user.id, &validated.new_password).await?;
            Ok(Status::Ok)
        }
        _ => Err(Custom(
            Status::Unauthorized,
            Json(ValidationResponse::with_error(
                "current_password",
                "Current password is incorrect",
            )),
        )),
    }
}

#[derive(Deserialize, Validate, Default)]
#[serde(default)]
pub struct ProfileUpdateRequest {
    #[validate(length(min = 1, message = "Display name is required"))]
    display_name: String,
}

#[put("/profile", data = "<profile>")]
pub async fn api_update_profile(
    profile: Json<ProfileUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Status> {
    user.require_permission(Permission::EditOwnProfile)?;
    let validated = profile.validate_custom()?;

    update_user_display_name(db, &user.id, validated.display_name.trim()).await?;

    Ok(Status::Ok)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[get("/health")]
pub fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        version: env!("CARGO_PKG_VERSION"),
    })
}
