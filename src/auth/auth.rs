use rocket::Request;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use sqlx::SqlitePool;

use crate::db::{get_session_by_token, get_user};
use crate::validation::ValidationResponse;

use super::User;

pub const SESSION_COOKIE: &str = "session_token";

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_span = tracing::info_span!("user_auth_guard");
        let _guard = auth_span.enter();

        let cookies = request.cookies();

        let token = cookies
            .get_private(SESSION_COOKIE)
            .map(|c| c.value().to_string());

        if let Some(token) = token {
            let db = match request.rocket().state::<SqlitePool>() {
                Some(pool) => pool,
                _ => {
                    tracing::error!("Database pool not found in managed state");
                    return Outcome::Error((Status::InternalServerError, ()));
                }
            };

            return match get_session_by_token(db, &token).await {
                Ok(session) => {
                    if !session.is_valid() {
                        tracing::warn!(session_id = session.id, "Session token expired");
                        return Outcome::Forward(Status::Unauthorized);
                    }

                    match get_user(db, &session.user_id).await {
                        Ok(user) => {
                            tracing::info!(email = %user.email, role = %user.role.as_str(), "User authenticated via session token");
                            Outcome::Success(user)
                        }
                        Err(err) => {
                            tracing::error!(user_id = %session.user_id, error = ?err, "Failed to fetch user for valid session");
                            Outcome::Forward(Status::Unauthorized)
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(error = ?err, "Invalid session token");
                    Outcome::Forward(Status::Unauthorized)
                }
            };
        }

        Outcome::Forward(Status::Unauthorized)
    }
}

#[catch(401)]
pub fn unauthorized_api(_req: &Request) -> Custom<Json<ValidationResponse>> {
    Custom(
        Status::Unauthorized,
        Json(ValidationResponse::with_error(
            "authentication",
            "Authentication required",
        )),
    )
}

#[catch(403)]
pub fn forbidden_api(_req: &Request) -> Custom<Json<ValidationResponse>> {
    tracing::warn!("Forbidden access attempt");
    Custom(
        Status::Forbidden,
        Json(ValidationResponse::with_error(
            "permission",
            "You don't have permission to perform this action",
        )),
    )
}

#[catch(400)]
pub fn bad_request_api(_req: &Request) -> Custom<Json<ValidationResponse>> {
    Custom(
        Status::BadRequest,
        Json(ValidationResponse::with_error("request", "Malformed request")),
    )
}

#[catch(404)]
pub fn not_found_api(req: &Request) -> Custom<Json<ValidationResponse>> {
    tracing::debug!(uri = %req.uri(), "No route matched");
    Custom(
        Status::NotFound,
        Json(ValidationResponse::with_error("resource", "Not found")),
    )
}

#[catch(422)]
pub fn unprocessable_api(_req: &Request) -> Custom<Json<ValidationResponse>> {
    Custom(
        Status::UnprocessableEntity,
        Json(ValidationResponse::with_error(
            "body",
            "Request body could not be parsed",
        )),
    )
}
