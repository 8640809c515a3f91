mod academics;
mod attendance;
mod auth;
mod content;
mod dashboard;
mod fees;
mod notices;
mod parents;
mod reports;
mod results;
mod students;

pub use academics::*;
pub use attendance::*;
pub use auth::*;
pub use content::*;
pub use dashboard::*;
pub use fees::*;
pub use notices::*;
pub use parents::*;
pub use reports::*;
pub use results::*;
pub use students::*;

use sqlx::{Pool, Sqlite};

use crate::auth::{Permission, User};
use crate::db::get_student;
use crate::error::AppError;
use crate::models::Student;

/// Gate for per-student views. Staff with `ViewAllStudents` pass without a
/// lookup, so records of a deleted student stay reachable; everyone else
/// must be the linked parent.
pub(crate) async fn authorize_student_view(
    pool: &Pool<Sqlite>,
    user: &User,
    student_id: &str,
) -> Result<Option<Student>, AppError> {
    if user.has_permission(Permission::ViewAllStudents) {
        return Ok(None);
    }

    let student = match get_student(pool, student_id).await {
        Ok(student) => student,
        // Parents get the same answer for "missing" and "not yours".
        Err(AppError::NotFound(_)) => {
            return Err(AppError::Authorization(
                "This student is not linked to your account".to_string(),
            ));
        }
        Err(err) => return Err(err),
    };

    user.require_student_access(&student)?;
    Ok(Some(student))
}
