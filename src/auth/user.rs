use serde::Serialize;

use super::{Permission, Role};
use crate::error::AppError;
use crate::models::Student;

/// The signed-in account. Resolved from the session cookie by the request
/// guard in `auth::guard` and handed to every handler that needs it.
#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub display_name: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub display_name: Option<String>,
}

impl TryFrom<DbUser> for User {
    type Error = AppError;

    fn try_from(user: DbUser) -> Result<Self, Self::Error> {
        let email = user.email.unwrap_or_default();
        Ok(Self {
            id: user.id.unwrap_or_default(),
            role: Role::parse(&user.role.unwrap_or_default())?,
            display_name: user.display_name.unwrap_or_else(|| email.clone()),
            email,
        })
    }
}

impl User {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), AppError> {
        if self.role.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                email = %self.email,
                role = %self.role.as_str(),
                permission = ?permission,
                "Permission denied"
            );
            Err(AppError::Authorization(format!(
                "{} accounts cannot perform this action",
                self.role
            )))
        }
    }

    /// Whether this account is the parent linked to `student`. The link is
    /// the student's `parent_email`, compared without regard to case.
    pub fn is_parent_of(&self, student: &Student) -> bool {
        self.has_permission(Permission::ViewOwnChildren)
            && student
                .parent_email
                .as_deref()
                .map(|email| email.trim().eq_ignore_ascii_case(self.email.trim()))
                .unwrap_or(false)
    }

    pub fn require_student_access(&self, student: &Student) -> Result<(), AppError> {
        if self.has_permission(Permission::ViewAllStudents) || self.is_parent_of(student) {
            return Ok(());
        }

        tracing::warn!(
            email = %self.email,
            student_id = %student.id,
            "Attempt to view a student not linked to this account"
        );
        Err(AppError::Authorization(
            "This student is not linked to your account".to_string(),
        ))
    }
}
