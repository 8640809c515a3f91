use once_cell::sync::Lazy;
use rocket::serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewOwnProfile,
    EditOwnProfile,
    ViewOwnChildren,
    ViewPublishedNotices,

    ViewAllStudents,
    ManageStudents,
    ManageStaff,
    ManageAcademicRecords,
    ManageFees,
    ManageNotices,
    ManageWebsiteContent,
    ManageParents,
    ViewDashboard,
    SubscribeLiveQueries,
}

/// Role stored on the user record. Never derived from the email address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Parent,
    Admin,
}

static PARENT_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewOwnProfile);
    permissions.insert(Permission::EditOwnProfile);
    permissions.insert(Permission::ViewOwnChildren);
    permissions.insert(Permission::ViewPublishedNotices);

    permissions
});

static ADMIN_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewOwnProfile);
    permissions.insert(Permission::EditOwnProfile);
    permissions.insert(Permission::ViewPublishedNotices);

    permissions.insert(Permission::ViewAllStudents);
    permissions.insert(Permission::ManageStudents);
    permissions.insert(Permission::ManageStaff);
    permissions.insert(Permission::ManageAcademicRecords);
    permissions.insert(Permission::ManageFees);
    permissions.insert(Permission::ManageNotices);
    permissions.insert(Permission::ManageWebsiteContent);
    permissions.insert(Permission::ManageParents);
    permissions.insert(Permission::ViewDashboard);
    permissions.insert(Permission::SubscribeLiveQueries);

    permissions
});

impl Role {
    pub fn permissions(&self) -> &'static HashSet<Permission> {
        match self {
            Role::Parent => &PARENT_PERMISSIONS,
            Role::Admin => &ADMIN_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Parent => "parent",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "parent" => Ok(Role::Parent),
            "admin" => Ok(Role::Admin),
            _ => Err(AppError::Internal(format!("Unknown role: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_cannot_manage_records() {
        assert!(Role::Parent.has_permission(Permission::ViewOwnChildren));
        assert!(!Role::Parent.has_permission(Permission::ManageStudents));
        assert!(!Role::Parent.has_permission(Permission::ViewAllStudents));
    }

    #[test]
    fn admin_manages_everything_but_children_view() {
        assert!(Role::Admin.has_permission(Permission::ManageParents));
        assert!(Role::Admin.has_permission(Permission::ManageFees));
        assert!(!Role::Admin.has_permission(Permission::ViewOwnChildren));
    }

    #[test]
    fn role_is_parsed_from_stored_value_only() {
        assert_eq!(Role::parse("admin").unwrap(), Role::Admin);
        assert_eq!(Role::parse("parent").unwrap(), Role::Parent);
        assert!(Role::parse("admin@school.org").is_err());
    }
}
