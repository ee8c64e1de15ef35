//! Identifier and record types exchanged with the record store.

use crate::identity::Principal;
use crate::roles::{CategoryRole, CourseRole};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identity of a user account
    UserId
);
string_id!(
    /// Identity of a course
    CourseId
);
string_id!(
    /// Identity of a category node
    CategoryId
);

/// Answer of the global privilege lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalPrivilege {
    pub is_privileged: bool,
}

/// Answer of the enrollment lookup. Only active enrollments are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveEnrollment {
    pub role: CourseRole,
}

/// Answer of the category role lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRoleGrant {
    pub role: CategoryRole,
}

/// Lifecycle state of an enrollment
///
/// Anything other than `active` is inert for access decisions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnrollmentStatus {
    Active,
    Suspended,
    Pending,
    Other(String),
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Suspended => "suspended",
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Other(s) => s,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, EnrollmentStatus::Active)
    }
}

impl From<String> for EnrollmentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "active" => EnrollmentStatus::Active,
            "suspended" => EnrollmentStatus::Suspended,
            "pending" => EnrollmentStatus::Pending,
            _ => EnrollmentStatus::Other(s),
        }
    }
}

impl From<EnrollmentStatus> for String {
    fn from(status: EnrollmentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A course and the category it is filed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: CourseId,
    #[serde(default)]
    pub category: Option<CategoryId>,
}

/// A category node and its parent link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    #[serde(default)]
    pub parent: Option<CategoryId>,
}

/// An enrollment of a user in a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub user: UserId,
    pub course: CourseId,
    pub role: CourseRole,
    #[serde(default = "default_status")]
    pub status: EnrollmentStatus,
}

fn default_status() -> EnrollmentStatus {
    EnrollmentStatus::Active
}

/// A role assignment on a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRoleRecord {
    pub user: UserId,
    pub category: CategoryId,
    pub role: CategoryRole,
}

/// A user account as stored, which is exactly a [`Principal`]
pub type UserRecord = Principal;
