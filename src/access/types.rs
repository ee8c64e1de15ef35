//! Access decision types

use crate::roles::{CategoryRole, CourseRole, Role};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which resolution step produced a grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessSource {
    /// System-wide administrative privilege
    GlobalAdmin,
    /// Active enrollment in the course
    Enrollment,
    /// Role inherited from the course's category chain
    Category,
}

impl AccessSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AccessSource::GlobalAdmin => "global-admin",
            AccessSource::Enrollment => "enrollment",
            AccessSource::Category => "category",
        }
    }
}

impl fmt::Display for AccessSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of resolving a principal's access to a course
///
/// Computed fresh on every check. Never cache it or hand it out as a
/// capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessResult {
    pub has_access: bool,
    pub role: Option<Role>,
    pub source: Option<AccessSource>,
}

impl AccessResult {
    /// Global administrators act as course managers everywhere
    pub const fn global_admin() -> Self {
        Self {
            has_access: true,
            role: Some(Role::Course(CourseRole::Manager)),
            source: Some(AccessSource::GlobalAdmin),
        }
    }

    pub const fn enrollment(role: CourseRole) -> Self {
        Self {
            has_access: true,
            role: Some(Role::Course(role)),
            source: Some(AccessSource::Enrollment),
        }
    }

    pub const fn category(role: CategoryRole) -> Self {
        Self {
            has_access: true,
            role: Some(Role::Category(role)),
            source: Some(AccessSource::Category),
        }
    }

    /// No source grants anything
    pub const fn none() -> Self {
        Self {
            has_access: false,
            role: None,
            source: None,
        }
    }

    /// Whether access was granted with a role at or above `required`
    pub fn satisfies(&self, required: Role) -> bool {
        self.has_access && self.role.is_some_and(|role| role.satisfies(&required))
    }
}
