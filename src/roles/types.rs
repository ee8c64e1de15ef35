//! Role vocabularies
//!
//! Course roles come from direct enrollment, category roles from
//! assignments on a category. Both share one priority scale so a result from
//! either source can be compared with the other.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role granted by enrollment in a specific course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseRole {
    Student,
    Ta,
    Teacher,
    Manager,
}

impl CourseRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CourseRole::Student => "student",
            CourseRole::Ta => "ta",
            CourseRole::Teacher => "teacher",
            CourseRole::Manager => "manager",
        }
    }

    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(CourseRole::Student),
            "ta" => Some(CourseRole::Ta),
            "teacher" => Some(CourseRole::Teacher),
            "manager" => Some(CourseRole::Manager),
            _ => None,
        }
    }

    pub fn all() -> &'static [CourseRole] {
        &[
            CourseRole::Student,
            CourseRole::Ta,
            CourseRole::Teacher,
            CourseRole::Manager,
        ]
    }
}

impl fmt::Display for CourseRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role assigned on a category, inherited by every course beneath it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryRole {
    CategoryAdmin,
    CategoryCoordinator,
    CategoryReviewer,
}

impl CategoryRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CategoryRole::CategoryAdmin => "category-admin",
            CategoryRole::CategoryCoordinator => "category-coordinator",
            CategoryRole::CategoryReviewer => "category-reviewer",
        }
    }

    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "category-admin" => Some(CategoryRole::CategoryAdmin),
            "category-coordinator" => Some(CategoryRole::CategoryCoordinator),
            "category-reviewer" => Some(CategoryRole::CategoryReviewer),
            _ => None,
        }
    }

    pub fn all() -> &'static [CategoryRole] {
        &[
            CategoryRole::CategoryAdmin,
            CategoryRole::CategoryCoordinator,
            CategoryRole::CategoryReviewer,
        ]
    }
}

impl fmt::Display for CategoryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Any role an access decision can carry
///
/// Serialized as the bare role identifier (`"teacher"`, `"category-admin"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Role {
    Course(CourseRole),
    Category(CategoryRole),
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Course(role) => role.as_str(),
            Role::Category(role) => role.as_str(),
        }
    }

    /// Parse a role identifier from either vocabulary
    pub fn try_parse(s: &str) -> Option<Self> {
        CourseRole::try_parse(s)
            .map(Role::Course)
            .or_else(|| CategoryRole::try_parse(s).map(Role::Category))
    }

    /// Every defined role, both vocabularies
    pub fn all() -> impl Iterator<Item = Role> {
        CourseRole::all()
            .iter()
            .copied()
            .map(Role::Course)
            .chain(CategoryRole::all().iter().copied().map(Role::Category))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<CourseRole> for Role {
    fn from(role: CourseRole) -> Self {
        Role::Course(role)
    }
}

impl From<CategoryRole> for Role {
    fn from(role: CategoryRole) -> Self {
        Role::Category(role)
    }
}
