//! In-memory directory
//!
//! Holds a complete snapshot of access-control records. Built either from a
//! TOML snapshot file or programmatically:
//!
//! ```toml
//! [[users]]
//! id = "u1"
//! system_role = "admin"
//!
//! [[categories]]
//! id = "science"
//!
//! [[categories]]
//! id = "physics"
//! parent = "science"
//!
//! [[courses]]
//! id = "mechanics-101"
//! category = "physics"
//!
//! [[enrollments]]
//! user = "u2"
//! course = "mechanics-101"
//! role = "teacher"
//! status = "active"
//!
//! [[category_roles]]
//! user = "u3"
//! category = "science"
//! role = "category-coordinator"
//! ```

use crate::directory::types::{
    ActiveEnrollment, CategoryId, CategoryRecord, CategoryRoleGrant, CategoryRoleRecord, CourseId,
    CourseRecord, EnrollmentRecord, EnrollmentStatus, GlobalPrivilege, UserId, UserRecord,
};
use crate::directory::{
    CategoryRoleLookup, CategoryTree, EnrollmentLookup, GlobalPrivilegeLookup, PrincipalLookup,
};
use crate::error::{DirectoryError, DirectoryResult};
use crate::identity::Principal;
use crate::roles::{CategoryRole, CourseRole, highest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;
use tracing::debug;

/// Serialized form of a directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySnapshot {
    pub users: Vec<UserRecord>,
    pub courses: Vec<CourseRecord>,
    pub categories: Vec<CategoryRecord>,
    pub enrollments: Vec<EnrollmentRecord>,
    pub category_roles: Vec<CategoryRoleRecord>,
}

impl DirectorySnapshot {
    /// Parse a TOML snapshot. Unknown role identifiers are rejected as malformed.
    pub fn from_toml_str(toml_str: &str) -> DirectoryResult<Self> {
        toml::from_str(toml_str).map_err(|e| DirectoryError::malformed("snapshot", e.to_string()))
    }
}

/// Directory backed by in-process maps
///
/// Immutable once built, so it can be shared across requests without locking.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    principals: HashMap<UserId, Principal>,
    course_categories: HashMap<CourseId, Option<CategoryId>>,
    category_parents: HashMap<CategoryId, Option<CategoryId>>,
    enrollments: HashMap<(UserId, CourseId), Vec<(CourseRole, EnrollmentStatus)>>,
    category_roles: HashMap<(UserId, CategoryId), CategoryRole>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a snapshot, rejecting duplicate records
    pub fn from_snapshot(snapshot: DirectorySnapshot) -> DirectoryResult<Self> {
        let mut directory = Self::new();

        for user in snapshot.users {
            match directory.principals.entry(user.id.clone()) {
                Entry::Occupied(_) => {
                    return Err(DirectoryError::malformed(
                        "user",
                        format!("duplicate user id '{}'", user.id),
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(user);
                }
            }
        }

        for course in snapshot.courses {
            match directory.course_categories.entry(course.id.clone()) {
                Entry::Occupied(_) => {
                    return Err(DirectoryError::malformed(
                        "course",
                        format!("duplicate course id '{}'", course.id),
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(course.category);
                }
            }
        }

        for category in snapshot.categories {
            match directory.category_parents.entry(category.id.clone()) {
                Entry::Occupied(_) => {
                    return Err(DirectoryError::malformed(
                        "category",
                        format!("duplicate category id '{}'", category.id),
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(category.parent);
                }
            }
        }

        for grant in snapshot.category_roles {
            match directory
                .category_roles
                .entry((grant.user.clone(), grant.category.clone()))
            {
                Entry::Occupied(_) => {
                    return Err(DirectoryError::malformed(
                        "category_role",
                        format!(
                            "duplicate assignment for user '{}' on category '{}'",
                            grant.user, grant.category
                        ),
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(grant.role);
                }
            }
        }

        for enrollment in snapshot.enrollments {
            directory = directory.with_enrollment(
                enrollment.user,
                enrollment.course,
                enrollment.role,
                enrollment.status,
            );
        }

        debug!(
            users = directory.principals.len(),
            courses = directory.course_categories.len(),
            categories = directory.category_parents.len(),
            category_roles = directory.category_roles.len(),
            "Loaded directory snapshot"
        );

        Ok(directory)
    }

    pub fn from_toml_str(toml_str: &str) -> DirectoryResult<Self> {
        Self::from_snapshot(DirectorySnapshot::from_toml_str(toml_str)?)
    }

    /// Load a snapshot file
    pub fn from_file(path: impl AsRef<Path>) -> DirectoryResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DirectoryError::Unavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principals.insert(principal.id.clone(), principal);
        self
    }

    /// Add a course filed under `category`
    pub fn with_course(
        mut self,
        course: impl Into<CourseId>,
        category: impl Into<CategoryId>,
    ) -> Self {
        self.course_categories
            .insert(course.into(), Some(category.into()));
        self
    }

    /// Add a course that belongs to no category
    pub fn with_uncategorized_course(mut self, course: impl Into<CourseId>) -> Self {
        self.course_categories.insert(course.into(), None);
        self
    }

    /// Add a category below `parent`
    pub fn with_category(
        mut self,
        category: impl Into<CategoryId>,
        parent: impl Into<CategoryId>,
    ) -> Self {
        self.category_parents
            .insert(category.into(), Some(parent.into()));
        self
    }

    /// Add a category with no parent
    pub fn with_root_category(mut self, category: impl Into<CategoryId>) -> Self {
        self.category_parents.insert(category.into(), None);
        self
    }

    pub fn with_enrollment(
        mut self,
        user: impl Into<UserId>,
        course: impl Into<CourseId>,
        role: CourseRole,
        status: EnrollmentStatus,
    ) -> Self {
        self.enrollments
            .entry((user.into(), course.into()))
            .or_default()
            .push((role, status));
        self
    }

    pub fn with_category_role(
        mut self,
        user: impl Into<UserId>,
        category: impl Into<CategoryId>,
        role: CategoryRole,
    ) -> Self {
        self.category_roles
            .insert((user.into(), category.into()), role);
        self
    }
}

#[async_trait]
impl GlobalPrivilegeLookup for InMemoryDirectory {
    async fn find_global_privilege(
        &self,
        user: &UserId,
    ) -> DirectoryResult<Option<GlobalPrivilege>> {
        Ok(self.principals.get(user).map(|p| GlobalPrivilege {
            is_privileged: p.is_privileged(),
        }))
    }
}

#[async_trait]
impl EnrollmentLookup for InMemoryDirectory {
    /// With several active enrollments for the same pair, the highest role wins.
    async fn find_active_enrollment(
        &self,
        user: &UserId,
        course: &CourseId,
    ) -> DirectoryResult<Option<ActiveEnrollment>> {
        let Some(entries) = self.enrollments.get(&(user.clone(), course.clone())) else {
            return Ok(None);
        };

        let active = entries
            .iter()
            .filter(|(_, status)| status.is_active())
            .map(|(role, _)| *role);

        Ok(highest(active).map(|role| ActiveEnrollment { role }))
    }
}

#[async_trait]
impl CategoryRoleLookup for InMemoryDirectory {
    async fn find_category_role(
        &self,
        user: &UserId,
        category: &CategoryId,
    ) -> DirectoryResult<Option<CategoryRoleGrant>> {
        Ok(self
            .category_roles
            .get(&(user.clone(), category.clone()))
            .map(|role| CategoryRoleGrant { role: *role }))
    }
}

#[async_trait]
impl CategoryTree for InMemoryDirectory {
    async fn get_category_parent(
        &self,
        category: &CategoryId,
    ) -> DirectoryResult<Option<CategoryId>> {
        Ok(self.category_parents.get(category).cloned().flatten())
    }

    async fn get_course_category(&self, course: &CourseId) -> DirectoryResult<Option<CategoryId>> {
        Ok(self.course_categories.get(course).cloned().flatten())
    }
}

#[async_trait]
impl PrincipalLookup for InMemoryDirectory {
    async fn find_principal(&self, user: &UserId) -> DirectoryResult<Option<Principal>> {
        Ok(self.principals.get(user).cloned())
    }
}
