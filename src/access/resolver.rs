//! Course access resolver
//!
//! Resolves a principal's access to a course with the following precedence
//! (first match wins):
//! 1. Global privilege: acts as `manager`
//! 2. Active enrollment in the course
//! 3. Highest role held anywhere on the course's category chain
//! 4. No access
//!
//! Lookups that find nothing fall through to the next step. Lookups that
//! fail abort the resolution with the directory error.

use crate::access::types::AccessResult;
use crate::config::AccessConfig;
use crate::directory::{
    CategoryId, CategoryRoleLookup, CategoryTree, CourseId, EnrollmentLookup, GlobalPrivilegeLookup,
    SharedDirectory, UserId,
};
use crate::error::{AccessDeniedError, AccessError, DirectoryResult};
use crate::identity::IdentityContext;
use crate::roles::{CategoryRole, Role, highest};
use std::collections::HashSet;
use tracing::{debug, instrument, trace, warn};

/// Course access resolver
///
/// Holds no per-request state; share one instance behind an `Arc`.
pub struct AccessResolver {
    directory: SharedDirectory,
    max_category_depth: usize,
}

impl AccessResolver {
    /// Create a new resolver over a directory
    pub fn new(directory: SharedDirectory, config: &AccessConfig) -> Self {
        Self {
            directory,
            max_category_depth: config.max_category_depth.max(1),
        }
    }

    pub fn with_defaults(directory: SharedDirectory) -> Self {
        Self::new(directory, &AccessConfig::default())
    }

    /// The directory this resolver reads from
    pub fn directory(&self) -> &SharedDirectory {
        &self.directory
    }

    /// Resolve which role, if any, `user` holds on `course`
    #[instrument(skip_all, fields(user = %user, course = %course))]
    pub async fn resolve_access(
        &self,
        user: &UserId,
        course: &CourseId,
    ) -> DirectoryResult<AccessResult> {
        let result = self.evaluate(user, course).await?;

        debug!(
            has_access = result.has_access,
            role = ?result.role,
            source = ?result.source,
            "Resolved course access"
        );

        Ok(result)
    }

    /// Resolve for whoever the request is acting as
    pub async fn resolve_for(
        &self,
        identity: &IdentityContext,
        course: &CourseId,
    ) -> DirectoryResult<AccessResult> {
        self.resolve_access(identity.effective_id(), course).await
    }

    /// Resolve for the effective principal and demand at least `minimum`
    pub async fn require(
        &self,
        identity: &IdentityContext,
        course: &CourseId,
        minimum: Role,
    ) -> Result<AccessResult, AccessError> {
        let user = identity.effective_id();
        let result = self.resolve_access(user, course).await?;

        match result.role {
            _ if result.satisfies(minimum) => Ok(result),
            Some(held) if result.has_access => Err(AccessDeniedError::insufficient_role(
                user.clone(),
                course.clone(),
                held.as_str(),
                minimum.as_str(),
            )
            .into()),
            _ => Err(AccessDeniedError::no_access(user.clone(), course.clone()).into()),
        }
    }

    async fn evaluate(&self, user: &UserId, course: &CourseId) -> DirectoryResult<AccessResult> {
        // Independent lookups; their results are still consumed in order.
        let (privilege, enrollment) = futures::join!(
            self.directory.find_global_privilege(user),
            self.directory.find_active_enrollment(user, course),
        );

        // 1. Global privilege
        if privilege?.is_some_and(|p| p.is_privileged) {
            trace!("Matched global privilege");
            return Ok(AccessResult::global_admin());
        }

        // 2. Enrollment
        if let Some(enrollment) = enrollment? {
            trace!(role = %enrollment.role, "Matched active enrollment");
            return Ok(AccessResult::enrollment(enrollment.role));
        }

        // 3. Category inheritance
        if let Some(category) = self.directory.get_course_category(course).await?
            && let Some(role) = self.inherited_role(user, category).await?
        {
            trace!(role = %role, "Matched inherited category role");
            return Ok(AccessResult::category(role));
        }

        // 4. Nothing grants access
        trace!("No source grants access");
        Ok(AccessResult::none())
    }

    /// Walk from `start` up through its ancestors, collecting every role the
    /// user holds on the way, and keep the strongest.
    ///
    /// Stops at the root, at the first category seen twice, or after
    /// `max_category_depth` categories.
    async fn inherited_role(
        &self,
        user: &UserId,
        start: CategoryId,
    ) -> DirectoryResult<Option<CategoryRole>> {
        let mut visited = HashSet::new();
        let mut found = Vec::new();
        let mut next = Some(start);

        while let Some(category) = next {
            if visited.contains(&category) {
                warn!(category = %category, "Category cycle detected, ending inheritance walk");
                break;
            }

            if visited.len() >= self.max_category_depth {
                warn!(
                    category = %category,
                    limit = self.max_category_depth,
                    "Category depth limit reached, ending inheritance walk"
                );
                break;
            }

            if let Some(grant) = self.directory.find_category_role(user, &category).await? {
                trace!(category = %category, role = %grant.role, "Found category role");
                found.push(grant.role);
            }

            next = self.directory.get_category_parent(&category).await?;
            visited.insert(category);
        }

        Ok(highest(found))
    }
}
