//! Record store contracts
//!
//! The resolver reads access-control state through these narrow lookups and
//! never touches storage directly. Every lookup distinguishes three outcomes:
//!
//! - `Ok(Some(_))`: the record exists
//! - `Ok(None)`: no such record; the source grants nothing
//! - `Err(_)`: the store could not answer; access cannot be determined
//!
//! Two adapters are provided: [`InMemoryDirectory`] (snapshot file or
//! programmatic fixtures) and [`RestDirectory`] (JSON record service).

pub mod memory;
pub mod rest;
pub mod types;

pub use memory::{DirectorySnapshot, InMemoryDirectory};
pub use rest::RestDirectory;
pub use types::{
    ActiveEnrollment, CategoryId, CategoryRecord, CategoryRoleGrant, CategoryRoleRecord, CourseId,
    CourseRecord, EnrollmentRecord, EnrollmentStatus, GlobalPrivilege, UserId, UserRecord,
};

use crate::config::{DirectoryBackend, DirectoryConfig};
use crate::error::{ConfigError, DirectoryResult};
use crate::identity::Principal;
// async_trait required for dyn-compatibility with Arc<dyn Directory>
use async_trait::async_trait;
use std::sync::Arc;

/// Whether a user holds system-wide administrative privilege
#[async_trait]
pub trait GlobalPrivilegeLookup: Send + Sync {
    async fn find_global_privilege(&self, user: &UserId)
    -> DirectoryResult<Option<GlobalPrivilege>>;
}

/// The active enrollment of a user in a course
#[async_trait]
pub trait EnrollmentLookup: Send + Sync {
    /// Inactive enrollments (suspended, pending, ...) must be reported as `None`.
    async fn find_active_enrollment(
        &self,
        user: &UserId,
        course: &CourseId,
    ) -> DirectoryResult<Option<ActiveEnrollment>>;
}

/// The role a user holds directly on one category (not inherited)
#[async_trait]
pub trait CategoryRoleLookup: Send + Sync {
    async fn find_category_role(
        &self,
        user: &UserId,
        category: &CategoryId,
    ) -> DirectoryResult<Option<CategoryRoleGrant>>;
}

/// Parent links of the category forest and course placement
#[async_trait]
pub trait CategoryTree: Send + Sync {
    async fn get_category_parent(&self, category: &CategoryId)
    -> DirectoryResult<Option<CategoryId>>;

    async fn get_course_category(&self, course: &CourseId) -> DirectoryResult<Option<CategoryId>>;
}

/// Principal records, used when substituting identities
#[async_trait]
pub trait PrincipalLookup: Send + Sync {
    async fn find_principal(&self, user: &UserId) -> DirectoryResult<Option<Principal>>;
}

/// Everything the resolver and the identity layer need from a store
pub trait Directory:
    GlobalPrivilegeLookup + EnrollmentLookup + CategoryRoleLookup + CategoryTree + PrincipalLookup
{
}

impl<T> Directory for T where
    T: GlobalPrivilegeLookup
        + EnrollmentLookup
        + CategoryRoleLookup
        + CategoryTree
        + PrincipalLookup
{
}

/// Shared handle to a directory
pub type SharedDirectory = Arc<dyn Directory>;

/// Create a directory from configuration
pub fn create_directory(config: &DirectoryConfig) -> Result<SharedDirectory, ConfigError> {
    match config.backend {
        DirectoryBackend::Memory => {
            let path = config.snapshot.as_deref().ok_or_else(|| ConfigError::Missing {
                field: "directory.snapshot".to_string(),
            })?;
            let expanded = shellexpand::tilde(path);
            let directory = InMemoryDirectory::from_file(expanded.as_ref())
                .map_err(|e| ConfigError::Load(e.to_string()))?;
            Ok(Arc::new(directory))
        }
        DirectoryBackend::Rest => {
            let directory =
                RestDirectory::new(config).map_err(|e| ConfigError::Load(e.to_string()))?;
            Ok(Arc::new(directory))
        }
    }
}
