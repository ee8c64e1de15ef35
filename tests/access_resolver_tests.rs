//! Access resolution integration tests
//!
//! Covers the precedence chain end to end:
//! - Global privilege short-circuits everything else
//! - Active enrollment beats inherited category roles
//! - The strongest role anywhere on the category chain wins
//! - Cycles and over-deep chains terminate
//! - Directory failures propagate instead of turning into "no access"

use async_trait::async_trait;
use coursegate::access::{AccessResolver, AccessResult, AccessSource};
use coursegate::config::AccessConfig;
use coursegate::directory::{
    ActiveEnrollment, CategoryId, CategoryRoleGrant, CategoryRoleLookup, CategoryTree, CourseId,
    EnrollmentLookup, EnrollmentStatus, GlobalPrivilege, GlobalPrivilegeLookup, InMemoryDirectory,
    PrincipalLookup, SharedDirectory, UserId,
};
use coursegate::error::{AccessError, DirectoryError, DirectoryResult};
use coursegate::identity::{IdentityContext, Principal, SystemRole, begin_impersonation};
use coursegate::roles::{CategoryRole, CourseRole, Role};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// =============================================================================
// Test Helpers
// =============================================================================

/// Physics department layout:
///
/// ```text
/// university
/// └── science
///     └── physics
///         ├── mechanics-101
///         └── optics-201
/// ```
fn department() -> InMemoryDirectory {
    InMemoryDirectory::new()
        .with_principal(Principal::new("root", SystemRole::Admin))
        .with_principal(Principal::new("alice", SystemRole::Student))
        .with_principal(Principal::new("bob", SystemRole::Student))
        .with_principal(Principal::new("carol", SystemRole::ContentManager))
        .with_root_category("university")
        .with_category("science", "university")
        .with_category("physics", "science")
        .with_course("mechanics-101", "physics")
        .with_course("optics-201", "physics")
        .with_uncategorized_course("orientation")
}

fn resolver(directory: InMemoryDirectory) -> AccessResolver {
    AccessResolver::with_defaults(Arc::new(directory))
}

async fn resolve(resolver: &AccessResolver, user: &str, course: &str) -> AccessResult {
    resolver
        .resolve_access(&UserId::from(user), &CourseId::from(course))
        .await
        .unwrap()
}

/// Which lookup a [`FailingDirectory`] should fail on
#[derive(Clone, Copy, PartialEq, Eq)]
enum FailAt {
    Privilege,
    Enrollment,
    CourseCategory,
    CategoryRole,
    CategoryParent,
}

/// Delegates to an in-memory directory, but one lookup always fails
struct FailingDirectory {
    inner: InMemoryDirectory,
    fail_at: FailAt,
}

impl FailingDirectory {
    fn check(&self, at: FailAt) -> DirectoryResult<()> {
        if self.fail_at == at {
            Err(DirectoryError::Unavailable("record store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GlobalPrivilegeLookup for FailingDirectory {
    async fn find_global_privilege(
        &self,
        user: &UserId,
    ) -> DirectoryResult<Option<GlobalPrivilege>> {
        self.check(FailAt::Privilege)?;
        self.inner.find_global_privilege(user).await
    }
}

#[async_trait]
impl EnrollmentLookup for FailingDirectory {
    async fn find_active_enrollment(
        &self,
        user: &UserId,
        course: &CourseId,
    ) -> DirectoryResult<Option<ActiveEnrollment>> {
        self.check(FailAt::Enrollment)?;
        self.inner.find_active_enrollment(user, course).await
    }
}

#[async_trait]
impl CategoryRoleLookup for FailingDirectory {
    async fn find_category_role(
        &self,
        user: &UserId,
        category: &CategoryId,
    ) -> DirectoryResult<Option<CategoryRoleGrant>> {
        self.check(FailAt::CategoryRole)?;
        self.inner.find_category_role(user, category).await
    }
}

#[async_trait]
impl CategoryTree for FailingDirectory {
    async fn get_category_parent(
        &self,
        category: &CategoryId,
    ) -> DirectoryResult<Option<CategoryId>> {
        self.check(FailAt::CategoryParent)?;
        self.inner.get_category_parent(category).await
    }

    async fn get_course_category(&self, course: &CourseId) -> DirectoryResult<Option<CategoryId>> {
        self.check(FailAt::CourseCategory)?;
        self.inner.get_course_category(course).await
    }
}

#[async_trait]
impl PrincipalLookup for FailingDirectory {
    async fn find_principal(&self, user: &UserId) -> DirectoryResult<Option<Principal>> {
        self.inner.find_principal(user).await
    }
}

/// Counts category lookups so tests can see how far a walk went
struct CountingDirectory {
    inner: InMemoryDirectory,
    parent_lookups: AtomicUsize,
    role_lookups: AtomicUsize,
}

impl CountingDirectory {
    fn new(inner: InMemoryDirectory) -> Self {
        Self {
            inner,
            parent_lookups: AtomicUsize::new(0),
            role_lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GlobalPrivilegeLookup for CountingDirectory {
    async fn find_global_privilege(
        &self,
        user: &UserId,
    ) -> DirectoryResult<Option<GlobalPrivilege>> {
        self.inner.find_global_privilege(user).await
    }
}

#[async_trait]
impl EnrollmentLookup for CountingDirectory {
    async fn find_active_enrollment(
        &self,
        user: &UserId,
        course: &CourseId,
    ) -> DirectoryResult<Option<ActiveEnrollment>> {
        self.inner.find_active_enrollment(user, course).await
    }
}

#[async_trait]
impl CategoryRoleLookup for CountingDirectory {
    async fn find_category_role(
        &self,
        user: &UserId,
        category: &CategoryId,
    ) -> DirectoryResult<Option<CategoryRoleGrant>> {
        self.role_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_category_role(user, category).await
    }
}

#[async_trait]
impl CategoryTree for CountingDirectory {
    async fn get_category_parent(
        &self,
        category: &CategoryId,
    ) -> DirectoryResult<Option<CategoryId>> {
        self.parent_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_category_parent(category).await
    }

    async fn get_course_category(&self, course: &CourseId) -> DirectoryResult<Option<CategoryId>> {
        self.inner.get_course_category(course).await
    }
}

#[async_trait]
impl PrincipalLookup for CountingDirectory {
    async fn find_principal(&self, user: &UserId) -> DirectoryResult<Option<Principal>> {
        self.inner.find_principal(user).await
    }
}

// =============================================================================
// 1. Global Privilege
// =============================================================================

#[tokio::test]
async fn test_admin_is_manager_everywhere() {
    let resolver = resolver(
        department()
            .with_enrollment("root", "mechanics-101", CourseRole::Student, EnrollmentStatus::Active)
            .with_category_role("root", "physics", CategoryRole::CategoryReviewer),
    );

    for course in ["mechanics-101", "orientation", "no-such-course"] {
        let result = resolve(&resolver, "root", course).await;
        assert!(result.has_access);
        assert_eq!(result.role, Some(Role::Course(CourseRole::Manager)));
        assert_eq!(result.source, Some(AccessSource::GlobalAdmin));
    }
}

#[tokio::test]
async fn test_content_manager_is_not_privileged() {
    let resolver = resolver(department());

    let result = resolve(&resolver, "carol", "mechanics-101").await;
    assert_eq!(result, AccessResult::none());
}

// =============================================================================
// 2. Enrollment
// =============================================================================

#[tokio::test]
async fn test_enrollment_beats_stronger_category_role() {
    let resolver = resolver(
        department()
            .with_enrollment("alice", "mechanics-101", CourseRole::Student, EnrollmentStatus::Active)
            .with_category_role("alice", "science", CategoryRole::CategoryAdmin),
    );

    let result = resolve(&resolver, "alice", "mechanics-101").await;
    assert_eq!(result, AccessResult::enrollment(CourseRole::Student));
}

#[tokio::test]
async fn test_inactive_enrollment_is_inert() {
    let resolver = resolver(
        department()
            .with_enrollment("alice", "mechanics-101", CourseRole::Teacher, EnrollmentStatus::Suspended)
            .with_enrollment("bob", "mechanics-101", CourseRole::Teacher, EnrollmentStatus::Pending)
            .with_category_role("bob", "physics", CategoryRole::CategoryReviewer),
    );

    assert_eq!(
        resolve(&resolver, "alice", "mechanics-101").await,
        AccessResult::none()
    );

    // Falls through to the category chain
    assert_eq!(
        resolve(&resolver, "bob", "mechanics-101").await,
        AccessResult::category(CategoryRole::CategoryReviewer)
    );
}

#[tokio::test]
async fn test_enrollment_is_per_course() {
    let resolver = resolver(department().with_enrollment(
        "alice",
        "mechanics-101",
        CourseRole::Ta,
        EnrollmentStatus::Active,
    ));

    assert!(resolve(&resolver, "alice", "mechanics-101").await.has_access);
    assert!(!resolve(&resolver, "alice", "optics-201").await.has_access);
}

// =============================================================================
// 3. Category Inheritance
// =============================================================================

#[tokio::test]
async fn test_ancestor_role_applies_to_descendant_courses() {
    let resolver = resolver(department().with_category_role(
        "bob",
        "university",
        CategoryRole::CategoryReviewer,
    ));

    for course in ["mechanics-101", "optics-201"] {
        let result = resolve(&resolver, "bob", course).await;
        assert_eq!(result, AccessResult::category(CategoryRole::CategoryReviewer));
    }

    // Not filed under any category
    assert_eq!(
        resolve(&resolver, "bob", "orientation").await,
        AccessResult::none()
    );
}

#[tokio::test]
async fn test_strongest_role_on_chain_wins() {
    // Nearest grant is weaker; the walk must not stop there
    let resolver = resolver(
        department()
            .with_category_role("bob", "physics", CategoryRole::CategoryReviewer)
            .with_category_role("bob", "science", CategoryRole::CategoryAdmin)
            .with_category_role("bob", "university", CategoryRole::CategoryCoordinator),
    );

    let result = resolve(&resolver, "bob", "mechanics-101").await;
    assert_eq!(result, AccessResult::category(CategoryRole::CategoryAdmin));
}

#[tokio::test]
async fn test_walk_visits_every_ancestor() {
    let directory = Arc::new(CountingDirectory::new(department()));
    let shared: SharedDirectory = directory.clone();
    let resolver = AccessResolver::with_defaults(shared);

    let result = resolver
        .resolve_access(&UserId::from("bob"), &CourseId::from("mechanics-101"))
        .await
        .unwrap();

    assert_eq!(result, AccessResult::none());
    // physics, science, university
    assert_eq!(directory.role_lookups.load(Ordering::SeqCst), 3);
    assert_eq!(directory.parent_lookups.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_no_source_yields_no_access() {
    let resolver = resolver(department());

    let result = resolve(&resolver, "alice", "mechanics-101").await;
    assert!(!result.has_access);
    assert_eq!(result.role, None);
    assert_eq!(result.source, None);
}

// =============================================================================
// 4. Malformed Trees
// =============================================================================

#[tokio::test]
async fn test_two_category_cycle_terminates() {
    let directory = Arc::new(CountingDirectory::new(
        InMemoryDirectory::new()
            .with_course("looped", "a")
            .with_category("a", "b")
            .with_category("b", "a")
            .with_category_role("bob", "b", CategoryRole::CategoryCoordinator),
    ));
    let shared: SharedDirectory = directory.clone();
    let resolver = AccessResolver::with_defaults(shared);

    let result = resolver
        .resolve_access(&UserId::from("bob"), &CourseId::from("looped"))
        .await
        .unwrap();

    assert_eq!(
        result,
        AccessResult::category(CategoryRole::CategoryCoordinator)
    );
    // Each category consulted exactly once
    assert_eq!(directory.role_lookups.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_self_parented_category_terminates() {
    let resolver = resolver(
        InMemoryDirectory::new()
            .with_course("c1", "loop")
            .with_category("loop", "loop"),
    );

    assert_eq!(resolve(&resolver, "bob", "c1").await, AccessResult::none());
}

#[tokio::test]
async fn test_depth_bound_caps_walk() {
    // chain of 10 categories: cat0 -> cat1 -> ... -> cat9
    let mut directory = InMemoryDirectory::new().with_course("deep", "cat0");
    for i in 0..9 {
        directory = directory.with_category(format!("cat{}", i), format!("cat{}", i + 1));
    }
    directory = directory
        .with_root_category("cat9")
        .with_category_role("bob", "cat9", CategoryRole::CategoryAdmin);

    let counting = Arc::new(CountingDirectory::new(directory));
    let shared: SharedDirectory = counting.clone();

    let bounded = AccessResolver::new(
        shared.clone(),
        &AccessConfig {
            max_category_depth: 5,
        },
    );
    let result = bounded
        .resolve_access(&UserId::from("bob"), &CourseId::from("deep"))
        .await
        .unwrap();
    assert_eq!(result, AccessResult::none());
    assert_eq!(counting.role_lookups.load(Ordering::SeqCst), 5);

    let unbounded = AccessResolver::with_defaults(shared);
    let result = unbounded
        .resolve_access(&UserId::from("bob"), &CourseId::from("deep"))
        .await
        .unwrap();
    assert_eq!(result, AccessResult::category(CategoryRole::CategoryAdmin));
}

// =============================================================================
// 5. Infrastructure Failures
// =============================================================================

#[tokio::test]
async fn test_lookup_failures_propagate() {
    let base = department()
        .with_category_role("bob", "science", CategoryRole::CategoryReviewer);

    for fail_at in [
        FailAt::Privilege,
        FailAt::Enrollment,
        FailAt::CourseCategory,
        FailAt::CategoryRole,
        FailAt::CategoryParent,
    ] {
        let resolver = AccessResolver::with_defaults(Arc::new(FailingDirectory {
            inner: base.clone(),
            fail_at,
        }));

        let result = resolver
            .resolve_access(&UserId::from("bob"), &CourseId::from("mechanics-101"))
            .await;
        assert!(
            matches!(result, Err(DirectoryError::Unavailable(_))),
            "failure was swallowed: {:?}",
            result
        );
    }
}

#[tokio::test]
async fn test_privileged_user_still_fails_when_privilege_lookup_fails() {
    let resolver = AccessResolver::with_defaults(Arc::new(FailingDirectory {
        inner: department(),
        fail_at: FailAt::Privilege,
    }));

    let result = resolver
        .resolve_access(&UserId::from("root"), &CourseId::from("mechanics-101"))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_require_surfaces_directory_error() {
    let resolver = AccessResolver::with_defaults(Arc::new(FailingDirectory {
        inner: department(),
        fail_at: FailAt::Enrollment,
    }));
    let identity = IdentityContext::new(Principal::new("alice", SystemRole::Student));

    let err = resolver
        .require(
            &identity,
            &CourseId::from("mechanics-101"),
            CourseRole::Student.into(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Directory(_)));
}

// =============================================================================
// 6. Identity Integration
// =============================================================================

#[tokio::test]
async fn test_impersonation_equivalence() {
    let directory = department()
        .with_enrollment("alice", "mechanics-101", CourseRole::Ta, EnrollmentStatus::Active)
        .with_category_role("alice", "science", CategoryRole::CategoryReviewer);
    let shared: SharedDirectory = Arc::new(directory);
    let resolver = AccessResolver::with_defaults(shared.clone());

    let admin = IdentityContext::new(Principal::new("root", SystemRole::Admin));
    let as_alice = begin_impersonation(&admin, &UserId::from("alice"), shared.as_ref())
        .await
        .unwrap();

    for course in ["mechanics-101", "optics-201", "orientation"] {
        let course = CourseId::from(course);
        let impersonated = resolver.resolve_for(&as_alice, &course).await.unwrap();
        let direct = resolver
            .resolve_access(&UserId::from("alice"), &course)
            .await
            .unwrap();
        assert_eq!(impersonated, direct);
    }

    // The admin's own privilege does not leak into the impersonated view
    let result = resolver
        .resolve_for(&as_alice, &CourseId::from("orientation"))
        .await
        .unwrap();
    assert!(!result.has_access);
}

#[tokio::test]
async fn test_require_uses_effective_identity() {
    let directory = department().with_enrollment(
        "alice",
        "mechanics-101",
        CourseRole::Student,
        EnrollmentStatus::Active,
    );
    let shared: SharedDirectory = Arc::new(directory);
    let resolver = AccessResolver::with_defaults(shared.clone());

    let admin = IdentityContext::new(Principal::new("root", SystemRole::Admin));
    let as_alice = begin_impersonation(&admin, &UserId::from("alice"), shared.as_ref())
        .await
        .unwrap();

    let err = resolver
        .require(
            &as_alice,
            &CourseId::from("mechanics-101"),
            CourseRole::Teacher.into(),
        )
        .await
        .unwrap_err();

    match err {
        AccessError::Denied(denied) => assert_eq!(denied.user, UserId::from("alice")),
        other => panic!("expected denial, got {:?}", other),
    }

    assert!(
        resolver
            .require(
                &admin,
                &CourseId::from("mechanics-101"),
                CourseRole::Teacher.into()
            )
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_snapshot_backed_resolution() {
    let snapshot = r#"
[[users]]
id = "dean"
system_role = "student"

[[categories]]
id = "science"

[[categories]]
id = "physics"
parent = "science"

[[courses]]
id = "mechanics-101"
category = "physics"

[[category_roles]]
user = "dean"
category = "science"
role = "category-coordinator"
"#;

    let resolver = resolver(InMemoryDirectory::from_toml_str(snapshot).unwrap());
    let result = resolve(&resolver, "dean", "mechanics-101").await;

    assert_eq!(
        serde_json::to_value(result).unwrap(),
        serde_json::json!({
            "has_access": true,
            "role": "category-coordinator",
            "source": "category"
        })
    );
}
