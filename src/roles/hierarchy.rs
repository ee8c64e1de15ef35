//! Role priority table
//!
//! | role                 | priority |
//! |----------------------|----------|
//! | category-admin       | 6        |
//! | manager              | 6        |
//! | category-coordinator | 5        |
//! | teacher              | 5        |
//! | category-reviewer    | 4        |
//! | ta                   | 3        |
//! | student              | 1        |
//!
//! Unknown identifiers rank 0, below every known role.

use crate::roles::types::{CategoryRole, CourseRole, Role};

/// Priority of an identifier that is not a known role
pub const UNKNOWN_PRIORITY: u8 = 0;

impl CourseRole {
    pub const fn priority(&self) -> u8 {
        match self {
            CourseRole::Manager => 6,
            CourseRole::Teacher => 5,
            CourseRole::Ta => 3,
            CourseRole::Student => 1,
        }
    }
}

impl CategoryRole {
    pub const fn priority(&self) -> u8 {
        match self {
            CategoryRole::CategoryAdmin => 6,
            CategoryRole::CategoryCoordinator => 5,
            CategoryRole::CategoryReviewer => 4,
        }
    }
}

impl Role {
    pub const fn priority(&self) -> u8 {
        match self {
            Role::Course(role) => role.priority(),
            Role::Category(role) => role.priority(),
        }
    }

    /// Whether this role ranks at or above `required`
    pub const fn satisfies(&self, required: &Role) -> bool {
        self.priority() >= required.priority()
    }
}

/// Priority of a role identifier, [`UNKNOWN_PRIORITY`] if unrecognized
pub fn role_priority(identifier: &str) -> u8 {
    Role::try_parse(identifier).map_or(UNKNOWN_PRIORITY, |role| role.priority())
}

/// `priority(actual) >= priority(required)`
pub fn has_minimum_role(actual: &str, required: &str) -> bool {
    role_priority(actual) >= role_priority(required)
}

/// Pick the highest-priority role. On ties the earliest one wins.
pub fn highest<R, I>(roles: I) -> Option<R>
where
    R: Into<Role> + Copy,
    I: IntoIterator<Item = R>,
{
    let rank = |role: R| -> u8 { Into::<Role>::into(role).priority() };

    roles.into_iter().fold(None, |best, candidate| match best {
        Some(current) if rank(current) >= rank(candidate) => Some(current),
        _ => Some(candidate),
    })
}
