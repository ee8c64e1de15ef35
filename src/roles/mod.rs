//! Role vocabularies and the shared priority scale.

pub mod hierarchy;
pub mod types;

pub use hierarchy::{UNKNOWN_PRIORITY, has_minimum_role, highest, role_priority};
pub use types::{CategoryRole, CourseRole, Role};
