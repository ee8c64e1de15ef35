//! Course access resolution
//!
//! Decides which role, if any, a principal effectively holds on a course.
//! What each role may do inside the course is the caller's concern.
//!
//! ## Resolution Order
//!
//! ```text
//! global privilege → active enrollment → category chain (max role) → none
//! ```
//!
//! The category chain starts at the course's own category and follows
//! parent links to the root. Every role found on the way is collected and
//! the highest-priority one wins, so a department-wide grant is never
//! shadowed by a weaker grant on a nearer category.

pub mod resolver;
pub mod types;

pub use resolver::AccessResolver;
pub use types::{AccessResult, AccessSource};
