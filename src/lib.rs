//! Course authorization resolution
//!
//! Decides which role, if any, a principal holds on a course, and lets a
//! privileged principal act as another principal while keeping the two
//! identities apart.
//!
//! ## Features
//!
//! - **Layered resolution**: global privilege, direct enrollment, then roles
//!   inherited through the course's category chain
//! - **One priority scale** shared by course and category roles
//! - **Bounded category walk** that survives cycles in the stored tree
//! - **Impersonation** as an immutable request-scoped value
//! - **Pluggable directory**: in-memory snapshot or a JSON record service
//!
//! ## Resolution Order
//!
//! ```text
//! global privilege → active enrollment → category chain (max role) → none
//! ```
//!
//! A lookup that finds nothing falls through to the next step. A lookup that
//! fails aborts the resolution: "could not determine" is never reported as
//! "no access".
//!
//! ## Example Configuration
//!
//! ```toml
//! [directory]
//! backend = "rest"
//! url = "https://records.internal/api"
//! # token from COURSEGATE_DIRECTORY_TOKEN env var
//!
//! [access]
//! max_category_depth = 64
//! ```

pub mod access;
pub mod config;
pub mod directory;
pub mod error;
pub mod identity;
pub mod roles;
pub mod util;

// Re-export main types
pub use access::{AccessResolver, AccessResult, AccessSource};
pub use config::{AppConfig, load_config};
pub use directory::{CategoryId, CourseId, Directory, SharedDirectory, UserId, create_directory};
pub use error::{AppError, Result};
pub use identity::{IdentityContext, Principal, begin_impersonation, end_impersonation};
pub use roles::{CategoryRole, CourseRole, Role, has_minimum_role};
