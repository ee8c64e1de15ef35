//! Identity context and impersonation
//!
//! Authorization-sensitive code takes an [`IdentityContext`] explicitly and
//! reads [`IdentityContext::effective_id`]. There is no ambient "current
//! user"; two concurrent requests can never observe each other's
//! substitution state.

pub mod context;
pub mod principal;

pub use context::{IdentityContext, ImpersonationSession, begin_impersonation, end_impersonation};
pub use principal::{Principal, SystemRole};
