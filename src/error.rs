//! Error types for coursegate
//!
//! This module defines the error hierarchy used throughout the crate.
//! Three failure classes must stay distinguishable for callers:
//! an access decision that came out negative ([`AccessDeniedError`]),
//! a decision that could not be made ([`DirectoryError`]), and a caller
//! that is not allowed to substitute identities ([`ImpersonationError`]).
//! A missing record is not an error at all: lookups return `Ok(None)`.

pub mod response;

use crate::directory::{CourseId, UserId};
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Access denied: {0}")]
    AccessDenied(#[from] AccessDeniedError),

    #[error("Impersonation error: {0}")]
    Impersonation(#[from] ImpersonationError),
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Denied(denied) => AppError::AccessDenied(denied),
            AccessError::Directory(dir) => AppError::Directory(dir),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the backing record store.
///
/// Any of these means access could not be determined. They must reach the
/// caller and are never folded into a negative decision.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Record service error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized: record service rejected our credentials")]
    Unauthorized,

    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    #[error("Request timeout after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("Malformed {record} record: {reason}")]
    Malformed { record: String, reason: String },

    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

impl DirectoryError {
    /// Create an appropriate error from a non-success HTTP status and body.
    ///
    /// 404 is handled by the caller as "not found" before reaching here.
    pub fn from_response(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => DirectoryError::Unauthorized,
            429 => DirectoryError::RateLimited { retry_after: 60 },
            _ => DirectoryError::Api {
                status,
                message: if body.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.to_string()
                },
            },
        }
    }

    pub fn malformed(record: impl Into<String>, reason: impl Into<String>) -> Self {
        DirectoryError::Malformed {
            record: record.into(),
            reason: reason.into(),
        }
    }
}

/// A negative access decision
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Access denied for user '{user}' on course '{course}': {reason}")]
pub struct AccessDeniedError {
    pub user: UserId,
    pub course: CourseId,
    pub reason: String,
}

impl AccessDeniedError {
    pub fn new(user: UserId, course: CourseId, reason: impl Into<String>) -> Self {
        Self {
            user,
            course,
            reason: reason.into(),
        }
    }

    pub fn no_access(user: UserId, course: CourseId) -> Self {
        Self::new(user, course, "no role grants access to this course")
    }

    pub fn insufficient_role(
        user: UserId,
        course: CourseId,
        held: impl Into<String>,
        required: impl Into<String>,
    ) -> Self {
        Self::new(
            user,
            course,
            format!(
                "role '{}' does not meet required role '{}'",
                held.into(),
                required.into()
            ),
        )
    }
}

/// Errors from a guarded access check
#[derive(Error, Debug)]
pub enum AccessError {
    #[error(transparent)]
    Denied(#[from] AccessDeniedError),

    #[error("Could not determine access: {0}")]
    Directory(#[from] DirectoryError),
}

/// Errors from identity substitution
///
/// Every variant except [`ImpersonationError::Directory`] is a rejection:
/// the caller, not the data, is at fault.
#[derive(Error, Debug)]
pub enum ImpersonationError {
    #[error("User '{user}' lacks the privilege required to impersonate")]
    NotPrivileged { user: UserId },

    #[error("Already impersonating '{current}'; end it before starting another")]
    AlreadyImpersonating { current: UserId },

    #[error("User '{user}' cannot impersonate themselves")]
    SelfImpersonation { user: UserId },

    #[error("Impersonation target '{target}' does not exist")]
    TargetNotFound { target: UserId },

    #[error("Could not verify impersonation target: {0}")]
    Directory(#[from] DirectoryError),
}

impl ImpersonationError {
    /// Whether this is a rejection of the caller rather than an infrastructure failure
    pub fn is_rejection(&self) -> bool {
        !matches!(self, ImpersonationError::Directory(_))
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for directory lookups
pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;
