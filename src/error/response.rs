//! Transport-neutral error responses.
//!
//! Maps application errors to an HTTP-style status plus a stable
//! `error_type`, so the enclosing web layer can tell the three failure
//! classes apart:
//! - access denied → 403 `AccessDenied`
//! - impersonation rejected → 403 `ImpersonationRejected`
//! - access could not be determined → 500 `DirectoryUnavailable`

use serde::Serialize;
use serde_json::{Value, json};

use super::{AccessDeniedError, AccessError, AppError, DirectoryError, ImpersonationError};

pub const STATUS_FORBIDDEN: u16 = 403;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Error payload handed to the web layer
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    pub status: u16,
    pub error_type: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Maps any application error to a response.
pub fn map_app_error(error: &AppError) -> ErrorResponse {
    match error {
        AppError::AccessDenied(denied) => map_access_denied_error(denied),
        AppError::Directory(dir) => map_directory_error(dir),
        AppError::Impersonation(imp) => map_impersonation_error(imp),
        AppError::Config(cfg) => ErrorResponse {
            status: STATUS_INTERNAL_ERROR,
            error_type: "ConfigurationError",
            message: cfg.to_string(),
            data: None,
        },
    }
}

/// Maps a guarded access check failure to a response.
pub fn map_access_error(error: &AccessError) -> ErrorResponse {
    match error {
        AccessError::Denied(denied) => map_access_denied_error(denied),
        AccessError::Directory(dir) => map_directory_error(dir),
    }
}

pub fn map_access_denied_error(error: &AccessDeniedError) -> ErrorResponse {
    ErrorResponse {
        status: STATUS_FORBIDDEN,
        error_type: "AccessDenied",
        message: error.to_string(),
        data: Some(json!({
            "user": error.user,
            "course": error.course,
            "reason": error.reason
        })),
    }
}

/// Directory failures never leak record-service details beyond the status.
pub fn map_directory_error(error: &DirectoryError) -> ErrorResponse {
    let data = match error {
        DirectoryError::RateLimited { retry_after } => Some(json!({
            "retry_after": retry_after
        })),
        DirectoryError::Timeout { timeout_secs } => Some(json!({
            "timeout_secs": timeout_secs
        })),
        _ => None,
    };

    ErrorResponse {
        status: STATUS_INTERNAL_ERROR,
        error_type: "DirectoryUnavailable",
        message: "Access could not be determined".to_string(),
        data,
    }
}

pub fn map_impersonation_error(error: &ImpersonationError) -> ErrorResponse {
    match error {
        ImpersonationError::Directory(dir) => map_directory_error(dir),
        rejection => ErrorResponse {
            status: STATUS_FORBIDDEN,
            error_type: "ImpersonationRejected",
            message: rejection.to_string(),
            data: None,
        },
    }
}
