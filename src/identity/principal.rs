//! Principals and their system-wide role tag.

use crate::directory::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// System-wide role tag carried by every account
///
/// Only [`SystemRole::Admin`] confers global privilege. Unknown tags are
/// kept verbatim so they round-trip, and are never privileged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SystemRole {
    Student,
    Admin,
    ContentManager,
    Other(String),
}

impl SystemRole {
    pub fn as_str(&self) -> &str {
        match self {
            SystemRole::Student => "student",
            SystemRole::Admin => "admin",
            SystemRole::ContentManager => "content-manager",
            SystemRole::Other(s) => s,
        }
    }

    /// Whether this tag grants system-wide administrative privilege
    pub fn is_privileged(&self) -> bool {
        matches!(self, SystemRole::Admin)
    }
}

impl From<String> for SystemRole {
    fn from(s: String) -> Self {
        match s.as_str() {
            "student" => SystemRole::Student,
            "admin" => SystemRole::Admin,
            "content-manager" => SystemRole::ContentManager,
            _ => SystemRole::Other(s),
        }
    }
}

impl From<&str> for SystemRole {
    fn from(s: &str) -> Self {
        SystemRole::from(s.to_string())
    }
}

impl From<SystemRole> for String {
    fn from(role: SystemRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for SystemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An identity with its system-wide role, as of the current request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub system_role: SystemRole,
}

impl Principal {
    pub fn new(id: impl Into<UserId>, system_role: impl Into<SystemRole>) -> Self {
        Self {
            id: id.into(),
            system_role: system_role.into(),
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.system_role.is_privileged()
    }
}
