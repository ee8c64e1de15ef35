//! Request-scoped identity with optional substitution.
//!
//! An [`IdentityContext`] is an immutable value. [`begin_impersonation`] and
//! [`end_impersonation`] return a new context and leave their input as it
//! was, so a rejected substitution cannot disturb the caller's state.

use crate::directory::{PrincipalLookup, UserId};
use crate::error::{DirectoryResult, ImpersonationError};
use crate::identity::principal::Principal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Who authenticated, and who the request is acting as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    authenticated: Principal,
    /// Present only while impersonating; always differs from `authenticated`
    effective: Option<Principal>,
}

/// What a web layer persists between requests to keep an impersonation alive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpersonationSession {
    #[serde(default)]
    pub impersonating: Option<UserId>,
}

impl IdentityContext {
    /// A plain context for an authenticated principal
    pub fn new(authenticated: Principal) -> Self {
        Self {
            authenticated,
            effective: None,
        }
    }

    pub fn authenticated(&self) -> &Principal {
        &self.authenticated
    }

    /// The principal every authorization decision must use
    pub fn effective(&self) -> &Principal {
        self.effective.as_ref().unwrap_or(&self.authenticated)
    }

    pub fn effective_id(&self) -> &UserId {
        &self.effective().id
    }

    /// The impersonation target, if any
    pub fn impersonated(&self) -> Option<&Principal> {
        self.effective.as_ref()
    }

    pub fn is_impersonating(&self) -> bool {
        self.effective.is_some()
    }

    pub fn to_session(&self) -> ImpersonationSession {
        ImpersonationSession {
            impersonating: self.effective.as_ref().map(|p| p.id.clone()),
        }
    }

    /// Rebuild a context from a persisted session.
    ///
    /// The substitution guard runs again. If it no longer passes (the
    /// authenticated principal lost privilege, or the target is gone) the
    /// context falls back to plain. Directory failures propagate.
    pub async fn restore<P>(
        authenticated: Principal,
        session: &ImpersonationSession,
        principals: &P,
    ) -> DirectoryResult<Self>
    where
        P: PrincipalLookup + ?Sized,
    {
        let plain = IdentityContext::new(authenticated);
        let Some(target) = &session.impersonating else {
            return Ok(plain);
        };

        match begin_impersonation(&plain, target, principals).await {
            Ok(ctx) => Ok(ctx),
            Err(ImpersonationError::Directory(e)) => Err(e),
            Err(rejection) => {
                warn!(
                    actor = %plain.authenticated.id,
                    target = %target,
                    reason = %rejection,
                    "Dropping persisted impersonation"
                );
                Ok(plain)
            }
        }
    }
}

/// Start acting as `target`.
///
/// Allowed only for a privileged authenticated principal in a plain context,
/// and only for an existing target other than themselves.
#[instrument(skip_all, fields(actor = %ctx.authenticated.id, target = %target))]
pub async fn begin_impersonation<P>(
    ctx: &IdentityContext,
    target: &UserId,
    principals: &P,
) -> Result<IdentityContext, ImpersonationError>
where
    P: PrincipalLookup + ?Sized,
{
    if let Some(current) = &ctx.effective {
        return Err(ImpersonationError::AlreadyImpersonating {
            current: current.id.clone(),
        });
    }

    if !ctx.authenticated.is_privileged() {
        return Err(ImpersonationError::NotPrivileged {
            user: ctx.authenticated.id.clone(),
        });
    }

    if &ctx.authenticated.id == target {
        return Err(ImpersonationError::SelfImpersonation {
            user: target.clone(),
        });
    }

    let effective = principals
        .find_principal(target)
        .await?
        .ok_or_else(|| ImpersonationError::TargetNotFound {
            target: target.clone(),
        })?;

    info!("Impersonation started");

    Ok(IdentityContext {
        authenticated: ctx.authenticated.clone(),
        effective: Some(effective),
    })
}

/// Stop impersonating. A plain context is returned unchanged.
pub fn end_impersonation(ctx: &IdentityContext) -> IdentityContext {
    if let Some(effective) = &ctx.effective {
        info!(
            actor = %ctx.authenticated.id,
            target = %effective.id,
            "Impersonation ended"
        );
    }

    IdentityContext::new(ctx.authenticated.clone())
}
