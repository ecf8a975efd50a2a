use async_trait::async_trait;

use super::normalize_email;
use crate::error::ApiError;

/// What a gated endpoint wants to do with the resource it already fetched.
/// Handlers resolve NotFound before the guard ever runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Update,
    Delete,
    ChangeRole,
}

/// Request identity as established by token verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Verified(String),
}

impl Caller {
    pub fn verified(email: impl Into<String>) -> Self {
        Caller::Verified(normalize_email(&email.into()))
    }

    fn email(&self) -> Option<&str> {
        match self {
            Caller::Anonymous => None,
            Caller::Verified(email) => Some(email),
        }
    }
}

/// Read-only role lookup against the user store. A missing user resolves
/// to not-admin; a store failure is an error, never a permit.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    async fn is_admin(&self, email: &str) -> anyhow::Result<bool>;
}

/// Stateless authorization decision for mutating endpoints. Evaluated
/// fresh on every request; performs at most one role lookup.
pub struct AccessGuard<'a, R: RoleResolver> {
    roles: &'a R,
}

impl<'a, R: RoleResolver> AccessGuard<'a, R> {
    pub fn new(roles: &'a R) -> Self {
        Self { roles }
    }

    /// Owner-or-admin rule for jobs. Reads are public.
    pub async fn authorize_job(
        &self,
        caller: &Caller,
        op: Operation,
        owner_email: &str,
    ) -> Result<(), ApiError> {
        match op {
            Operation::Read => Ok(()),
            Operation::Update | Operation::Delete => self.owner_or_admin(caller, owner_email).await,
            // Roles live on users, not jobs.
            Operation::ChangeRole => Err(ApiError::Forbidden),
        }
    }

    /// User-record rule: profile updates are owner-or-admin; role changes
    /// are admin-only, and owning the account grants nothing, so there is
    /// no self-service elevation path. Users are never deletable.
    pub async fn authorize_user(
        &self,
        caller: &Caller,
        op: Operation,
        target_email: &str,
    ) -> Result<(), ApiError> {
        match op {
            Operation::Read => Ok(()),
            Operation::Update => self.owner_or_admin(caller, target_email).await,
            Operation::ChangeRole => {
                let email = caller.email().ok_or(ApiError::Unauthenticated)?;
                if self.roles.is_admin(email).await? {
                    Ok(())
                } else {
                    Err(ApiError::Forbidden)
                }
            }
            // No exposed operation deletes a user record.
            Operation::Delete => Err(ApiError::Forbidden),
        }
    }

    async fn owner_or_admin(&self, caller: &Caller, owner_email: &str) -> Result<(), ApiError> {
        let email = caller.email().ok_or(ApiError::Unauthenticated)?;
        if email.eq_ignore_ascii_case(owner_email) {
            return Ok(());
        }
        if self.roles.is_admin(email).await? {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}
