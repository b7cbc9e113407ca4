use std::fmt;

use thiserror::Error;

use crate::errors::internal::{DatabaseError, InternalError, RoleError, UserError};

/// Self-modification rules enforced when an actor updates their own account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfModification {
    Disable,
    RoleChange,
    PasswordChange,
}

impl fmt::Display for SelfModification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelfModification::Disable => f.write_str("disable own account"),
            SelfModification::RoleChange => f.write_str("change own roles"),
            SelfModification::PasswordChange => f.write_str("change own password through user update"),
        }
    }
}

/// Error returned by every user administration and authentication operation
///
/// Variants are semantic rejections except `StoreUnavailable`, which wraps a
/// transient storage failure. See [`AdminError::is_retryable`].
#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Role set is empty and cannot be ranked")]
    EmptyRoleSet,

    #[error("Role lookup failed, unknown role ids: {missing:?}")]
    RoleLookupFailed { missing: Vec<i64> },

    #[error("Insufficient privilege: actor must strictly outrank the target roles")]
    InsufficientPrivilege,

    #[error("Invalid target user id: {0}")]
    InvalidTargetId(i64),

    #[error("User already exists: {0}")]
    DuplicateUsername(String),

    #[error("Role already exists: {0}")]
    DuplicateRoleName(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User is disabled")]
    UserDisabled,

    #[error("All roles assigned to the user are disabled")]
    AllRolesDisabled,

    #[error("Password incorrect")]
    WrongPassword,

    #[error("Old password incorrect")]
    WrongOldPassword,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Self-modification denied: cannot {action}")]
    SelfModificationDenied { action: SelfModification },

    #[error("Request has no authenticated actor")]
    Unauthenticated,

    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] DatabaseError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AdminError {
    pub fn self_modification_denied(action: SelfModification) -> Self {
        AdminError::SelfModificationDenied { action }
    }

    /// Only storage failures may be retried by an upstream caller
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdminError::StoreUnavailable(_))
    }
}

impl From<RoleError> for AdminError {
    fn from(err: RoleError) -> Self {
        match err {
            RoleError::EmptyRoleSet => AdminError::EmptyRoleSet,
            RoleError::RoleLookupFailed { missing } => AdminError::RoleLookupFailed { missing },
            RoleError::DuplicateRoleName { name } => AdminError::DuplicateRoleName(name),
        }
    }
}

impl From<InternalError> for AdminError {
    fn from(err: InternalError) -> Self {
        match err {
            InternalError::Database(source) => AdminError::StoreUnavailable(source),
            InternalError::User(UserError::DuplicateUsername { username }) => {
                AdminError::DuplicateUsername(username)
            }
            InternalError::User(UserError::UserNotFound { username }) => AdminError::NotFound(username),
            InternalError::User(UserError::UserIdNotFound { user_id }) => {
                AdminError::NotFound(format!("user id {}", user_id))
            }
            InternalError::Role(role_err) => role_err.into(),
            other @ (InternalError::Parse { .. } | InternalError::Crypto { .. }) => AdminError::Internal {
                message: other.to_string(),
            },
        }
    }
}
