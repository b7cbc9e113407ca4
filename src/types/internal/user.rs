use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::InternalError;
use crate::types::db;

/// Account status as stored in the `status` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum UserStatus {
    Enabled = 1,
    Disabled = 2,
}

impl UserStatus {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<UserStatus> for i32 {
    fn from(status: UserStatus) -> Self {
        status.as_i32()
    }
}

impl TryFrom<i32> for UserStatus {
    type Error = InternalError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(UserStatus::Enabled),
            2 => Ok(UserStatus::Disabled),
            other => Err(InternalError::parse("user status", format!("unknown value {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum RoleStatus {
    Enabled = 1,
    Disabled = 2,
}

impl RoleStatus {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<RoleStatus> for i32 {
    fn from(status: RoleStatus) -> Self {
        status.as_i32()
    }
}

impl TryFrom<i32> for RoleStatus {
    type Error = InternalError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RoleStatus::Enabled),
            2 => Ok(RoleStatus::Disabled),
            other => Err(InternalError::parse("role status", format!("unknown value {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: i64,
    pub name: String,
    /// Rank of the role. Lower is more privileged.
    pub sort: i32,
    pub status: RoleStatus,
}

impl Role {
    pub fn is_enabled(&self) -> bool {
        self.status == RoleStatus::Enabled
    }
}

impl TryFrom<db::role::Model> for Role {
    type Error = InternalError;

    fn try_from(model: db::role::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            sort: model.sort,
            status: RoleStatus::try_from(model.status)?,
        })
    }
}

/// Identity record with its roles preloaded
///
/// `password_hash` is the opaque digest. It is redacted from `Debug` output and
/// never leaves the crate through DTOs.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub mobile: String,
    pub avatar: String,
    pub nickname: String,
    pub introduction: String,
    pub status: UserStatus,
    pub creator: String,
    pub roles: Vec<Role>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// Assemble a user from its row and already-loaded roles
    pub fn from_parts(model: db::user::Model, roles: Vec<Role>) -> Result<Self, InternalError> {
        Ok(Self {
            id: model.id,
            status: UserStatus::try_from(model.status)?,
            username: model.username,
            password_hash: model.password_hash,
            mobile: model.mobile,
            avatar: model.avatar,
            nickname: model.nickname,
            introduction: model.introduction,
            creator: model.creator,
            roles,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.status == UserStatus::Enabled
    }

    pub fn has_enabled_role(&self) -> bool {
        self.roles.iter().any(Role::is_enabled)
    }

    pub fn role_ids(&self) -> Vec<i64> {
        self.roles.iter().map(|role| role.id).collect()
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"[redacted]")
            .field("status", &self.status)
            .field("creator", &self.creator)
            .field("roles", &self.roles)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Insert shape for a new user. `password_hash` is already a digest.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub mobile: String,
    pub avatar: String,
    pub nickname: String,
    pub introduction: String,
    pub status: UserStatus,
    pub creator: String,
    pub role_ids: Vec<i64>,
}

/// Explicit field mask for partial updates
///
/// `Some` writes the field, `None` leaves the column untouched. An empty
/// string inside `Some` is written as an empty string.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub password_hash: Option<String>,
    pub mobile: Option<String>,
    pub avatar: Option<String>,
    pub nickname: Option<String>,
    pub introduction: Option<String>,
    pub status: Option<UserStatus>,
    /// Replaces the whole role set when present
    pub role_ids: Option<Vec<i64>>,
}

impl UserUpdate {
    pub fn password(password_hash: String) -> Self {
        Self {
            password_hash: Some(password_hash),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.password_hash.is_none()
            && self.mobile.is_none()
            && self.avatar.is_none()
            && self.nickname.is_none()
            && self.introduction.is_none()
            && self.status.is_none()
            && self.role_ids.is_none()
    }
}

/// List filter. Empty strings, zero status and zero paging are ignored.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub username: Option<String>,
    pub nickname: Option<String>,
    pub mobile: Option<String>,
    pub status: Option<i32>,
    pub page_num: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct UserPage {
    pub items: Vec<User>,
    /// Filtered row count before pagination
    pub total: u64,
}
