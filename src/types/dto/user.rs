use serde::{Deserialize, Serialize};

use crate::types::internal::{Role, RoleStatus, User, UserFilter, UserStatus};

/// Body shared by create and update; update ignores `username`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub introduction: String,
    pub status: UserStatus,
    pub role_ids: Vec<i64>,
}

pub type UpdateUserRequest = CreateUserRequest;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserListRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub page_num: u64,
    #[serde(default)]
    pub page_size: u64,
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl From<UserListRequest> for UserFilter {
    fn from(req: UserListRequest) -> Self {
        Self {
            username: non_blank(&req.username),
            nickname: non_blank(&req.nickname),
            mobile: non_blank(&req.mobile),
            status: (req.status != 0).then_some(req.status),
            page_num: (req.page_num > 0).then_some(req.page_num),
            page_size: (req.page_size > 0).then_some(req.page_size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleInfo {
    pub id: i64,
    pub name: String,
    pub sort: i32,
    pub status: RoleStatus,
}

impl From<&Role> for RoleInfo {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
            sort: role.sort,
            status: role.status,
        }
    }
}

/// Public projection of a user. Carries no password digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub mobile: String,
    pub avatar: String,
    pub nickname: String,
    pub introduction: String,
    pub status: UserStatus,
    pub creator: String,
    pub roles: Vec<RoleInfo>,
    pub created_at: i64,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            mobile: user.mobile.clone(),
            avatar: user.avatar.clone(),
            nickname: user.nickname.clone(),
            introduction: user.introduction.clone(),
            status: user.status,
            creator: user.creator.clone(),
            roles: user.roles.iter().map(RoleInfo::from).collect(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserInfo>,
    pub total: u64,
}
