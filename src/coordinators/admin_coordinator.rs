use std::sync::Arc;

use crate::app_data::AppData;
use crate::errors::{AdminError, SelfModification};
use crate::providers::role_rank::{is_strictly_higher, same_role_set};
use crate::providers::{CredentialHasher, UserProvider};
use crate::stores::RoleStore;
use crate::types::dto::user::{CreateUserRequest, UpdateUserRequest};
use crate::types::internal::{
    NewUser, RequestContext, Role, User, UserFilter, UserPage, UserStatus, UserUpdate,
};

/// Admin coordinator: user administration under the role hierarchy
///
/// An actor may only create or edit users whose resulting roles it strictly
/// outranks, and may never disable itself, change its own roles or change
/// its own password through an update.
pub struct AdminCoordinator {
    user_provider: Arc<UserProvider>,
    role_store: Arc<RoleStore>,
    hasher: Arc<dyn CredentialHasher>,
    default_user_password: String,
}

impl AdminCoordinator {
    /// Create AdminCoordinator from AppData
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            user_provider: app_data.user_provider.clone(),
            role_store: app_data.role_store.clone(),
            hasher: app_data.hasher.clone(),
            default_user_password: app_data.default_user_password.clone(),
        }
    }

    /// Orchestrate the create user workflow
    ///
    /// 1. Resolve the actor and require it to hold at least one role
    /// 2. Resolve the requested roles
    /// 3. Require the actor to strictly outrank the requested roles
    /// 4. Hash the requested password, or the default password when empty
    /// 5. Persist with the actor as creator
    ///
    /// # Returns
    /// * `Ok(User)` - The stored user
    /// * `Err(AdminError)` - `EmptyRoleSet`, `RoleLookupFailed`, `InsufficientPrivilege`, `DuplicateUsername`, ...
    pub async fn create_user(&self, ctx: &RequestContext, req: CreateUserRequest) -> Result<User, AdminError> {
        // Step 1: Actor and its roles
        let actor = self.user_provider.current_user(ctx).await?;
        if actor.roles.is_empty() {
            return Err(AdminError::EmptyRoleSet);
        }

        // Step 2: Requested roles
        let requested = self.role_store.find_by_ids(&req.role_ids).await?;

        // Step 3: Hierarchy
        if !is_strictly_higher(&actor.roles, &requested)? {
            tracing::debug!(request_id = %ctx.request_id, actor_id = actor.id, "Create user rejected, insufficient privilege");
            return Err(AdminError::InsufficientPrivilege);
        }

        // Step 4: Password
        let password = if req.password.is_empty() {
            self.default_user_password.as_str()
        } else {
            req.password.as_str()
        };
        let password_hash = self.hasher.hash(password)?;

        // Step 5: Persist
        let new_user = NewUser {
            username: req.username,
            password_hash,
            mobile: req.mobile,
            avatar: req.avatar,
            nickname: req.nickname,
            introduction: req.introduction,
            status: req.status,
            creator: actor.username.clone(),
            role_ids: role_ids(&requested),
        };
        let created = self.user_provider.store().create(new_user).await?;

        tracing::info!(request_id = %ctx.request_id, actor_id = actor.id, user_id = created.id, "User created by admin");

        Ok(created)
    }

    /// Orchestrate the update user workflow
    ///
    /// 1. Reject a non-positive target id
    /// 2. Resolve the actor and the requested roles. An actor without roles
    ///    is rejected on both paths
    /// 3. Self update: no disable, same role set, no password. Other user:
    ///    the actor must strictly outrank both the requested roles and the
    ///    target's current roles
    /// 4. Persist, then refresh the target's cache entry
    ///
    /// `username` in the request is ignored; usernames are immutable. On the
    /// other-user path an empty password leaves the stored digest unchanged.
    pub async fn update_user_by_id(
        &self,
        ctx: &RequestContext,
        target_id: i64,
        req: UpdateUserRequest,
    ) -> Result<User, AdminError> {
        // Step 1: Target id
        if target_id <= 0 {
            return Err(AdminError::InvalidTargetId(target_id));
        }

        // Step 2: Actor and requested roles
        let actor = self.user_provider.current_user(ctx).await?;
        if actor.roles.is_empty() {
            return Err(AdminError::EmptyRoleSet);
        }
        let requested = self.role_store.find_by_ids(&req.role_ids).await?;

        // Step 3: Branch on self or other
        let update = if target_id == actor.id {
            self.self_update(&actor, &requested, req)?
        } else {
            self.other_update(&actor, target_id, &requested, req).await?
        };

        // Step 4: Persist and refresh
        let committed = self.user_provider.store().update_fields(target_id, update).await?;
        let fresh = self.user_provider.refresh(committed).await;

        tracing::info!(request_id = %ctx.request_id, actor_id = actor.id, user_id = fresh.id, "User updated by admin");

        Ok(fresh)
    }

    fn self_update(&self, actor: &User, requested: &[Role], req: UpdateUserRequest) -> Result<UserUpdate, AdminError> {
        if req.status == UserStatus::Disabled {
            return Err(AdminError::self_modification_denied(SelfModification::Disable));
        }
        if !same_role_set(&actor.role_ids(), &role_ids(requested)) {
            return Err(AdminError::self_modification_denied(SelfModification::RoleChange));
        }
        if !req.password.is_empty() {
            return Err(AdminError::self_modification_denied(SelfModification::PasswordChange));
        }

        Ok(UserUpdate {
            password_hash: None,
            mobile: Some(req.mobile),
            avatar: Some(req.avatar),
            nickname: Some(req.nickname),
            introduction: Some(req.introduction),
            status: Some(req.status),
            role_ids: None,
        })
    }

    async fn other_update(
        &self,
        actor: &User,
        target_id: i64,
        requested: &[Role],
        req: UpdateUserRequest,
    ) -> Result<UserUpdate, AdminError> {
        let target = self.user_provider.store().find_by_id_any_status(target_id).await?;

        if !is_strictly_higher(&actor.roles, requested)? {
            return Err(AdminError::InsufficientPrivilege);
        }
        if !target.roles.is_empty() && !is_strictly_higher(&actor.roles, &target.roles)? {
            tracing::debug!(actor_id = actor.id, target_id, "Update rejected, target outranks or matches actor");
            return Err(AdminError::InsufficientPrivilege);
        }

        let password_hash = if req.password.is_empty() {
            None
        } else {
            Some(self.hasher.hash(&req.password)?)
        };

        Ok(UserUpdate {
            password_hash,
            mobile: Some(req.mobile),
            avatar: Some(req.avatar),
            nickname: Some(req.nickname),
            introduction: Some(req.introduction),
            status: Some(req.status),
            role_ids: Some(role_ids(requested)),
        })
    }

    /// Filtered page of users for an authenticated caller
    pub async fn list_users(&self, ctx: &RequestContext, filter: UserFilter) -> Result<UserPage, AdminError> {
        ctx.actor()?;
        Ok(self.user_provider.store().list(&filter).await?)
    }

    /// Not supported yet; always fails with `NotImplemented`
    pub async fn batch_delete_user_by_ids(&self, ctx: &RequestContext, user_ids: &[i64]) -> Result<(), AdminError> {
        tracing::debug!(request_id = %ctx.request_id, count = user_ids.len(), "Batch delete requested");
        Err(AdminError::NotImplemented("batch_delete_user_by_ids"))
    }
}

fn role_ids(roles: &[Role]) -> Vec<i64> {
    roles.iter().map(|role| role.id).collect()
}
