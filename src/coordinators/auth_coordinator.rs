use std::sync::Arc;

use crate::app_data::AppData;
use crate::errors::AdminError;
use crate::providers::{CredentialHasher, UserProvider};
use crate::types::dto::auth::{ChangePasswordRequest, LoginRequest};
use crate::types::internal::{RequestContext, User};

/// Outcome of a login attempt that reached credential comparison
#[derive(Debug)]
pub enum LoginResponse {
    Success { user: User },
    /// Account and roles are eligible but the password did not match
    WrongPassword { user: User },
}

impl LoginResponse {
    /// Collapse into the authenticated user, or `AdminError::WrongPassword`
    pub fn into_result(self) -> Result<User, AdminError> {
        match self {
            LoginResponse::Success { user } => Ok(user),
            LoginResponse::WrongPassword { .. } => Err(AdminError::WrongPassword),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LoginResponse::Success { .. })
    }
}

/// Auth coordinator: login, current-user resolution and password change
pub struct AuthCoordinator {
    user_provider: Arc<UserProvider>,
    hasher: Arc<dyn CredentialHasher>,
}

impl AuthCoordinator {
    /// Create AuthCoordinator from AppData
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            user_provider: app_data.user_provider.clone(),
            hasher: app_data.hasher.clone(),
        }
    }

    /// Orchestrate the login workflow
    ///
    /// 1. Look up the user by username (any status)
    /// 2. Reject a disabled account
    /// 3. Reject an account whose roles are all disabled
    /// 4. Compare the password against the stored digest
    ///
    /// Eligibility is checked before the password, so a disabled account is
    /// reported as such even with correct credentials.
    ///
    /// # Returns
    /// * `Ok(LoginResponse)` - `Success` or `WrongPassword`
    /// * `Err(AdminError)` - `UserNotFound`, `UserDisabled`, `AllRolesDisabled`, or a store/crypto failure
    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, AdminError> {
        // Step 1: Direct store lookup
        let user = self
            .user_provider
            .user_by_username(&req.username)
            .await?
            .ok_or_else(|| AdminError::UserNotFound(req.username.clone()))?;

        // Step 2: Account status
        if !user.is_enabled() {
            tracing::debug!(user_id = user.id, "Login rejected, user disabled");
            return Err(AdminError::UserDisabled);
        }

        // Step 3: At least one enabled role
        if !user.has_enabled_role() {
            tracing::debug!(user_id = user.id, "Login rejected, no enabled role");
            return Err(AdminError::AllRolesDisabled);
        }

        // Step 4: Credential comparison
        if self.hasher.compare(&user.password_hash, &req.password)? {
            tracing::info!(user_id = user.id, "Login succeeded");
            Ok(LoginResponse::Success { user })
        } else {
            tracing::debug!(user_id = user.id, "Login rejected, wrong password");
            Ok(LoginResponse::WrongPassword { user })
        }
    }

    /// Identity of the request's actor, cache-first
    pub async fn get_current_user(&self, ctx: &RequestContext) -> Result<User, AdminError> {
        self.user_provider.current_user(ctx).await
    }

    /// Enabled user by id for an authenticated caller. Refreshes the cache entry.
    pub async fn get_user_by_id(&self, ctx: &RequestContext, user_id: i64) -> Result<User, AdminError> {
        ctx.actor()?;
        self.user_provider.user_by_id(user_id).await
    }

    /// Orchestrate the password change workflow
    ///
    /// 1. Re-read the actor's current digest from the store
    /// 2. Compare the old password; mismatch stops here with nothing written
    /// 3. Hash and persist the new password
    /// 4. Refresh the actor's cache entry before returning
    pub async fn change_password(&self, ctx: &RequestContext, req: &ChangePasswordRequest) -> Result<(), AdminError> {
        let actor = ctx.actor()?;

        // Step 1: The cached digest may be stale, read the store
        let stored = self
            .user_provider
            .user_by_username(&actor.username)
            .await?
            .filter(|stored| stored.id == actor.id)
            .ok_or_else(|| AdminError::NotFound(actor.username.clone()))?;

        // Step 2: Verify old password
        if !self.hasher.compare(&stored.password_hash, &req.old_password)? {
            tracing::debug!(request_id = %ctx.request_id, user_id = stored.id, "Password change rejected, wrong old password");
            return Err(AdminError::WrongOldPassword);
        }

        // Step 3: Persist new digest
        let digest = self.hasher.hash(&req.new_password)?;
        let committed = self.user_provider.store().update_password(stored.id, digest).await?;

        // Step 4: Cache coherence
        let fresh = self.user_provider.refresh(committed).await;

        tracing::info!(request_id = %ctx.request_id, user_id = fresh.id, "Password changed");

        Ok(())
    }
}
