// Bootstrap command implementation
// Creates the top-rank role and the first user during system setup

use crate::app_data::AppData;
use crate::errors::AdminError;
use crate::providers::generate_secure_password;
use crate::types::internal::{NewUser, Role, RoleStatus, User, UserStatus};

const TOP_ROLE_NAME: &str = "superadmin";
const TOP_ROLE_SORT: i32 = 0;
const BOOTSTRAP_CREATOR: &str = "system";

/// Create a role from the command line
///
/// Fails with `DuplicateRoleName` when a role of this name exists.
pub async fn create_role(app_data: &AppData, name: &str, sort: i32) -> Result<Role, AdminError> {
    let role = app_data.role_store.create(name, sort, RoleStatus::Enabled).await?;
    println!("Created role '{}' (id {}, sort {})", role.name, role.id, role.sort);

    Ok(role)
}

/// Bootstrap the first administrator
///
/// Reuses the top-rank role if it already exists. Fails with
/// `DuplicateUsername` when the user is already present.
///
/// # Arguments
/// * `username` - Username of the first administrator
/// * `password` - Plaintext password; a secure one is generated when `None`
pub async fn bootstrap_system(app_data: &AppData, username: &str, password: Option<String>) -> Result<User, AdminError> {
    println!("\n=== Identity Admin Bootstrap ===\n");

    let role = match app_data.role_store.find_by_name(TOP_ROLE_NAME).await? {
        Some(role) => role,
        None => {
            app_data
                .role_store
                .create(TOP_ROLE_NAME, TOP_ROLE_SORT, RoleStatus::Enabled)
                .await?
        }
    };

    let (password, generated) = match password.filter(|password| !password.is_empty()) {
        Some(password) => (password, false),
        None => (generate_secure_password(), true),
    };

    let new_user = NewUser {
        username: username.to_string(),
        password_hash: app_data.hasher.hash(&password)?,
        mobile: String::new(),
        avatar: String::new(),
        nickname: String::new(),
        introduction: String::new(),
        status: UserStatus::Enabled,
        creator: BOOTSTRAP_CREATOR.to_string(),
        role_ids: vec![role.id],
    };
    let user = app_data.user_store.create(new_user).await?;

    tracing::info!(user_id = user.id, role_id = role.id, "Bootstrap user created");

    println!("Created user '{}' with role '{}'", user.username, role.name);
    if generated {
        println!("\nGenerated password (shown once, store it now):\n{}\n", password);
    }

    Ok(user)
}
