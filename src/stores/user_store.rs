use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, NotSet,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

use crate::errors::InternalError;
use crate::errors::internal::{DatabaseError, UserError};
use crate::stores::with_deadline;
use crate::types::db::{role, user, user_role};
use crate::types::internal::{NewUser, Role, User, UserFilter, UserPage, UserStatus, UserUpdate};

/// UserStore persists users and their role links
///
/// Every public method runs under the configured store timeout. Reads
/// preload roles with two batched queries (links, then roles) instead of
/// a join per user.
pub struct UserStore {
    db: DatabaseConnection,
    timeout: Duration,
}

impl UserStore {
    pub fn new(db: DatabaseConnection, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    /// Enabled user by id
    ///
    /// # Returns
    /// * `Ok(User)` - The user with roles preloaded
    /// * `Err(InternalError)` - `UserIdNotFound` if absent or disabled, or a database error
    pub async fn find_by_id(&self, id: i64) -> Result<User, InternalError> {
        with_deadline("find_user_by_id", self.timeout, async {
            let model = user::Entity::find_by_id(id)
                .filter(user::Column::Status.eq(UserStatus::Enabled.as_i32()))
                .one(&self.db)
                .await
                .map_err(|e| InternalError::database("find_user_by_id", e))?
                .ok_or(UserError::UserIdNotFound { user_id: id })?;

            load_one(&self.db, model).await
        })
        .await
    }

    /// User by id regardless of status
    pub async fn find_by_id_any_status(&self, id: i64) -> Result<User, InternalError> {
        with_deadline("find_user_by_id_any_status", self.timeout, async {
            let model = user::Entity::find_by_id(id)
                .one(&self.db)
                .await
                .map_err(|e| InternalError::database("find_user_by_id_any_status", e))?
                .ok_or(UserError::UserIdNotFound { user_id: id })?;

            load_one(&self.db, model).await
        })
        .await
    }

    /// User by username regardless of status. `None` when no such user exists.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, InternalError> {
        with_deadline("find_user_by_username", self.timeout, async {
            let model = user::Entity::find()
                .filter(user::Column::Username.eq(username))
                .one(&self.db)
                .await
                .map_err(|e| InternalError::database("find_user_by_username", e))?;

            match model {
                Some(model) => load_one(&self.db, model).await.map(Some),
                None => Ok(None),
            }
        })
        .await
    }

    /// Filtered, newest-first listing
    ///
    /// Text filters are trimmed and matched as substrings; blank ones are
    /// ignored, as is a zero status. Pagination applies only when both
    /// `page_num` and `page_size` are positive. `total` counts the filtered
    /// rows before pagination.
    pub async fn list(&self, filter: &UserFilter) -> Result<UserPage, InternalError> {
        with_deadline("list_users", self.timeout, async {
            let mut query = user::Entity::find();
            if let Some(username) = non_blank(filter.username.as_deref()) {
                query = query.filter(user::Column::Username.contains(username));
            }
            if let Some(nickname) = non_blank(filter.nickname.as_deref()) {
                query = query.filter(user::Column::Nickname.contains(nickname));
            }
            if let Some(mobile) = non_blank(filter.mobile.as_deref()) {
                query = query.filter(user::Column::Mobile.contains(mobile));
            }
            if let Some(status) = filter.status.filter(|status| *status != 0) {
                query = query.filter(user::Column::Status.eq(status));
            }

            let total = query
                .clone()
                .count(&self.db)
                .await
                .map_err(|e| InternalError::database("count_users", e))?;

            let query = query
                .order_by_desc(user::Column::CreatedAt)
                .order_by_desc(user::Column::Id);

            let query = match (filter.page_num, filter.page_size) {
                (Some(page_num), Some(page_size)) if page_num > 0 && page_size > 0 => query
                    .offset((page_num - 1).saturating_mul(page_size))
                    .limit(page_size),
                _ => query,
            };

            let models = query
                .all(&self.db)
                .await
                .map_err(|e| InternalError::database("list_users", e))?;

            let items = load_many(&self.db, models).await?;

            tracing::debug!(total, returned = items.len(), "Listed users");

            Ok(UserPage { items, total })
        })
        .await
    }

    /// Insert a user and its role links in one transaction
    ///
    /// # Returns
    /// * `Ok(User)` - The stored user with roles preloaded
    /// * `Err(InternalError)` - `DuplicateUsername` if the username is taken, or a database error
    pub async fn create(&self, new_user: NewUser) -> Result<User, InternalError> {
        with_deadline("create_user", self.timeout, async move {
            let existing = user::Entity::find()
                .filter(user::Column::Username.eq(&new_user.username))
                .one(&self.db)
                .await
                .map_err(|e| InternalError::database("check_username_exists", e))?;

            if existing.is_some() {
                return Err(UserError::DuplicateUsername {
                    username: new_user.username,
                }
                .into());
            }

            let now = Utc::now().timestamp();
            let txn = self
                .db
                .begin()
                .await
                .map_err(|e| DatabaseError::TransactionBegin { source: e })?;

            let model = user::ActiveModel {
                id: NotSet,
                username: Set(new_user.username.clone()),
                password_hash: Set(new_user.password_hash),
                mobile: Set(new_user.mobile),
                avatar: Set(new_user.avatar),
                nickname: Set(new_user.nickname),
                introduction: Set(new_user.introduction),
                status: Set(new_user.status.as_i32()),
                creator: Set(new_user.creator),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(|e| insert_error(e, &new_user.username))?;

            insert_links(&txn, model.id, &new_user.role_ids).await?;

            txn.commit()
                .await
                .map_err(|e| DatabaseError::TransactionCommit { source: e })?;

            tracing::info!(user_id = model.id, username = %model.username, creator = %model.creator, "User created");

            load_one(&self.db, model).await
        })
        .await
    }

    /// Apply an explicit field mask to a user
    ///
    /// Only `Some` fields are written; `updated_at` is always refreshed.
    /// `role_ids` replaces the whole link set inside the same transaction.
    ///
    /// # Returns
    /// * `Ok(User)` - The user as stored after commit, any status
    /// * `Err(InternalError)` - `UserIdNotFound` if no row has this id, or a database error
    pub async fn update_fields(&self, id: i64, update: UserUpdate) -> Result<User, InternalError> {
        with_deadline("update_user_fields", self.timeout, async move {
            let password_changed = update.password_hash.is_some();
            let roles_changed = update.role_ids.is_some();

            let mut query = user::Entity::update_many()
                .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
                .filter(user::Column::Id.eq(id));
            if let Some(password_hash) = update.password_hash {
                query = query.col_expr(user::Column::PasswordHash, Expr::value(password_hash));
            }
            if let Some(mobile) = update.mobile {
                query = query.col_expr(user::Column::Mobile, Expr::value(mobile));
            }
            if let Some(avatar) = update.avatar {
                query = query.col_expr(user::Column::Avatar, Expr::value(avatar));
            }
            if let Some(nickname) = update.nickname {
                query = query.col_expr(user::Column::Nickname, Expr::value(nickname));
            }
            if let Some(introduction) = update.introduction {
                query = query.col_expr(user::Column::Introduction, Expr::value(introduction));
            }
            if let Some(status) = update.status {
                query = query.col_expr(user::Column::Status, Expr::value(status.as_i32()));
            }

            let txn = self
                .db
                .begin()
                .await
                .map_err(|e| DatabaseError::TransactionBegin { source: e })?;

            let result = query
                .exec(&txn)
                .await
                .map_err(|e| InternalError::database("update_user_fields", e))?;

            if result.rows_affected == 0 {
                return Err(UserError::UserIdNotFound { user_id: id }.into());
            }

            if let Some(role_ids) = update.role_ids {
                user_role::Entity::delete_many()
                    .filter(user_role::Column::UserId.eq(id))
                    .exec(&txn)
                    .await
                    .map_err(|e| InternalError::database("delete_user_roles", e))?;

                insert_links(&txn, id, &role_ids).await?;
            }

            txn.commit()
                .await
                .map_err(|e| DatabaseError::TransactionCommit { source: e })?;

            tracing::info!(user_id = id, password_changed, roles_changed, "User updated");

            let model = user::Entity::find_by_id(id)
                .one(&self.db)
                .await
                .map_err(|e| InternalError::database("reload_updated_user", e))?
                .ok_or(UserError::UserIdNotFound { user_id: id })?;

            load_one(&self.db, model).await
        })
        .await
    }

    /// Replace only the password digest
    pub async fn update_password(&self, id: i64, password_hash: String) -> Result<User, InternalError> {
        self.update_fields(id, UserUpdate::password(password_hash)).await
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn insert_error(err: DbErr, username: &str) -> InternalError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => UserError::DuplicateUsername {
            username: username.to_string(),
        }
        .into(),
        _ => InternalError::database("insert_user", err),
    }
}

async fn insert_links<C: ConnectionTrait>(conn: &C, user_id: i64, role_ids: &[i64]) -> Result<(), InternalError> {
    let unique: BTreeSet<i64> = role_ids.iter().copied().collect();
    if unique.is_empty() {
        return Ok(());
    }

    let links = unique.into_iter().map(|role_id| user_role::ActiveModel {
        user_id: Set(user_id),
        role_id: Set(role_id),
    });

    user_role::Entity::insert_many(links)
        .exec_without_returning(conn)
        .await
        .map_err(|e| InternalError::database("insert_user_roles", e))?;

    Ok(())
}

/// Roles for each user id, ordered by rank then id
async fn roles_by_user<C: ConnectionTrait>(conn: &C, user_ids: &[i64]) -> Result<HashMap<i64, Vec<Role>>, InternalError> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let links = user_role::Entity::find()
        .filter(user_role::Column::UserId.is_in(user_ids.iter().copied()))
        .all(conn)
        .await
        .map_err(|e| InternalError::database("load_user_role_links", e))?;

    let role_ids: BTreeSet<i64> = links.iter().map(|link| link.role_id).collect();
    if role_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let roles = role::Entity::find()
        .filter(role::Column::Id.is_in(role_ids))
        .all(conn)
        .await
        .map_err(|e| InternalError::database("load_user_roles", e))?
        .into_iter()
        .map(|model| Role::try_from(model).map(|role| (role.id, role)))
        .collect::<Result<HashMap<i64, Role>, InternalError>>()?;

    let mut by_user: HashMap<i64, Vec<Role>> = HashMap::new();
    for link in links {
        if let Some(role) = roles.get(&link.role_id) {
            by_user.entry(link.user_id).or_default().push(role.clone());
        }
    }
    for roles in by_user.values_mut() {
        roles.sort_by_key(|role| (role.sort, role.id));
    }

    Ok(by_user)
}

async fn load_one<C: ConnectionTrait>(conn: &C, model: user::Model) -> Result<User, InternalError> {
    let mut roles = roles_by_user(conn, &[model.id]).await?;
    let roles = roles.remove(&model.id).unwrap_or_default();
    User::from_parts(model, roles)
}

async fn load_many<C: ConnectionTrait>(conn: &C, models: Vec<user::Model>) -> Result<Vec<User>, InternalError> {
    let ids: Vec<i64> = models.iter().map(|model| model.id).collect();
    let mut roles = roles_by_user(conn, &ids).await?;

    models
        .into_iter()
        .map(|model| {
            let user_roles = roles.remove(&model.id).unwrap_or_default();
            User::from_parts(model, user_roles)
        })
        .collect()
}
