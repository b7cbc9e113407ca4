use std::collections::BTreeSet;
use std::time::Duration;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryFilter, QueryOrder, Set, SqlErr,
};

use crate::errors::InternalError;
use crate::errors::internal::RoleError;
use crate::stores::with_deadline;
use crate::types::db::role;
use crate::types::internal::{Role, RoleStatus};

/// RoleStore resolves role ids to roles. Roles are read-only to the admin flows.
pub struct RoleStore {
    db: DatabaseConnection,
    timeout: Duration,
}

impl RoleStore {
    pub fn new(db: DatabaseConnection, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    /// Look up roles by id, regardless of their status
    ///
    /// Duplicate ids are collapsed. The result is ordered by rank, then id.
    ///
    /// # Returns
    /// * `Ok(Vec<Role>)` - One role per distinct id (empty for an empty input)
    /// * `Err(InternalError)` - `RoleLookupFailed` listing every unresolved id, or a database error
    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Role>, InternalError> {
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        with_deadline("find_roles_by_ids", self.timeout, async {
            let models = role::Entity::find()
                .filter(role::Column::Id.is_in(wanted.iter().copied()))
                .order_by_asc(role::Column::Sort)
                .order_by_asc(role::Column::Id)
                .all(&self.db)
                .await
                .map_err(|e| InternalError::database("find_roles_by_ids", e))?;

            let found: BTreeSet<i64> = models.iter().map(|model| model.id).collect();
            let missing: Vec<i64> = wanted.difference(&found).copied().collect();
            if !missing.is_empty() {
                tracing::debug!(?missing, "Role lookup left ids unresolved");
                return Err(RoleError::RoleLookupFailed { missing }.into());
            }

            models.into_iter().map(Role::try_from).collect()
        })
        .await
    }

    /// Insert a role. Used by bootstrap and tests; the admin flows never write roles.
    pub async fn create(&self, name: &str, sort: i32, status: RoleStatus) -> Result<Role, InternalError> {
        with_deadline("create_role", self.timeout, async {
            let model = role::ActiveModel {
                id: NotSet,
                name: Set(name.to_string()),
                sort: Set(sort),
                status: Set(status.as_i32()),
                created_at: Set(Utc::now().timestamp()),
            }
            .insert(&self.db)
            .await
            .map_err(|e| insert_error(e, name))?;

            tracing::info!(role_id = model.id, name = %model.name, sort = model.sort, "Role created");

            Role::try_from(model)
        })
        .await
    }

    /// Look up a role by its unique name
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Role>, InternalError> {
        with_deadline("find_role_by_name", self.timeout, async {
            let model = role::Entity::find()
                .filter(role::Column::Name.eq(name))
                .one(&self.db)
                .await
                .map_err(|e| InternalError::database("find_role_by_name", e))?;

            model.map(Role::try_from).transpose()
        })
        .await
    }
}

fn insert_error(err: DbErr, name: &str) -> InternalError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => RoleError::DuplicateRoleName { name: name.to_string() }.into(),
        _ => InternalError::database("create_role", err),
    }
}
