use std::collections::HashSet;

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
};

use crate::entities::{permissions, role_permissions, roles};

/// Outcome of a grant attempt, surfaced so callers can distinguish
/// an idempotent re-grant from an actual change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    Granted,
    AlreadyGranted,
    UnknownRole,
    UnknownPermission,
}

#[derive(Debug, FromQueryResult)]
struct PermissionPair {
    resource: String,
    action: String,
}

pub struct RoleRepository {
    conn: DatabaseConnection,
}

impl RoleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, role_id: i32) -> Result<Option<roles::Model>> {
        roles::Entity::find_by_id(role_id)
            .one(&self.conn)
            .await
            .context("Failed to query role")
    }

    pub async fn list(&self) -> Result<Vec<roles::Model>> {
        roles::Entity::find()
            .order_by_asc(roles::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list roles")
    }

    pub async fn permission_catalog(&self) -> Result<Vec<permissions::Model>> {
        permissions::Entity::find()
            .order_by_asc(permissions::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list permissions")
    }

    /// Materialize the `(resource, action)` pairs granted to a role.
    /// A role with zero grants yields an empty set, not an error.
    pub async fn permission_pairs(&self, role_id: i32) -> Result<HashSet<(String, String)>> {
        let rows = role_permissions::Entity::find()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .join(JoinType::InnerJoin, role_permissions::Relation::Permission.def())
            .select_only()
            .column(permissions::Column::Resource)
            .column(permissions::Column::Action)
            .into_model::<PermissionPair>()
            .all(&self.conn)
            .await
            .context("Failed to query role permission pairs")?;

        Ok(rows.into_iter().map(|p| (p.resource, p.action)).collect())
    }

    /// Permissions granted to a role, full rows for the audit endpoint.
    pub async fn granted_permissions(&self, role_id: i32) -> Result<Vec<permissions::Model>> {
        let rows = role_permissions::Entity::find()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .find_also_related(permissions::Entity)
            .all(&self.conn)
            .await
            .context("Failed to query granted permissions")?;

        let mut perms: Vec<permissions::Model> =
            rows.into_iter().filter_map(|(_, p)| p).collect();
        perms.sort_by_key(|p| p.id);
        Ok(perms)
    }

    pub async fn grant(&self, role_id: i32, permission_id: i32) -> Result<GrantOutcome> {
        if self.get(role_id).await?.is_none() {
            return Ok(GrantOutcome::UnknownRole);
        }
        if permissions::Entity::find_by_id(permission_id)
            .one(&self.conn)
            .await
            .context("Failed to query permission")?
            .is_none()
        {
            return Ok(GrantOutcome::UnknownPermission);
        }

        let active = role_permissions::ActiveModel {
            role_id: Set(role_id),
            permission_id: Set(permission_id),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(_) => Ok(GrantOutcome::Granted),
            // The unique pair index makes a repeat grant a no-op
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(GrantOutcome::AlreadyGranted)
            }
            Err(err) => Err(err).context("Failed to insert role grant"),
        }
    }

    /// Returns `true` if a grant row was actually removed.
    pub async fn revoke(&self, role_id: i32, permission_id: i32) -> Result<bool> {
        let result = role_permissions::Entity::delete_many()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .filter(role_permissions::Column::PermissionId.eq(permission_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete role grant")?;

        Ok(result.rows_affected > 0)
    }
}
