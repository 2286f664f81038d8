//! `SeaORM` implementation of the `PermissionService` trait.
//!
//! Materialized grant sets are cached per role and invalidated whenever a
//! grant or revoke goes through this service.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::db::{GrantOutcome, Store};
use crate::entities::{permissions, roles};
use crate::services::permission_service::{
    Decision, DenyReason, GrantResult, PermissionError, PermissionService,
};

type GrantSet = Arc<HashSet<(String, String)>>;

pub struct SeaOrmPermissionService {
    store: Store,
    cache: RwLock<HashMap<i32, GrantSet>>,
}

impl SeaOrmPermissionService {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Grant set for a role, from cache or freshly materialized.
    /// Returns `None` when the role does not exist.
    async fn grant_set(&self, role_id: i32) -> Result<Option<GrantSet>, PermissionError> {
        if let Some(set) = self.cache.read().await.get(&role_id) {
            return Ok(Some(Arc::clone(set)));
        }

        if self.store.get_role(role_id).await?.is_none() {
            return Ok(None);
        }

        let pairs = self.store.role_permission_pairs(role_id).await?;
        let set: GrantSet = Arc::new(pairs);

        self.cache.write().await.insert(role_id, Arc::clone(&set));
        debug!(role_id, grants = set.len(), "Materialized permission set");

        Ok(Some(set))
    }

    async fn invalidate(&self, role_id: i32) {
        self.cache.write().await.remove(&role_id);
    }
}

#[async_trait]
impl PermissionService for SeaOrmPermissionService {
    async fn authorize(
        &self,
        role_id: i32,
        resource: &str,
        action: &str,
    ) -> Result<Decision, PermissionError> {
        let Some(set) = self.grant_set(role_id).await? else {
            return Ok(Decision::Deny(DenyReason::NoRole));
        };

        if set.contains(&(resource.to_string(), action.to_string())) {
            Ok(Decision::Allow)
        } else {
            Ok(Decision::Deny(DenyReason::NotGranted))
        }
    }

    async fn list_roles(&self) -> Result<Vec<roles::Model>, PermissionError> {
        Ok(self.store.list_roles().await?)
    }

    async fn permission_catalog(&self) -> Result<Vec<permissions::Model>, PermissionError> {
        Ok(self.store.permission_catalog().await?)
    }

    async fn role_grants(&self, role_id: i32) -> Result<Vec<permissions::Model>, PermissionError> {
        if self.store.get_role(role_id).await?.is_none() {
            return Err(PermissionError::RoleNotFound);
        }

        Ok(self.store.role_granted_permissions(role_id).await?)
    }

    async fn grant(
        &self,
        role_id: i32,
        permission_id: i32,
    ) -> Result<GrantResult, PermissionError> {
        let outcome = self.store.grant_permission(role_id, permission_id).await?;

        match outcome {
            GrantOutcome::Granted => {
                self.invalidate(role_id).await;
                Ok(GrantResult::Granted)
            }
            GrantOutcome::AlreadyGranted => Ok(GrantResult::AlreadyGranted),
            GrantOutcome::UnknownRole => Err(PermissionError::RoleNotFound),
            GrantOutcome::UnknownPermission => Err(PermissionError::PermissionNotFound),
        }
    }

    async fn revoke(
        &self,
        role_id: i32,
        permission_id: i32,
    ) -> Result<GrantResult, PermissionError> {
        if self.store.get_role(role_id).await?.is_none() {
            return Err(PermissionError::RoleNotFound);
        }

        let removed = self.store.revoke_permission(role_id, permission_id).await?;

        if removed {
            self.invalidate(role_id).await;
            Ok(GrantResult::Revoked)
        } else {
            Ok(GrantResult::NotGranted)
        }
    }
}
