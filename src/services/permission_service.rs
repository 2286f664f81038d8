//! Domain service for role-based authorization.
//!
//! Permissions are flat `(resource, action)` pairs granted to roles.
//! There is no hierarchy and no wildcard: a pair is either granted or it
//! is not, and the default answer is deny.

use serde::Serialize;
use thiserror::Error;

use crate::entities::{permissions, roles};

/// Errors specific to permission operations.
#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("Role not found")]
    RoleNotFound,

    #[error("Permission not found")]
    PermissionNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for PermissionError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for PermissionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Why an authorization check said no.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The caller's role id does not exist.
    NoRole,
    /// The role exists but the pair was never granted.
    NotGranted,
}

/// Authorization verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Grant/revoke result for the role administration endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantResult {
    Granted,
    AlreadyGranted,
    Revoked,
    NotGranted,
}

/// Domain service trait for authorization.
#[async_trait::async_trait]
pub trait PermissionService: Send + Sync {
    /// Decides whether a role may perform `action` on `resource`.
    /// Never errors on an unknown role; that is a [`DenyReason::NoRole`] deny.
    async fn authorize(
        &self,
        role_id: i32,
        resource: &str,
        action: &str,
    ) -> Result<Decision, PermissionError>;

    /// Lists all roles.
    async fn list_roles(&self) -> Result<Vec<roles::Model>, PermissionError>;

    /// Lists the full permission catalog.
    async fn permission_catalog(&self) -> Result<Vec<permissions::Model>, PermissionError>;

    /// Lists the permissions granted to a role.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError::RoleNotFound`] for an unknown role.
    async fn role_grants(&self, role_id: i32) -> Result<Vec<permissions::Model>, PermissionError>;

    /// Grants a permission to a role. Idempotent.
    async fn grant(&self, role_id: i32, permission_id: i32)
        -> Result<GrantResult, PermissionError>;

    /// Revokes a permission from a role. Idempotent.
    async fn revoke(
        &self,
        role_id: i32,
        permission_id: i32,
    ) -> Result<GrantResult, PermissionError>;
}
