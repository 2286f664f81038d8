use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::require_permission;
use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, GrantRequest, PermissionDto, RoleDto};
use crate::services::auth_service::Principal;
use crate::services::permission_service::GrantResult;

fn permission_dto(p: crate::entities::permissions::Model) -> PermissionDto {
    PermissionDto {
        id: p.id,
        resource: p.resource,
        action: p.action,
        description: p.description,
    }
}

/// GET /roles
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<RoleDto>>>, ApiError> {
    require_permission(&state, &principal, "roles", "read").await?;

    let roles = state
        .permission_service()
        .list_roles()
        .await?
        .into_iter()
        .map(|r| RoleDto {
            id: r.id,
            name: r.name,
            description: r.description,
        })
        .collect();

    Ok(Json(ApiResponse::success(roles)))
}

/// GET /permissions
/// Full permission catalog
pub async fn list_permissions(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<PermissionDto>>>, ApiError> {
    require_permission(&state, &principal, "roles", "read").await?;

    let permissions = state
        .permission_service()
        .permission_catalog()
        .await?
        .into_iter()
        .map(permission_dto)
        .collect();

    Ok(Json(ApiResponse::success(permissions)))
}

/// GET /roles/{id}/permissions
/// Audit view: what a role is currently granted
pub async fn role_grants(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<PermissionDto>>>, ApiError> {
    require_permission(&state, &principal, "roles", "read").await?;
    let id = validate_id(id, "role")?;

    let permissions = state
        .permission_service()
        .role_grants(id)
        .await?
        .into_iter()
        .map(permission_dto)
        .collect();

    Ok(Json(ApiResponse::success(permissions)))
}

/// POST /roles/{id}/permissions
/// Grant a permission to a role; takes effect on the next check
pub async fn grant_permission(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
    Json(payload): Json<GrantRequest>,
) -> Result<Json<ApiResponse<GrantResult>>, ApiError> {
    require_permission(&state, &principal, "roles", "update").await?;
    let id = validate_id(id, "role")?;

    let result = state
        .permission_service()
        .grant(id, payload.permission_id)
        .await?;

    tracing::info!(
        role_id = id,
        permission_id = payload.permission_id,
        ?result,
        "Permission grant requested"
    );

    Ok(Json(ApiResponse::success(result)))
}

/// DELETE /roles/{id}/permissions/{permission_id}
pub async fn revoke_permission(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path((id, permission_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<GrantResult>>, ApiError> {
    require_permission(&state, &principal, "roles", "update").await?;
    let id = validate_id(id, "role")?;

    let result = state
        .permission_service()
        .revoke(id, permission_id)
        .await?;

    tracing::info!(
        role_id = id,
        permission_id,
        ?result,
        "Permission revoke requested"
    );

    Ok(Json(ApiResponse::success(result)))
}
