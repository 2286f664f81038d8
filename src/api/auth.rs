use axum::{
    Extension, Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::services::auth_service::{LoginResult, Principal, TokenPair, UserInfo};
use crate::services::permission_service::{Decision, DenyReason};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware: requires a valid `Authorization: Bearer`
/// access token and attaches the [`Principal`] to the request.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    let principal = state.auth_service().verify_access(&token).await?;

    tracing::Span::current().record("user_id", principal.user_id);

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("Authorization")?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?;
    Some(token.trim().to_string())
}

/// Authorization check used by every protected handler. Default deny:
/// an unknown role and a missing grant both end in 403.
pub async fn require_permission(
    state: &AppState,
    principal: &Principal,
    resource: &str,
    action: &str,
) -> Result<(), ApiError> {
    let decision = state
        .permission_service()
        .authorize(principal.role_id, resource, action)
        .await?;

    match decision {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            tracing::debug!(
                user_id = principal.user_id,
                role_id = principal.role_id,
                resource,
                action,
                ?reason,
                "Authorization denied"
            );
            match reason {
                DenyReason::NoRole | DenyReason::NotGranted => {
                    Err(ApiError::forbidden(resource, action))
                }
            }
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with email and password, returns a token pair on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    tracing::info!(user_id = result.user.id, "User logged in");

    Ok(Json(ApiResponse::success(result)))
}

/// POST /auth/refresh
/// Redeem a refresh token for a fresh token pair. Single-use: the old
/// refresh token is invalid afterwards.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    if payload.refresh_token.is_empty() {
        return Err(ApiError::validation("Refresh token is required"));
    }

    let tokens = state
        .auth_service()
        .rotate_refresh(&payload.refresh_token)
        .await?;

    Ok(Json(ApiResponse::success(tokens)))
}

/// POST /auth/logout
/// Revoke every refresh token of the authenticated user
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.auth_service().logout(principal.user_id).await?;

    tracing::info!(user_id = principal.user_id, "User logged out");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Logged out".to_string(),
    })))
}

/// GET /auth/me
/// Get current user information
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state
        .auth_service()
        .get_user_info(principal.user_id)
        .await?;

    Ok(Json(ApiResponse::success(user)))
}

/// PUT /auth/password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth_service()
        .change_password(
            principal.user_id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    tracing::info!(user_id = principal.user_id, "Password changed");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated successfully".to_string(),
    })))
}
