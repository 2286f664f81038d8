use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::auth::require_permission;
use super::{ApiError, ApiResponse, AppState};
use crate::services::auth_service::Principal;
use crate::services::entry_service::DashboardStats;

/// GET /dashboard/stats
/// All counters come from one snapshot, so they are consistent with
/// each other even under concurrent writes.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<DashboardStats>>, ApiError> {
    require_permission(&state, &principal, "dashboard", "read").await?;

    let stats = state.entry_service().dashboard().await?;

    Ok(Json(ApiResponse::success(stats)))
}
