use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::auth::require_permission;
use super::{ApiError, ApiResponse, AppState, RegionDto, WorkshopDto};
use crate::services::auth_service::Principal;

/// GET /regions
pub async fn list_regions(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<RegionDto>>>, ApiError> {
    require_permission(&state, &principal, "regions", "read").await?;

    let regions = state
        .store()
        .list_regions()
        .await?
        .into_iter()
        .map(|r| RegionDto {
            id: r.id,
            name: r.name,
            code: r.code,
        })
        .collect();

    Ok(Json(ApiResponse::success(regions)))
}

/// GET /workshops
pub async fn list_workshops(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<WorkshopDto>>>, ApiError> {
    require_permission(&state, &principal, "workshops", "read").await?;

    let workshops = state
        .store()
        .list_workshops()
        .await?
        .into_iter()
        .map(|w| WorkshopDto {
            id: w.id,
            name: w.name,
            region_id: w.region_id,
            address: w.address,
        })
        .collect();

    Ok(Json(ApiResponse::success(workshops)))
}
