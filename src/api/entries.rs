use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::auth::require_permission;
use super::validation::{validate_id, validate_limit};
use super::{
    AddPhotoRequest, AddWorkOrderRequest, ApiError, ApiResponse, AppState, KeyControlRequest,
};
use crate::entities::{entry_photos, key_controls, work_orders};
use crate::services::auth_service::Principal;
use crate::services::entry_service::{
    EntryDetailInfo, EntryInfo, EntryListQuery, OpenEntryInput,
};

const RESOURCE: &str = "vehicle-entries";

/// GET /vehicle-entries
/// Paginated listing with optional status / vehicle / workshop / date-from filters
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<EntryListQuery>,
) -> Result<Json<ApiResponse<Vec<EntryInfo>>>, ApiError> {
    require_permission(&state, &principal, RESOURCE, "read").await?;

    if let Some(limit) = query.limit {
        validate_limit(limit)?;
    }

    let page = state.entry_service().list(&query).await?;

    Ok(Json(ApiResponse::paginated(
        page.entries,
        page.total,
        page.limit,
    )))
}

/// GET /vehicle-entries/active
/// Vehicles currently inside, oldest first
pub async fn active_entries(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<EntryInfo>>>, ApiError> {
    require_permission(&state, &principal, RESOURCE, "read").await?;

    let entries = state.entry_service().active().await?;

    Ok(Json(ApiResponse::success(entries)))
}

/// GET /vehicle-entries/{id}
/// Entry detail with work orders, photos and key control
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<EntryDetailInfo>>, ApiError> {
    require_permission(&state, &principal, RESOURCE, "read").await?;
    let id = validate_id(id, "entry")?;

    let detail = state.entry_service().get_detail(id).await?;

    Ok(Json(ApiResponse::success(detail)))
}

/// POST /vehicle-entries
/// Register a vehicle arrival
pub async fn open_entry(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<OpenEntryInput>,
) -> Result<Json<ApiResponse<EntryInfo>>, ApiError> {
    require_permission(&state, &principal, RESOURCE, "create").await?;

    let entry = state
        .entry_service()
        .open(payload, principal.user_id)
        .await?;

    Ok(Json(ApiResponse::success(entry)))
}

/// POST /vehicle-entries/{id}/exit
/// Register the vehicle exit; idempotence conflicts get 409
pub async fn close_entry(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<EntryInfo>>, ApiError> {
    require_permission(&state, &principal, RESOURCE, "update").await?;
    let id = validate_id(id, "entry")?;

    let entry = state.entry_service().close(id).await?;

    Ok(Json(ApiResponse::success(entry)))
}

/// POST /vehicle-entries/{id}/work-orders
pub async fn add_work_order(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
    Json(payload): Json<AddWorkOrderRequest>,
) -> Result<Json<ApiResponse<work_orders::Model>>, ApiError> {
    require_permission(&state, &principal, "work-orders", "create").await?;
    let id = validate_id(id, "entry")?;

    let order = state
        .entry_service()
        .add_work_order(id, &payload.description)
        .await?;

    Ok(Json(ApiResponse::success(order)))
}

/// POST /vehicle-entries/{id}/photos
pub async fn add_photo(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
    Json(payload): Json<AddPhotoRequest>,
) -> Result<Json<ApiResponse<entry_photos::Model>>, ApiError> {
    require_permission(&state, &principal, RESOURCE, "update").await?;
    let id = validate_id(id, "entry")?;

    let photo = state
        .entry_service()
        .add_photo(id, &payload.url, payload.description.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(photo)))
}

/// PUT /vehicle-entries/{id}/key-control
/// Record or update key custody for an open entry
pub async fn set_key_control(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
    Json(payload): Json<KeyControlRequest>,
) -> Result<Json<ApiResponse<key_controls::Model>>, ApiError> {
    require_permission(&state, &principal, RESOURCE, "update").await?;
    let id = validate_id(id, "entry")?;

    let key = state
        .entry_service()
        .set_key_control(id, &payload.key_location, payload.delivered_to.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(key)))
}
