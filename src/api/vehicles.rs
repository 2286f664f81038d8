use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::require_permission;
use super::validation::{validate_id, validate_license_plate};
use super::{ApiError, ApiResponse, AppState, CreateVehicleRequest, VehicleDto};
use crate::db::CreateVehicleOutcome;
use crate::services::auth_service::Principal;

/// GET /vehicles
pub async fn list_vehicles(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<VehicleDto>>>, ApiError> {
    require_permission(&state, &principal, "vehicles", "read").await?;

    let rows = state.store().list_vehicles().await?;

    let vehicles = rows
        .into_iter()
        .map(|(vehicle, region)| VehicleDto {
            id: vehicle.id,
            license_plate: vehicle.license_plate,
            brand: vehicle.brand,
            model: vehicle.model,
            region_id: vehicle.region_id,
            region_name: region.map(|r| r.name),
            status: vehicle.status,
        })
        .collect();

    Ok(Json(ApiResponse::success(vehicles)))
}

/// GET /vehicles/{id}
pub async fn get_vehicle(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<VehicleDto>>, ApiError> {
    require_permission(&state, &principal, "vehicles", "read").await?;
    let id = validate_id(id, "vehicle")?;

    let vehicle = state
        .store()
        .get_vehicle(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Vehicle", id))?;

    Ok(Json(ApiResponse::success(VehicleDto {
        id: vehicle.id,
        license_plate: vehicle.license_plate,
        brand: vehicle.brand,
        model: vehicle.model,
        region_id: vehicle.region_id,
        region_name: None,
        status: vehicle.status,
    })))
}

/// POST /vehicles
/// Register a vehicle; duplicate plates get 409
pub async fn create_vehicle(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleDto>>, ApiError> {
    require_permission(&state, &principal, "vehicles", "create").await?;

    let plate = validate_license_plate(&payload.license_plate)?;
    if payload.brand.trim().is_empty() {
        return Err(ApiError::validation("Brand is required"));
    }
    if payload.model.trim().is_empty() {
        return Err(ApiError::validation("Model is required"));
    }

    let outcome = state
        .store()
        .create_vehicle(plate, payload.brand.trim(), payload.model.trim(), payload.region_id)
        .await?;

    match outcome {
        CreateVehicleOutcome::Created(vehicle) => {
            tracing::info!(vehicle_id = vehicle.id, plate = %vehicle.license_plate, "Vehicle registered");
            Ok(Json(ApiResponse::success(VehicleDto {
                id: vehicle.id,
                license_plate: vehicle.license_plate,
                brand: vehicle.brand,
                model: vehicle.model,
                region_id: vehicle.region_id,
                region_name: None,
                status: vehicle.status,
            })))
        }
        CreateVehicleOutcome::DuplicatePlate => Err(ApiError::Conflict(format!(
            "A vehicle with plate {plate} already exists"
        ))),
        CreateVehicleOutcome::UnknownRegion => Err(ApiError::not_found("Region", payload.region_id)),
    }
}
