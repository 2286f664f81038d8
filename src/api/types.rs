use serde::{Deserialize, Serialize};

/// Pagination block attached to list responses.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub limit: u64,
}

/// Uniform response envelope. Errors carry `message`, successes carry
/// `data`; list endpoints add `pagination`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: None,
        }
    }

    pub const fn paginated(data: T, total: u64, limit: u64) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: Some(Pagination { total, limit }),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            pagination: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateVehicleRequest {
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    pub region_id: i32,
}

#[derive(Debug, Serialize)]
pub struct VehicleDto {
    pub id: i32,
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    pub region_id: i32,
    pub region_name: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct RegionDto {
    pub id: i32,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct WorkshopDto {
    pub id: i32,
    pub name: String,
    pub region_id: i32,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PermissionDto {
    pub id: i32,
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub permission_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct AddWorkOrderRequest {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct AddPhotoRequest {
    pub url: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct KeyControlRequest {
    pub key_location: String,
    pub delivered_to: Option<String>,
}
