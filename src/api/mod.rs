use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod dashboard;
mod entries;
mod error;
mod observability;
mod regions;
mod roles;
mod types;
mod validation;
mod vehicles;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn permission_service(&self) -> &Arc<dyn crate::services::PermissionService> {
        &self.shared.permission_service
    }

    #[must_use]
    pub fn entry_service(&self) -> &Arc<dyn crate::services::EntryService> {
        &self.shared.entry_service
    }

    #[must_use]
    pub fn audit_service(&self) -> &Arc<dyn crate::services::AuditService> {
        &self.shared.audit_service
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = {
        let config = state.config().read().await;
        config.server.cors_allowed_origins.clone()
    };

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
}

/// GET /health
/// Liveness probe, unauthenticated
async fn health(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> axum::Json<ApiResponse<serde_json::Value>> {
    let database = if state.store().ping().await.is_ok() {
        "up"
    } else {
        "down"
    };

    axum::Json(ApiResponse::success(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "database": database,
    })))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/password", put(auth::change_password))
        .route("/dashboard/stats", get(dashboard::get_stats))
        .route("/vehicle-entries", get(entries::list_entries))
        .route("/vehicle-entries", post(entries::open_entry))
        .route("/vehicle-entries/active", get(entries::active_entries))
        .route("/vehicle-entries/{id}", get(entries::get_entry))
        .route("/vehicle-entries/{id}/exit", post(entries::close_entry))
        .route("/vehicle-entries/{id}/work-orders", post(entries::add_work_order))
        .route("/vehicle-entries/{id}/photos", post(entries::add_photo))
        .route("/vehicle-entries/{id}/key-control", put(entries::set_key_control))
        .route("/vehicles", get(vehicles::list_vehicles))
        .route("/vehicles", post(vehicles::create_vehicle))
        .route("/vehicles/{id}", get(vehicles::get_vehicle))
        .route("/regions", get(regions::list_regions))
        .route("/workshops", get(regions::list_workshops))
        .route("/roles", get(roles::list_roles))
        .route("/roles/{id}/permissions", get(roles::role_grants))
        .route("/roles/{id}/permissions", post(roles::grant_permission))
        .route(
            "/roles/{id}/permissions/{permission_id}",
            delete(roles::revoke_permission),
        )
        .route("/permissions", get(roles::list_permissions))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
