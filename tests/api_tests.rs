use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use fleetgate::config::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Seeded by the initial migration (must match m20250301_initial.rs)
const ADMIN_EMAIL: &str = "admin@fleetgate.local";
const DEFAULT_PASSWORD: &str = "password";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let state = fleetgate::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    fleetgate::api::router(state).await
}

async fn login(app: &Router, email: &str, password: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"email": email, "password": password}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn login_token(app: &Router, email: &str, password: &str) -> String {
    let body = login(app, email, password).await;
    body["data"]["access_token"]
        .as_str()
        .expect("login response missing access_token")
        .to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body_json["data"]["status"], "ok");
    assert_eq!(body_json["data"]["database"], "up");
}

#[tokio::test]
async fn test_auth_required() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header("Authorization", "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"email": ADMIN_EMAIL, "password": "wrong"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body_json["success"], serde_json::json!(false));
}

#[tokio::test]
async fn test_login_and_me() {
    let app = spawn_app().await;

    let body = login(&app, ADMIN_EMAIL, DEFAULT_PASSWORD).await;
    assert_eq!(body["success"], serde_json::json!(true));
    assert!(body["data"]["access_token"].is_string());
    assert!(body["data"]["refresh_token"].is_string());
    assert_eq!(body["data"]["user"]["email"], ADMIN_EMAIL);

    let token = body["data"]["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body_json["data"]["email"], ADMIN_EMAIL);
    assert_eq!(body_json["data"]["role_id"], serde_json::json!(1));
}

#[tokio::test]
async fn test_refresh_token_is_single_use() {
    let app = spawn_app().await;

    let body = login(&app, ADMIN_EMAIL, DEFAULT_PASSWORD).await;
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let refresh_request = |token: String| {
        Request::builder()
            .method("POST")
            .uri("/api/auth/refresh")
            .header("Content-Type", "application/json")
            .body(Body::from(
                serde_json::json!({"refresh_token": token}).to_string(),
            ))
            .unwrap()
    };

    let response = app.clone().oneshot(refresh_request(refresh.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let rotated = body_json["data"]["refresh_token"].as_str().unwrap();
    assert_ne!(rotated, refresh);

    // The consumed token must not work a second time
    let response = app.clone().oneshot(refresh_request(refresh)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_entry_listing_limit_bounds() {
    let app = spawn_app().await;
    let token = login_token(&app, ADMIN_EMAIL, DEFAULT_PASSWORD).await;

    let list = |uri: &str| {
        Request::builder()
            .uri(uri)
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(list("/api/vehicle-entries?limit=100")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body_json["success"], serde_json::json!(true));
    assert_eq!(body_json["pagination"]["limit"], serde_json::json!(100));
    assert!(body_json["data"].is_array());

    // Over-limit requests are rejected, not clamped
    let response = app.clone().oneshot(list("/api/vehicle-entries?limit=1000")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.clone().oneshot(list("/api/vehicle-entries?limit=0")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_vehicle_creation_and_duplicate_plate() {
    let app = spawn_app().await;
    let token = login_token(&app, ADMIN_EMAIL, DEFAULT_PASSWORD).await;

    let create = |plate: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/vehicles")
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "license_plate": plate,
                    "brand": "Nissan",
                    "model": "Navara",
                    "region_id": 1
                })
                .to_string(),
            ))
            .unwrap()
    };

    let response = app.clone().oneshot(create("WXYZ-99")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body_json["data"]["license_plate"], "WXYZ-99");
    assert_eq!(body_json["data"]["status"], "active");

    // Duplicate plate is a conflict, the seeded ABCD-12 too
    let response = app.clone().oneshot(create("WXYZ-99")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app.clone().oneshot(create("ABCD-12")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Malformed plates never reach the database
    let response = app.clone().oneshot(create("abcd-12")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_change_password_revokes_refresh_tokens() {
    let app = spawn_app().await;

    let body = login(&app, ADMIN_EMAIL, DEFAULT_PASSWORD).await;
    let token = body["data"]["access_token"].as_str().unwrap().to_string();
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth/password")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "current_password": DEFAULT_PASSWORD,
                        "new_password": "a-much-better-one"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The pre-change refresh token is now dead
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/refresh")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"refresh_token": refresh}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // And the new password works
    let body = login(&app, ADMIN_EMAIL, "a-much-better-one").await;
    assert_eq!(body["success"], serde_json::json!(true));
}

#[tokio::test]
async fn test_disabled_account_is_rejected() {
    use fleetgate::entities::users;
    use fleetgate::services::AuthError;
    use fleetgate::state::SharedState;
    use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};

    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    let state = SharedState::new(config)
        .await
        .expect("Failed to create shared state");

    let guardia = "guardia@fleetgate.local";
    let login = state
        .auth_service
        .login(guardia, DEFAULT_PASSWORD)
        .await
        .expect("seeded guardia login failed");
    let refresh = login.tokens.refresh_token.clone();

    let user = users::Entity::find_by_id(login.user.id)
        .one(&state.store.conn)
        .await
        .unwrap()
        .unwrap();
    let mut user: users::ActiveModel = user.into();
    user.is_active = Set(false);
    user.update(&state.store.conn).await.unwrap();

    // Both the password path and the refresh path name the disabled account
    assert!(matches!(
        state.auth_service.login(guardia, DEFAULT_PASSWORD).await,
        Err(AuthError::AccountDisabled)
    ));
    assert!(matches!(
        state.auth_service.rotate_refresh(&refresh).await,
        Err(AuthError::AccountDisabled)
    ));
}
