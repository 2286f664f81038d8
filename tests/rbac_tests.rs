use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use fleetgate::config::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

const DEFAULT_PASSWORD: &str = "password";

/// Guardia role seeded by the initial migration; it can read vehicles but
/// not create them.
const GUARDIA_ROLE_ID: i32 = 2;
const VEHICLES_CREATE_PERMISSION_ID: i32 = 7;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let state = fleetgate::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    fleetgate::api::router(state).await
}

async fn login_token(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"email": email, "password": DEFAULT_PASSWORD}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    body_json["data"]["access_token"].as_str().unwrap().to_string()
}

async fn create_vehicle(app: &Router, token: &str, plate: &str) -> StatusCode {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/vehicles")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "license_plate": plate,
                        "brand": "Chevrolet",
                        "model": "D-Max",
                        "region_id": 1
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

#[tokio::test]
async fn test_missing_permission_is_forbidden() {
    let app = spawn_app().await;
    let token = login_token(&app, "guardia@fleetgate.local").await;

    // Guardia can read vehicles
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/vehicles")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // but not create them
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/vehicles")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "license_plate": "QRST-11",
                        "brand": "Ford",
                        "model": "Ranger",
                        "region_id": 1
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body_json["success"], serde_json::json!(false));
    assert!(
        body_json["message"]
            .as_str()
            .unwrap()
            .contains("vehicles:create")
    );

    // nor administer role grants
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/roles/{GUARDIA_ROLE_ID}/permissions"))
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"permission_id": VEHICLES_CREATE_PERMISSION_ID})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_grant_and_revoke_take_effect_immediately() {
    let app = spawn_app().await;
    let admin = login_token(&app, "admin@fleetgate.local").await;
    let guardia = login_token(&app, "guardia@fleetgate.local").await;

    assert_eq!(
        create_vehicle(&app, &guardia, "EFGH-34").await,
        StatusCode::FORBIDDEN
    );

    // Admin grants vehicles:create to the Guardia role
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/roles/{GUARDIA_ROLE_ID}/permissions"))
                .header("Authorization", format!("Bearer {admin}"))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"permission_id": VEHICLES_CREATE_PERMISSION_ID})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The cached grant set is invalidated, no re-login needed
    assert_eq!(
        create_vehicle(&app, &guardia, "EFGH-34").await,
        StatusCode::OK
    );

    // Revoke puts the deny back
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!(
                    "/api/roles/{GUARDIA_ROLE_ID}/permissions/{VEHICLES_CREATE_PERMISSION_ID}"
                ))
                .header("Authorization", format!("Bearer {admin}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        create_vehicle(&app, &guardia, "IJKL-56").await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_role_and_permission_catalogs() {
    let app = spawn_app().await;
    let admin = login_token(&app, "admin@fleetgate.local").await;

    let get = |uri: String| {
        Request::builder()
            .uri(uri)
            .header("Authorization", format!("Bearer {admin}"))
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(get("/api/roles".into())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let roles = body_json["data"].as_array().unwrap();
    assert_eq!(roles.len(), 4);
    assert!(roles.iter().any(|r| r["name"] == "Guardia"));

    let response = app
        .clone()
        .oneshot(get(format!("/api/roles/{GUARDIA_ROLE_ID}/permissions")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let grants = body_json["data"].as_array().unwrap();
    assert!(
        grants
            .iter()
            .any(|p| p["resource"] == "vehicles" && p["action"] == "read")
    );
    assert!(
        !grants
            .iter()
            .any(|p| p["resource"] == "vehicles" && p["action"] == "create")
    );

    let response = app
        .clone()
        .oneshot(get("/api/permissions".into()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body_json["data"].as_array().unwrap().len(), 20);
}
