use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use fleetgate::config::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@fleetgate.local";
const DEFAULT_PASSWORD: &str = "password";

/// Seeded by the initial migration
const SEEDED_VEHICLE_ID: i32 = 1;
const SEEDED_WORKSHOP_ID: i32 = 1;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let state = fleetgate::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    fleetgate::api::router(state).await
}

async fn admin_token(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"email": ADMIN_EMAIL, "password": DEFAULT_PASSWORD})
                        .to_string(),
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

async fn get_json(app: &Router, token: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn send_json(
    app: &Router,
    token: &str,
    method: &str,
    uri: &str,
    payload: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn open_entry(app: &Router, token: &str) -> i32 {
    let (status, body) = send_json(
        app,
        token,
        "POST",
        "/api/vehicle-entries",
        serde_json::json!({
            "vehicle_id": SEEDED_VEHICLE_ID,
            "workshop_id": SEEDED_WORKSHOP_ID,
            "driver_name": "Pedro Soto",
            "driver_rut": "12.345.678-9",
            "key_location": "Casillero 3"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "open entry failed: {body}");
    body["data"]["id"].as_i64().unwrap() as i32
}

#[tokio::test]
async fn test_entry_lifecycle() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let (status, body) = send_json(
        &app,
        &token,
        "POST",
        "/api/vehicle-entries",
        serde_json::json!({
            "vehicle_id": SEEDED_VEHICLE_ID,
            "workshop_id": SEEDED_WORKSHOP_ID,
            "driver_name": "Pedro Soto"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let entry = &body["data"];
    let entry_id = entry["id"].as_i64().unwrap();
    let code = entry["entry_code"].as_str().unwrap();
    assert!(code.starts_with("ING-"), "unexpected entry code: {code}");
    assert_eq!(code.len(), "ING-20250101-0000".len());
    assert_eq!(entry["status"], "ingresado");
    assert!(entry["exit_date"].is_null());

    // The detail view joins the vehicle
    let (_, body) = get_json(&app, &token, &format!("/api/vehicle-entries/{entry_id}")).await;
    assert_eq!(body["data"]["license_plate"], "ABCD-12");

    // Opening an entry puts the vehicle in maintenance
    let (_, body) = get_json(&app, &token, "/api/vehicles/1").await;
    assert_eq!(body["data"]["status"], "in_maintenance");

    let (_, body) = get_json(&app, &token, "/api/vehicle-entries/active").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Close it
    let (status, body) = send_json(
        &app,
        &token,
        "POST",
        &format!("/api/vehicle-entries/{entry_id}/exit"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "salida");
    let exit_date = body["data"]["exit_date"].as_str().unwrap().to_string();

    // Vehicle goes back to active once its last open entry closes
    let (_, body) = get_json(&app, &token, "/api/vehicles/1").await;
    assert_eq!(body["data"]["status"], "active");

    let (_, body) = get_json(&app, &token, "/api/vehicle-entries/active").await;
    assert!(body["data"].as_array().unwrap().is_empty());

    // A second close is a conflict and must not touch the exit timestamp
    let (status, _) = send_json(
        &app,
        &token,
        "POST",
        &format!("/api/vehicle-entries/{entry_id}/exit"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = get_json(&app, &token, &format!("/api/vehicle-entries/{entry_id}")).await;
    assert_eq!(body["data"]["exit_date"], exit_date.as_str());
}

#[tokio::test]
async fn test_open_entry_validation() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let (status, _) = send_json(
        &app,
        &token,
        "POST",
        "/api/vehicle-entries",
        serde_json::json!({
            "vehicle_id": 9999,
            "workshop_id": SEEDED_WORKSHOP_ID,
            "driver_name": "Pedro Soto"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(
        &app,
        &token,
        "POST",
        "/api/vehicle-entries",
        serde_json::json!({
            "vehicle_id": SEEDED_VEHICLE_ID,
            "workshop_id": 9999,
            "driver_name": "Pedro Soto"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(
        &app,
        &token,
        "POST",
        "/api/vehicle-entries",
        serde_json::json!({
            "vehicle_id": SEEDED_VEHICLE_ID,
            "workshop_id": SEEDED_WORKSHOP_ID,
            "driver_name": "   "
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_attachments_rejected_after_close() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let entry_id = open_entry(&app, &token).await;

    // Attachments work while the entry is open
    let (status, body) = send_json(
        &app,
        &token,
        "POST",
        &format!("/api/vehicle-entries/{entry_id}/work-orders"),
        serde_json::json!({"description": "Cambio de aceite"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let order_number = body["data"]["order_number"].as_str().unwrap();
    assert!(order_number.starts_with("OT-"));

    let (status, _) = send_json(
        &app,
        &token,
        "PUT",
        &format!("/api/vehicle-entries/{entry_id}/key-control"),
        serde_json::json!({"key_location": "Casillero 7"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &app,
        &token,
        "POST",
        &format!("/api/vehicle-entries/{entry_id}/exit"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Closed entries are immutable
    let (status, _) = send_json(
        &app,
        &token,
        "POST",
        &format!("/api/vehicle-entries/{entry_id}/work-orders"),
        serde_json::json!({"description": "Tarde"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send_json(
        &app,
        &token,
        "POST",
        &format!("/api/vehicle-entries/{entry_id}/photos"),
        serde_json::json!({"url": "https://example.com/late.jpg"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send_json(
        &app,
        &token,
        "PUT",
        &format!("/api/vehicle-entries/{entry_id}/key-control"),
        serde_json::json!({"key_location": "Casillero 9"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The detail endpoint still shows what was attached while open
    let (_, body) = get_json(&app, &token, &format!("/api/vehicle-entries/{entry_id}")).await;
    assert_eq!(body["data"]["work_orders"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["key_control"]["key_location"], "Casillero 7");
    assert_eq!(body["data"]["workshop_name"], "Taller Central");
}

#[tokio::test]
async fn test_dashboard_stats() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let (_, body) = get_json(&app, &token, "/api/dashboard/stats").await;
    assert_eq!(body["data"]["total_entries"], serde_json::json!(0));
    assert_eq!(body["data"]["vehicles_inside"], serde_json::json!(0));

    let entry_id = open_entry(&app, &token).await;

    let (_, body) = get_json(&app, &token, "/api/dashboard/stats").await;
    assert_eq!(body["data"]["total_entries"], serde_json::json!(1));
    assert_eq!(body["data"]["entries_today"], serde_json::json!(1));
    assert_eq!(body["data"]["vehicles_inside"], serde_json::json!(1));
    assert_eq!(body["data"]["exits_today"], serde_json::json!(0));

    let (status, _) = send_json(
        &app,
        &token,
        "POST",
        &format!("/api/vehicle-entries/{entry_id}/exit"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_json(&app, &token, "/api/dashboard/stats").await;
    assert_eq!(body["data"]["vehicles_inside"], serde_json::json!(0));
    assert_eq!(body["data"]["exits_today"], serde_json::json!(1));
    assert_eq!(body["data"]["total_entries"], serde_json::json!(1));
}

#[tokio::test]
async fn test_entry_listing_date_from_filter() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    open_entry(&app, &token).await;

    // A lower bound in the past includes the fresh entry
    let (status, body) =
        get_json(&app, &token, "/api/vehicle-entries?date_from=2000-01-01").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], serde_json::json!(1));

    // A lower bound in the future excludes it
    let (status, body) =
        get_json(&app, &token, "/api/vehicle-entries?date_from=2999-01-01").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], serde_json::json!(0));
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    // Full RFC 3339 timestamps are accepted too
    let (status, body) = get_json(
        &app,
        &token,
        "/api/vehicle-entries?date_from=2000-01-01T00:00:00%2B00:00",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], serde_json::json!(1));

    // Garbage is a validation error, not an ignored parameter
    let (status, _) = get_json(&app, &token, "/api/vehicle-entries?date_from=yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
