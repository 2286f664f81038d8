use fleetgate::config::Config;
use fleetgate::entities::{entry_photos, key_controls, vehicle_entries, work_orders};
use fleetgate::state::SharedState;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, PaginatorTrait};

async fn spawn_state() -> SharedState {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    SharedState::new(config)
        .await
        .expect("Failed to create shared state")
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

async fn insert_entry(
    state: &SharedState,
    entry_code: &str,
    status: &str,
    exit_date: Option<String>,
) -> i32 {
    let model = vehicle_entries::ActiveModel {
        entry_code: Set(entry_code.to_string()),
        vehicle_id: Set(1),
        workshop_id: Set(1),
        driver_name: Set("Conductor Prueba".to_string()),
        driver_rut: Set(None),
        entry_date: Set(now()),
        exit_date: Set(exit_date),
        status: Set(status.to_string()),
        created_by_id: Set(1),
        created_at: Set(now()),
        ..Default::default()
    };

    model
        .insert(&state.store.conn)
        .await
        .expect("Failed to insert entry")
        .id
}

/// One work order, one photo and one key control for the given entry.
async fn attach_children(state: &SharedState, entry_id: i32) {
    work_orders::ActiveModel {
        entry_id: Set(entry_id),
        order_number: Set(format!("OT-20250101-{entry_id:04}")),
        description: Set("Revisión general".to_string()),
        status: Set("pending".to_string()),
        created_at: Set(now()),
        ..Default::default()
    }
    .insert(&state.store.conn)
    .await
    .unwrap();

    entry_photos::ActiveModel {
        entry_id: Set(entry_id),
        url: Set("https://example.com/foto.jpg".to_string()),
        description: Set(None),
        created_at: Set(now()),
        ..Default::default()
    }
    .insert(&state.store.conn)
    .await
    .unwrap();

    key_controls::ActiveModel {
        entry_id: Set(entry_id),
        key_location: Set("Casillero 1".to_string()),
        delivered_to: Set(None),
        created_at: Set(now()),
        updated_at: Set(now()),
        ..Default::default()
    }
    .insert(&state.store.conn)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_audit_flags_inconsistent_entries() {
    let state = spawn_state().await;

    // Clean: closed with an exit date, and open with all attachments
    insert_entry(&state, "ING-20250101-0001", "salida", Some(now())).await;
    let complete = insert_entry(&state, "ING-20250101-0002", "ingresado", None).await;
    attach_children(&state, complete).await;

    // Flagged
    insert_entry(&state, "ING-20250101-0003", "ingresado", None).await;
    let bad_code = insert_entry(&state, "BAD-CODE", "ingresado", None).await;
    attach_children(&state, bad_code).await;
    insert_entry(&state, "ING-20250101-0004", "ingresado", Some(now())).await;
    insert_entry(&state, "ING-20250101-0005", "salida", None).await;
    insert_entry(&state, "ING-20250101-0006", "limbo", None).await;

    let report = state.audit_service.run(false).await.unwrap();

    assert_eq!(report.scanned, 7);
    assert_eq!(report.findings.len(), 5);
    assert_eq!(report.purged, 0);
    assert_eq!(report.failed, 0);

    let reasons_for = |code: &str| {
        report
            .findings
            .iter()
            .find(|f| f.entry_code == code)
            .map(|f| f.reasons.clone())
            .unwrap_or_default()
    };

    assert_eq!(
        reasons_for("ING-20250101-0003"),
        vec!["missing_work_order", "missing_photo", "missing_key_control"]
    );
    assert_eq!(reasons_for("BAD-CODE"), vec!["malformed_code"]);
    assert_eq!(reasons_for("ING-20250101-0004"), vec!["open_with_exit_date"]);
    assert_eq!(
        reasons_for("ING-20250101-0005"),
        vec!["closed_without_exit_date"]
    );
    assert_eq!(reasons_for("ING-20250101-0006"), vec!["unknown_status"]);
    assert!(!report
        .findings
        .iter()
        .any(|f| f.entry_id == complete || f.entry_code == "ING-20250101-0001"));

    // Report-only runs leave the data alone
    let remaining = vehicle_entries::Entity::find()
        .count(&state.store.conn)
        .await
        .unwrap();
    assert_eq!(remaining, 7);
}

#[tokio::test]
async fn test_audit_purge_removes_flagged_entries_and_children() {
    let state = spawn_state().await;

    let healthy = insert_entry(&state, "ING-20250101-0001", "salida", Some(now())).await;
    let bad = insert_entry(&state, "BAD-CODE", "ingresado", Some(now())).await;

    // Child records on the bad entry; the purge must take all of them
    for n in 0..2 {
        work_orders::ActiveModel {
            entry_id: Set(bad),
            order_number: Set(format!("OT-20250101-000{n}")),
            description: Set("Orden huérfana".to_string()),
            status: Set("pending".to_string()),
            created_at: Set(now()),
            ..Default::default()
        }
        .insert(&state.store.conn)
        .await
        .unwrap();
    }

    for n in 0..3 {
        entry_photos::ActiveModel {
            entry_id: Set(bad),
            url: Set(format!("https://example.com/foto-{n}.jpg")),
            description: Set(None),
            created_at: Set(now()),
            ..Default::default()
        }
        .insert(&state.store.conn)
        .await
        .unwrap();
    }

    key_controls::ActiveModel {
        entry_id: Set(bad),
        key_location: Set("Casillero 1".to_string()),
        delivered_to: Set(None),
        created_at: Set(now()),
        updated_at: Set(now()),
        ..Default::default()
    }
    .insert(&state.store.conn)
    .await
    .unwrap();

    let report = state.audit_service.run(true).await.unwrap();

    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.purged, 1);
    assert_eq!(report.failed, 0);
    assert!(report.findings[0].purge_error.is_none());

    let conn = &state.store.conn;
    assert!(
        vehicle_entries::Entity::find_by_id(bad)
            .one(conn)
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(work_orders::Entity::find().count(conn).await.unwrap(), 0);
    assert_eq!(entry_photos::Entity::find().count(conn).await.unwrap(), 0);
    assert_eq!(key_controls::Entity::find().count(conn).await.unwrap(), 0);

    // The healthy entry survives
    assert!(
        vehicle_entries::Entity::find_by_id(healthy)
            .one(conn)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_audit_prunes_expired_refresh_tokens() {
    let state = spawn_state().await;

    let expired = (chrono::Utc::now() - chrono::Duration::days(1)).to_rfc3339();
    let valid = (chrono::Utc::now() + chrono::Duration::days(1)).to_rfc3339();

    state
        .store
        .store_refresh_token(1, "expired-token", &expired)
        .await
        .unwrap();
    state
        .store
        .store_refresh_token(1, "valid-token", &valid)
        .await
        .unwrap();

    let report = state.audit_service.run(false).await.unwrap();

    assert_eq!(report.tokens_pruned, 1);
    assert!(report.is_clean());

    // The valid token is untouched
    assert!(
        state
            .store
            .consume_refresh_token("valid-token")
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        state
            .store
            .consume_refresh_token("expired-token")
            .await
            .unwrap()
            .is_none()
    );
}
