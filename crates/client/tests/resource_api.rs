//! CRUD client against the fake backend's `/api/sucursales` collection.

mod common;

use adminboard_client::error::ClientError;
use adminboard_client::resources::ResourceClient;
use adminboard_core::error::CoreError;
use adminboard_core::records::{EntityKind, NewRecord, RecordStatus};
use adminboard_core::resource_table::{SortSpec, TableQuery};
use assert_matches::assert_matches;
use common::spawn_backend;
use serde_json::json;

#[tokio::test]
async fn list_unwraps_data_envelope_and_sends_token() {
    let backend = spawn_backend().await;
    let client = ResourceClient::new(backend.api(), EntityKind::Branch);

    let rows = client.list().await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].field("nombre"), Some(json!("Centro")));
    assert_eq!(rows[1].status, RecordStatus::Inactive);
    backend.with_state(|s| {
        assert_eq!(s.authorization[0].as_deref(), Some("Bearer test-token"));
    });
}

#[tokio::test]
async fn list_page_filters_and_sorts_locally() {
    let backend = spawn_backend().await;
    let client = ResourceClient::new(backend.api(), EntityKind::Branch);

    let query = TableQuery {
        search: Some("trujillo".into()),
        ..Default::default()
    };
    let page = client.list_page(&query).await.unwrap();
    assert_eq!(page.total_matching, 1);
    assert_eq!(page.rows[0].id, 2);

    let query = TableQuery {
        sort: Some(SortSpec::desc("nombre")),
        ..Default::default()
    };
    let page = client.list_page(&query).await.unwrap();
    let ids: Vec<i64> = page.rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn create_returns_server_assigned_id() -> anyhow::Result<()> {
    let backend = spawn_backend().await;
    let client = ResourceClient::new(backend.api(), EntityKind::Branch);

    let mut fields = serde_json::Map::new();
    fields.insert("nombre".into(), json!("Sur"));
    let created = client.create(&NewRecord::active(fields)).await?;

    assert_eq!(created.id, 3);
    assert_eq!(created.status, RecordStatus::Active);
    backend.with_state(|s| assert!(s.branches.contains_key(&3)));
    Ok(())
}

#[tokio::test]
async fn toggle_status_puts_full_record() -> anyhow::Result<()> {
    let backend = spawn_backend().await;
    let client = ResourceClient::new(backend.api(), EntityKind::Branch);
    let branch = client.get(1).await?;

    let toggled = client.toggle_status(&branch).await?;

    assert_eq!(toggled.status, RecordStatus::Inactive);
    backend.with_state(|s| {
        let stored = &s.branches[&1];
        assert_eq!(stored["status"], json!(0));
        assert_eq!(stored["ciudad"], json!("Lima"));
    });
    Ok(())
}

#[tokio::test]
async fn missing_record_maps_to_not_found() {
    let backend = spawn_backend().await;
    let client = ResourceClient::new(backend.api(), EntityKind::Branch);

    let err = client.get(99).await.unwrap_err();
    assert_matches!(
        err,
        ClientError::Core(CoreError::NotFound { entity: "Branch", id: 99 })
    );

    let err = client.delete(99).await.unwrap_err();
    assert_matches!(err, ClientError::Core(CoreError::NotFound { .. }));
}

#[tokio::test]
async fn delete_removes_record() {
    let backend = spawn_backend().await;
    let client = ResourceClient::new(backend.api(), EntityKind::Branch);

    client.delete(2).await.unwrap();

    backend.with_state(|s| {
        assert!(!s.branches.contains_key(&2));
        assert_eq!(s.count("DELETE /api/sucursales/2"), 1);
    });
}
