//! Tests for the control-plane synchronizer.
//!
//! Covers:
//! - Create normalization, validation and engine prefixing
//! - Port merge and conflict flows
//! - Route collisions and namespace shadowing
//! - Compensation when the engine rejects a mock
//! - Update, patch, delete and bulk create

use super::*;
use crate::merge::MergeError;
use crate::mock::{MockSpec, MqttSpec};
use crate::routing::CollisionKind;
use crate::store::InMemoryMockStore;
use crate::test_support::{
    grpc_mock, http_mock, mqtt_mock, BulkFailingStore, EngineCall, ScriptedEngine,
    UnavailableStore,
};
use tracing_test::traced_test;

struct Harness {
    store: Arc<InMemoryMockStore>,
    engine: Arc<ScriptedEngine>,
    sync: ControlPlaneSynchronizer,
}

fn harness_with(engine: ScriptedEngine) -> Harness {
    let store = Arc::new(InMemoryMockStore::new());
    let engine = Arc::new(engine);
    let slot = EngineSlot::connected("engine-1", Arc::clone(&engine) as _);
    let sync = ControlPlaneSynchronizer::new(
        Arc::clone(&store) as _,
        Arc::new(slot),
        SyncSettings::default(),
    );
    Harness {
        store,
        engine,
        sync,
    }
}

fn harness() -> Harness {
    harness_with(ScriptedEngine::new())
}

fn port_error() -> EngineError {
    EngineError::Rejected {
        status: 500,
        message: "listen tcp :1883: bind: address already in use".to_string(),
    }
}

fn created(outcome: CreateOutcome) -> Mock {
    match outcome {
        CreateOutcome::Created(mock) => mock,
        other => panic!("expected created, got {other:?}"),
    }
}

fn topics(mock: &Mock) -> Vec<String> {
    match &mock.spec {
        MockSpec::Mqtt { mqtt } => mqtt.topics.iter().map(|t| t.topic.clone()).collect(),
        _ => panic!("not an mqtt mock"),
    }
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_assigns_server_fields() {
    let h = harness();
    let mock = http_mock("", "", "GET", "/users");

    let stored = created(h.sync.create(mock).await.unwrap());
    assert!(stored.id.starts_with("http_"));
    assert_eq!(stored.name, stored.id);
    assert_eq!(stored.workspace_id, "local");
    assert!(stored.sort_key.unwrap() < 0);
    assert!(stored.created_at.is_some());
    assert!(stored.updated_at.is_some());

    assert_eq!(h.store.get(&stored.id).await.unwrap(), stored);
    assert_eq!(h.engine.calls(), vec![EngineCall::Create(stored)]);
}

#[tokio::test]
async fn test_create_rejects_invalid_spec() {
    let h = harness();
    let err = h
        .sync
        .create(http_mock("http_a", "local", "", "/users"))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Validation(_)));
    assert_eq!(err.code(), "validation_error");
    assert!(h.store.is_empty());
    assert!(h.engine.calls().is_empty());
}

#[tokio::test]
async fn test_create_without_engine_is_store_only() {
    let store = Arc::new(InMemoryMockStore::new());
    let sync = ControlPlaneSynchronizer::new(
        Arc::clone(&store) as _,
        Arc::new(EngineSlot::new()),
        SyncSettings::default(),
    );
    sync.create(http_mock("http_a", "local", "GET", "/a"))
        .await
        .unwrap();
    assert!(store.get("http_a").await.is_ok());
}

#[tokio::test]
async fn test_create_sends_prefixed_mock_to_engine() {
    let h = harness();
    h.sync
        .create_workspace(Workspace::new("ws_pay", "payment-api/"))
        .await
        .unwrap();

    h.sync
        .create(http_mock("http_pay", "ws_pay", "GET", "/charges"))
        .await
        .unwrap();

    let stored = h.store.get("http_pay").await.unwrap();
    assert_eq!(stored.route(), Some(("GET", "/charges")));
    match &h.engine.calls()[0] {
        EngineCall::Create(sent) => assert_eq!(sent.route(), Some(("GET", "/payment-api/charges"))),
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn test_create_duplicate_id_already_exists() {
    let h = harness();
    h.sync
        .create(http_mock("http_a", "local", "GET", "/a"))
        .await
        .unwrap();
    let err = h
        .sync
        .create(http_mock("http_a", "local", "GET", "/b"))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::AlreadyExists(_)));
}

#[tokio::test]
async fn test_create_duplicate_port_owner_id_already_exists() {
    let h = harness();
    h.sync
        .create(mqtt_mock("mqtt_a", "local", 1883, &["t1"]))
        .await
        .unwrap();
    let before = h.store.get("mqtt_a").await.unwrap();

    let err = h
        .sync
        .create(mqtt_mock("mqtt_a", "local", 1883, &["t2"]))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::AlreadyExists(_)));
    assert_eq!(err.status_code(), hyper::StatusCode::CONFLICT);
    assert_eq!(h.store.get("mqtt_a").await.unwrap(), before);
    assert_eq!(topics(&before), vec!["t1"]);
    assert_eq!(h.engine.calls().len(), 1);

    h.sync
        .create(grpc_mock("grpc_a", "local", 50051, &[("users.Users", &["Get"])]))
        .await
        .unwrap();
    let err = h
        .sync
        .create(grpc_mock("grpc_a", "local", 50051, &[("orders.Orders", &["Create"])]))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::AlreadyExists(_)));
}

// ============================================================================
// Ports and merging
// ============================================================================

#[tokio::test]
async fn test_mqtt_merge_then_duplicate_topic() {
    let h = harness();
    let a = created(
        h.sync
            .create(mqtt_mock("mqtt_a", "local", 1883, &["sensors/temp"]))
            .await
            .unwrap(),
    );

    match h
        .sync
        .create(mqtt_mock("mqtt_b", "local", 1883, &["sensors/humidity"]))
        .await
        .unwrap()
    {
        CreateOutcome::Merged { target, result } => {
            assert_eq!(target.id, "mqtt_a");
            assert_eq!(result.added, vec!["sensors/humidity"]);
            assert_eq!(result.total, vec!["sensors/temp", "sensors/humidity"]);
        }
        other => panic!("expected merge, got {other:?}"),
    }

    assert!(matches!(h.store.get("mqtt_b").await, Err(StoreError::NotFound(_))));
    let merged = h.store.get("mqtt_a").await.unwrap();
    assert_eq!(topics(&merged), vec!["sensors/temp", "sensors/humidity"]);
    assert!(matches!(
        h.engine.calls().last(),
        Some(EngineCall::Update(id, sent)) if id == "mqtt_a" && *sent == merged
    ));

    let err = h
        .sync
        .create(mqtt_mock("mqtt_c", "local", 1883, &["sensors/temp"]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SyncError::Merge(MergeError::TopicConflict {
            topic: "sensors/temp".to_string()
        })
    );
    assert_eq!(h.store.get("mqtt_a").await.unwrap(), merged);
    assert_ne!(merged, a);
}

#[tokio::test]
async fn test_merge_in_prefixed_workspace_sends_target_unprefixed() {
    let h = harness();
    h.sync
        .create_workspace(Workspace::new("ws_pay", "/payment-api"))
        .await
        .unwrap();
    h.sync
        .create(grpc_mock("grpc_a", "ws_pay", 50051, &[("users.Users", &["Get"])]))
        .await
        .unwrap();
    h.sync
        .create(grpc_mock("grpc_b", "ws_pay", 50051, &[("orders.Orders", &["Create"])]))
        .await
        .unwrap();

    let merged = h.store.get("grpc_a").await.unwrap();
    assert_eq!(merged.workspace_id, "ws_pay");
    match h.engine.calls().last() {
        Some(EngineCall::Update(id, sent)) => {
            assert_eq!(id, "grpc_a");
            assert_eq!(*sent, merged);
        }
        other => panic!("expected engine update, got {other:?}"),
    }
}

#[tokio::test]
async fn test_grpc_merge_method_conflict_keeps_target() {
    let h = harness();
    h.sync
        .create(grpc_mock("grpc_a", "local", 50051, &[("users.Users", &["Get"])]))
        .await
        .unwrap();
    let before = h.store.get("grpc_a").await.unwrap();

    let err = h
        .sync
        .create(grpc_mock(
            "grpc_b",
            "local",
            50051,
            &[("orders.Orders", &["Create"]), ("users.Users", &["Get"])],
        ))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "service_conflict");
    assert_eq!(h.store.get("grpc_a").await.unwrap(), before);
}

#[tokio::test]
async fn test_grpc_and_mqtt_never_share_a_port() {
    let h = harness();
    h.sync
        .create(grpc_mock("grpc_a", "local", 1883, &[("svc", &["M"])]))
        .await
        .unwrap();

    let err = h
        .sync
        .create(mqtt_mock("mqtt_b", "local", 1883, &["t"]))
        .await
        .unwrap_err();
    match &err {
        SyncError::PortConflict(c) => {
            assert_eq!(c.reason, ConflictReason::CrossProtocol);
            assert_eq!(c.conflicting_mock_id, "grpc_a");
        }
        other => panic!("expected port conflict, got {other:?}"),
    }
    assert!(err.to_string().contains("across protocols"));
    assert_eq!(err.code(), "port_conflict");
    assert!(h.store.get("mqtt_b").await.is_err());
}

// ============================================================================
// Route collisions
// ============================================================================

#[tokio::test]
async fn test_root_route_into_workspace_namespace_is_rejected() {
    let h = harness();
    h.sync
        .create_workspace(Workspace::new("ws_pay", "/payment-api"))
        .await
        .unwrap();

    let err = h
        .sync
        .create(http_mock("http_root", "local", "GET", "/payment-api/{id}"))
        .await
        .unwrap_err();
    match err {
        SyncError::RouteCollision(c) => assert_eq!(c.kind, CollisionKind::NamespaceShadow),
        other => panic!("expected route collision, got {other:?}"),
    }

    h.sync
        .create(http_mock("http_v2", "local", "GET", "/payment-apiv2/status"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_exact_cross_workspace_collision() {
    let h = harness();
    h.sync
        .create_workspace(Workspace::new("ws_pay", "/payment-api"))
        .await
        .unwrap();
    h.sync
        .create(http_mock("http_a", "ws_pay", "GET", "/charges"))
        .await
        .unwrap();

    h.sync
        .create_workspace(Workspace::new("ws_other", ""))
        .await
        .unwrap();
    let err = h
        .sync
        .create(http_mock("http_b", "ws_other", "get", "/payment-api/charges"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "route_conflict");
}

#[tokio::test]
async fn test_route_check_skipped_when_store_cannot_list() {
    let sync = ControlPlaneSynchronizer::new(
        Arc::new(UnavailableStore),
        Arc::new(EngineSlot::new()),
        SyncSettings::default(),
    );
    // The route check is skipped, the store write then fails.
    let err = sync
        .create(http_mock("http_a", "local", "GET", "/a"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "store_unavailable");
}

// ============================================================================
// Compensation
// ============================================================================

#[tokio::test]
#[traced_test]
async fn test_engine_rejected_create_is_rolled_back() {
    let h = harness_with(ScriptedEngine::failing_create(port_error()));

    let err = h
        .sync
        .create(mqtt_mock("mqtt_a", "local", 1883, &["t"]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SyncError::EngineRejected {
            message: "listen tcp :1883: bind: address already in use".to_string(),
            port_related: true,
        }
    );
    assert_eq!(err.code(), "port_conflict");
    assert!(matches!(h.store.get("mqtt_a").await, Err(StoreError::NotFound(_))));
    assert!(logs_contain("Rolled back create after engine rejection"));
}

#[tokio::test]
async fn test_engine_rejection_not_port_related() {
    let h = harness_with(ScriptedEngine::failing_create(EngineError::Rejected {
        status: 400,
        message: "invalid matcher".to_string(),
    }));
    let err = h
        .sync
        .create(http_mock("http_a", "local", "GET", "/a"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "engine_rejected");
    assert!(h.store.is_empty());
}

// ============================================================================
// Update and patch
// ============================================================================

#[tokio::test]
async fn test_update_missing_mock() {
    let h = harness();
    let err = h
        .sync
        .update("http_nope", http_mock("", "", "GET", "/a"))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotFound(_)));
    assert_eq!(err.status_code(), hyper::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_idempotent_update_keeps_identity() {
    let h = harness();
    let original = created(
        h.sync
            .create(http_mock("http_a", "local", "GET", "/users").with_name("Users"))
            .await
            .unwrap(),
    );

    let updated = h
        .sync
        .update("http_a", http_mock("", "", "GET", "/users"))
        .await
        .unwrap();
    assert_eq!(updated.id, "http_a");
    assert_eq!(updated.name, "Users");
    assert_eq!(updated.workspace_id, "local");
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.sort_key, original.sort_key);
}

#[tokio::test]
async fn test_update_onto_merge_target_is_conflict() {
    let h = harness();
    h.sync
        .create(mqtt_mock("mqtt_a", "local", 1883, &["a"]))
        .await
        .unwrap();
    h.sync
        .create(mqtt_mock("mqtt_b", "local", 1884, &["b"]))
        .await
        .unwrap();

    let err = h
        .sync
        .update("mqtt_b", mqtt_mock("", "", 1883, &["b"]))
        .await
        .unwrap_err();
    match err {
        SyncError::PortConflict(c) => assert_eq!(c.reason, ConflictReason::MergeNotAllowed),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
#[traced_test]
async fn test_update_restores_previous_on_port_failure() {
    let h = harness_with(ScriptedEngine::failing_update(port_error()));
    let original = created(
        h.sync
            .create(mqtt_mock("mqtt_a", "local", 1883, &["a"]))
            .await
            .unwrap(),
    );

    let err = h
        .sync
        .update("mqtt_a", mqtt_mock("", "", 1884, &["a"]))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::EngineRejected { port_related: true, .. }));
    assert_eq!(h.store.get("mqtt_a").await.unwrap(), original);
    assert!(logs_contain("Restored previous mock after engine rejection"));
}

#[tokio::test]
async fn test_update_keeps_store_on_other_engine_failure() {
    let h = harness_with(ScriptedEngine::failing_update(EngineError::Transport(
        "connection reset".to_string(),
    )));
    h.sync
        .create(mqtt_mock("mqtt_a", "local", 1883, &["a"]))
        .await
        .unwrap();

    let updated = h
        .sync
        .update("mqtt_a", mqtt_mock("", "", 1883, &["a", "b"]))
        .await
        .unwrap();
    assert_eq!(h.store.get("mqtt_a").await.unwrap(), updated);
    assert_eq!(topics(&updated), vec!["a", "b"]);
}

#[tokio::test]
async fn test_patch_applies_allowed_fields_without_rollback() {
    let h = harness_with(ScriptedEngine::failing_update(port_error()));
    h.sync
        .create(http_mock("http_a", "local", "GET", "/a"))
        .await
        .unwrap();

    let patch: MockPatch =
        serde_json::from_str(r#"{"name": "Renamed", "enabled": "nope", "sortKey": 5, "port": 1}"#)
            .unwrap();
    let patched = h.sync.patch("http_a", patch).await.unwrap();
    assert_eq!(patched.name, "Renamed");
    assert!(patched.is_enabled());
    assert_eq!(patched.sort_key, Some(5));
    assert_eq!(h.store.get("http_a").await.unwrap(), patched);
}

#[tokio::test]
async fn test_patch_missing_mock() {
    let h = harness();
    let err = h
        .sync
        .patch("http_nope", MockPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotFound(_)));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_notifies_engine() {
    let h = harness();
    h.sync
        .create(http_mock("http_a", "local", "GET", "/a"))
        .await
        .unwrap();
    h.sync.delete("http_a").await.unwrap();
    assert!(h.store.is_empty());
    assert_eq!(
        h.engine.calls().last(),
        Some(&EngineCall::Delete("http_a".to_string()))
    );

    assert!(matches!(
        h.sync.delete("http_a").await,
        Err(SyncError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_by_type_and_all() {
    let h = harness();
    h.sync
        .create(http_mock("http_a", "local", "GET", "/a"))
        .await
        .unwrap();
    h.sync
        .create(mqtt_mock("mqtt_a", "local", 1883, &["t"]))
        .await
        .unwrap();
    h.sync
        .create(mqtt_mock("mqtt_b", "local", 1884, &["t"]))
        .await
        .unwrap();

    let mut deleted = h.sync.delete_by_type(MockType::Mqtt).await.unwrap();
    deleted.sort();
    assert_eq!(deleted, vec!["mqtt_a", "mqtt_b"]);
    assert_eq!(h.store.len(), 1);

    assert_eq!(h.sync.delete_all().await.unwrap(), vec!["http_a"]);
    assert!(h.store.is_empty());
}

// ============================================================================
// Bulk create
// ============================================================================

#[tokio::test]
async fn test_bulk_duplicate_ids_rejected_before_write() {
    let h = harness();
    let err = h
        .sync
        .bulk_create(
            vec![
                http_mock("http_a", "local", "GET", "/a"),
                http_mock("http_b", "local", "GET", "/b"),
                http_mock("http_a", "local", "GET", "/c"),
            ],
            false,
        )
        .await
        .unwrap_err();
    assert_eq!(err, SyncError::DuplicateIds(vec!["http_a".to_string()]));
    assert!(h.store.is_empty());
    assert!(h.engine.calls().is_empty());
}

#[tokio::test]
async fn test_bulk_port_conflict_aborts_batch() {
    let h = harness();
    let err = h
        .sync
        .bulk_create(
            vec![
                http_mock("http_a", "local", "GET", "/a"),
                mqtt_mock("mqtt_a", "local", 1883, &["a"]),
                mqtt_mock("mqtt_b", "local", 1883, &["b"]),
            ],
            false,
        )
        .await
        .unwrap_err();
    match err {
        SyncError::PortConflicts(conflicts) => {
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].reason, ConflictReason::DuplicateInBatch);
        }
        other => panic!("expected port conflicts, got {other:?}"),
    }
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_bulk_replace() {
    let h = harness();
    h.sync
        .create(mqtt_mock("mqtt_a", "local", 1883, &["old"]))
        .await
        .unwrap();

    let outcome = h
        .sync
        .bulk_create(
            vec![
                mqtt_mock("mqtt_a", "local", 1883, &["new"]),
                http_mock("", "", "GET", "/fresh"),
            ],
            true,
        )
        .await
        .unwrap();
    assert_eq!(outcome.replaced, vec!["mqtt_a"]);
    assert_eq!(outcome.created.len(), 2);
    assert!(outcome.warnings.is_empty());
    assert_eq!(topics(&h.store.get("mqtt_a").await.unwrap()), vec!["new"]);
    assert!(h
        .engine
        .calls()
        .contains(&EngineCall::Delete("mqtt_a".to_string())));
}

#[tokio::test]
async fn test_bulk_replace_moves_port_between_ids() {
    let h = harness();
    h.sync
        .create(mqtt_mock("mqtt_x", "local", 1883, &["x"]))
        .await
        .unwrap();

    let outcome = h
        .sync
        .bulk_create(
            vec![
                mqtt_mock("mqtt_x", "local", 1884, &["x"]),
                mqtt_mock("mqtt_y", "local", 1883, &["y"]),
            ],
            true,
        )
        .await
        .unwrap();
    assert_eq!(outcome.replaced, vec!["mqtt_x"]);
    assert_eq!(h.store.get("mqtt_x").await.unwrap().spec.port(), 1884);
    assert_eq!(h.store.get("mqtt_y").await.unwrap().spec.port(), 1883);

    // Re-applying the same configuration is idempotent
    let again = h
        .sync
        .bulk_create(
            vec![
                mqtt_mock("mqtt_x", "local", 1884, &["x"]),
                mqtt_mock("mqtt_y", "local", 1883, &["y"]),
            ],
            true,
        )
        .await
        .unwrap();
    assert_eq!(again.replaced.len(), 2);
    assert_eq!(h.store.len(), 2);
}

#[tokio::test]
#[traced_test]
async fn test_bulk_replace_restores_mocks_when_store_write_fails() {
    let inner = Arc::new(InMemoryMockStore::new());
    inner
        .create(mqtt_mock("mqtt_x", "local", 1883, &["x"]))
        .await
        .unwrap();
    let original = inner.get("mqtt_x").await.unwrap();
    let engine = Arc::new(ScriptedEngine::new());
    let sync = ControlPlaneSynchronizer::new(
        Arc::new(BulkFailingStore {
            inner: Arc::clone(&inner),
        }),
        Arc::new(EngineSlot::connected("engine-1", Arc::clone(&engine) as _)),
        SyncSettings::default(),
    );

    let err = sync
        .bulk_create(vec![mqtt_mock("mqtt_x", "local", 1884, &["x2"])], true)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Store(StoreError::Unavailable(_))));
    assert_eq!(inner.get("mqtt_x").await.unwrap(), original);
    assert!(engine.calls().is_empty());
    assert!(logs_contain("Restored replaced mock after failed bulk create"));
}

#[tokio::test]
async fn test_bulk_without_replace_keeps_existing() {
    let h = harness();
    h.sync
        .create(http_mock("http_a", "local", "GET", "/a"))
        .await
        .unwrap();
    let err = h
        .sync
        .bulk_create(
            vec![
                http_mock("http_b", "local", "GET", "/b"),
                http_mock("http_a", "local", "GET", "/a2"),
            ],
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::AlreadyExists(_)));
    assert!(h.store.get("http_b").await.is_err());
}

#[tokio::test]
async fn test_bulk_collects_engine_warnings() {
    let h = harness_with(ScriptedEngine::failing_create(EngineError::Transport(
        "engine restarting".to_string(),
    )));
    let outcome = h
        .sync
        .bulk_create(
            vec![
                http_mock("http_a", "local", "GET", "/a"),
                http_mock("http_b", "local", "GET", "/b"),
            ],
            false,
        )
        .await
        .unwrap();
    assert_eq!(outcome.warnings.len(), 2);
    assert!(outcome.warnings[0].starts_with("http_a: "));
    assert_eq!(h.store.len(), 2);
}

#[tokio::test]
async fn test_bulk_validation_names_the_entry() {
    let h = harness();
    let invalid = Mock::new(MockSpec::Mqtt {
        mqtt: MqttSpec::default(),
    });
    let err = h
        .sync
        .bulk_create(vec![http_mock("", "", "GET", "/a"), invalid], false)
        .await
        .unwrap_err();
    match err {
        SyncError::Validation(msg) => assert!(msg.starts_with("mock 1: ")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

// ============================================================================
// Reads and workspaces
// ============================================================================

#[tokio::test]
async fn test_engine_status() {
    let h = harness();
    assert_eq!(h.sync.engine_status().await.unwrap().id, "scripted");

    h.sync.engine().disconnect();
    let err = h.sync.engine_status().await.unwrap_err();
    assert_eq!(err.code(), "engine_unavailable");
    assert_eq!(err.status_code(), hyper::StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_get_and_list() {
    let h = harness();
    h.sync
        .create(http_mock("http_a", "local", "GET", "/a"))
        .await
        .unwrap();
    h.sync
        .create(mqtt_mock("mqtt_a", "local", 1883, &["t"]))
        .await
        .unwrap();

    assert_eq!(h.sync.get("http_a").await.unwrap().id, "http_a");
    let filter = MockFilter {
        mock_type: Some(MockType::Mqtt),
        ..Default::default()
    };
    let listed = h.sync.list(&filter).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "mqtt_a");
}

#[tokio::test]
async fn test_workspace_base_paths() {
    let h = harness();
    let ws = h
        .sync
        .create_workspace(Workspace::new("ws_pay", " payment-api/ "))
        .await
        .unwrap();
    assert_eq!(ws.base_path, "/payment-api");
    assert_eq!(ws.name, "ws_pay");

    let err = h
        .sync
        .create_workspace(Workspace::new("ws_nested", "/payment-api/v2"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "validation_error");

    let err = h
        .sync
        .create_workspace(Workspace::new("local", "/root"))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Validation(_)));

    let err = h
        .sync
        .create_workspace(Workspace::new("ws_pay", "/other"))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::AlreadyExists(_)));

    assert_eq!(h.sync.list_workspaces().await.unwrap().len(), 1);
}
