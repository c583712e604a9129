//! Test doubles shared by unit tests.

use crate::engine::{EngineError, EngineGateway, EngineStatus};
use crate::mock::{Mock, MockSpec, MockType, Workspace};
use crate::mock::{GrpcMethod, GrpcService, GrpcSpec, HttpMatcher, HttpSpec, MqttSpec, MqttTopic};
use crate::store::{InMemoryMockStore, MockFilter, MockStore, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Store whose every call fails as unavailable
pub struct UnavailableStore;

fn down<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

#[async_trait]
impl MockStore for UnavailableStore {
    async fn create(&self, _mock: Mock) -> Result<(), StoreError> {
        down()
    }
    async fn get(&self, _id: &str) -> Result<Mock, StoreError> {
        down()
    }
    async fn update(&self, _mock: Mock) -> Result<(), StoreError> {
        down()
    }
    async fn delete(&self, _id: &str) -> Result<(), StoreError> {
        down()
    }
    async fn list(&self, _filter: &MockFilter) -> Result<Vec<Mock>, StoreError> {
        down()
    }
    async fn bulk_create(&self, _mocks: Vec<Mock>) -> Result<(), StoreError> {
        down()
    }
    async fn delete_by_type(&self, _mock_type: MockType) -> Result<Vec<String>, StoreError> {
        down()
    }
    async fn delete_all(&self) -> Result<Vec<String>, StoreError> {
        down()
    }
    async fn create_workspace(&self, _workspace: Workspace) -> Result<(), StoreError> {
        down()
    }
    async fn get_workspace(&self, _id: &str) -> Result<Workspace, StoreError> {
        down()
    }
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, StoreError> {
        down()
    }
    async fn delete_workspace(&self, _id: &str) -> Result<(), StoreError> {
        down()
    }
}

/// In-memory store whose batch writes always fail
pub struct BulkFailingStore {
    pub inner: Arc<InMemoryMockStore>,
}

#[async_trait]
impl MockStore for BulkFailingStore {
    async fn create(&self, mock: Mock) -> Result<(), StoreError> {
        self.inner.create(mock).await
    }
    async fn get(&self, id: &str) -> Result<Mock, StoreError> {
        self.inner.get(id).await
    }
    async fn update(&self, mock: Mock) -> Result<(), StoreError> {
        self.inner.update(mock).await
    }
    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }
    async fn list(&self, filter: &MockFilter) -> Result<Vec<Mock>, StoreError> {
        self.inner.list(filter).await
    }
    async fn bulk_create(&self, _mocks: Vec<Mock>) -> Result<(), StoreError> {
        down()
    }
    async fn delete_by_type(&self, mock_type: MockType) -> Result<Vec<String>, StoreError> {
        self.inner.delete_by_type(mock_type).await
    }
    async fn delete_all(&self) -> Result<Vec<String>, StoreError> {
        self.inner.delete_all().await
    }
    async fn create_workspace(&self, workspace: Workspace) -> Result<(), StoreError> {
        self.inner.create_workspace(workspace).await
    }
    async fn get_workspace(&self, id: &str) -> Result<Workspace, StoreError> {
        self.inner.get_workspace(id).await
    }
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, StoreError> {
        self.inner.list_workspaces().await
    }
    async fn delete_workspace(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete_workspace(id).await
    }
}

/// Engine call as recorded by [`ScriptedEngine`]
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Create(Mock),
    Update(String, Mock),
    Delete(String),
}

/// Engine double that records calls and fails the ones it is told to
#[derive(Default)]
pub struct ScriptedEngine {
    pub calls: Mutex<Vec<EngineCall>>,
    pub fail_create: Mutex<Option<EngineError>>,
    pub fail_update: Mutex<Option<EngineError>>,
    pub fail_delete: Mutex<Option<EngineError>>,
    pub mocks: Mutex<Vec<Mock>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create(err: EngineError) -> Self {
        let engine = Self::new();
        *engine.fail_create.lock() = Some(err);
        engine
    }

    pub fn failing_update(err: EngineError) -> Self {
        let engine = Self::new();
        *engine.fail_update.lock() = Some(err);
        engine
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl EngineGateway for ScriptedEngine {
    async fn create_mock(&self, mock: &Mock) -> Result<(), EngineError> {
        self.calls.lock().push(EngineCall::Create(mock.clone()));
        match self.fail_create.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn update_mock(&self, id: &str, mock: &Mock) -> Result<(), EngineError> {
        self.calls
            .lock()
            .push(EngineCall::Update(id.to_string(), mock.clone()));
        match self.fail_update.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn delete_mock(&self, id: &str) -> Result<(), EngineError> {
        self.calls.lock().push(EngineCall::Delete(id.to_string()));
        match self.fail_delete.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn get_mock(&self, id: &str) -> Result<Mock, EngineError> {
        self.mocks
            .lock()
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    async fn list_mocks(&self) -> Result<Vec<Mock>, EngineError> {
        Ok(self.mocks.lock().clone())
    }

    async fn status(&self) -> Result<EngineStatus, EngineError> {
        Ok(EngineStatus {
            id: "scripted".to_string(),
            status: "ok".to_string(),
            mock_count: self.mocks.lock().len(),
            ..Default::default()
        })
    }
}

// ============================================================================
// Mock builders
// ============================================================================

pub fn http_mock(id: &str, workspace: &str, method: &str, path: &str) -> Mock {
    Mock::new(MockSpec::Http {
        http: HttpSpec {
            matcher: HttpMatcher {
                method: method.to_string(),
                path: path.to_string(),
                ..Default::default()
            },
            response: Some(serde_json::json!({"statusCode": 200})),
            ..Default::default()
        },
    })
    .with_id(id)
    .in_workspace(workspace)
}

pub fn mqtt_mock(id: &str, workspace: &str, port: u16, topics: &[&str]) -> Mock {
    Mock::new(MockSpec::Mqtt {
        mqtt: MqttSpec {
            port,
            topics: topics
                .iter()
                .map(|t| MqttTopic {
                    topic: t.to_string(),
                    ..Default::default()
                })
                .collect(),
        },
    })
    .with_id(id)
    .in_workspace(workspace)
}

/// gRPC mock from `(service, [methods])` pairs
pub fn grpc_mock(id: &str, workspace: &str, port: u16, services: &[(&str, &[&str])]) -> Mock {
    let services: BTreeMap<String, GrpcService> = services
        .iter()
        .map(|(service, methods)| {
            (
                service.to_string(),
                GrpcService {
                    methods: methods
                        .iter()
                        .map(|m| (m.to_string(), GrpcMethod::default()))
                        .collect(),
                },
            )
        })
        .collect();
    Mock::new(MockSpec::Grpc {
        grpc: GrpcSpec {
            port,
            services,
            ..Default::default()
        },
    })
    .with_id(id)
    .in_workspace(workspace)
}
