//! Persistent configuration store for mocks and workspaces.
//!
//! The control plane only depends on the [`MockStore`] CRUD contract. The
//! store is authoritative: when it and the engine disagree, the engine is
//! expected to pull full state from the store on reconnect.

mod inmemory;

pub use inmemory::InMemoryMockStore;

use crate::mock::{Mock, MockType, Workspace};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Store failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Filter for listing mocks. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockFilter {
    #[serde(default, rename = "type")]
    pub mock_type: Option<MockType>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    /// Case-insensitive substring of id, name, description or route path
    #[serde(default)]
    pub search: Option<String>,
}

impl MockFilter {
    pub fn workspace(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: Some(workspace_id.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, mock: &Mock) -> bool {
        if self.mock_type.is_some_and(|t| t != mock.mock_type()) {
            return false;
        }
        if let Some(parent) = &self.parent_id {
            if mock.parent_id.as_deref() != Some(parent.as_str()) {
                return false;
            }
        }
        if self.enabled.is_some_and(|e| e != mock.is_enabled()) {
            return false;
        }
        if let Some(ws) = &self.workspace_id {
            if &mock.workspace_id != ws {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let haystacks = [
                Some(mock.id.as_str()),
                Some(mock.name.as_str()),
                mock.description.as_deref(),
                mock.route().map(|(_, path)| path),
            ];
            return haystacks
                .into_iter()
                .flatten()
                .any(|h| h.to_lowercase().contains(&needle));
        }
        true
    }
}

/// CRUD contract over mocks and workspaces.
///
/// Implementations must be safe for concurrent use; the control plane holds
/// no lock of its own around store calls.
#[async_trait]
pub trait MockStore: Send + Sync {
    async fn create(&self, mock: Mock) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Mock, StoreError>;

    async fn update(&self, mock: Mock) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// List mocks ordered by sort key (ascending), then identifier
    async fn list(&self, filter: &MockFilter) -> Result<Vec<Mock>, StoreError>;

    /// Insert all mocks or none of them
    async fn bulk_create(&self, mocks: Vec<Mock>) -> Result<(), StoreError>;

    /// Delete every mock of a type, returning the deleted identifiers
    async fn delete_by_type(&self, mock_type: MockType) -> Result<Vec<String>, StoreError>;

    /// Delete every mock, returning the deleted identifiers
    async fn delete_all(&self) -> Result<Vec<String>, StoreError>;

    async fn create_workspace(&self, workspace: Workspace) -> Result<(), StoreError>;

    async fn get_workspace(&self, id: &str) -> Result<Workspace, StoreError>;

    async fn list_workspaces(&self) -> Result<Vec<Workspace>, StoreError>;

    async fn delete_workspace(&self, id: &str) -> Result<(), StoreError>;
}
