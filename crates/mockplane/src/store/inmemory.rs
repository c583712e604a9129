use super::{MockFilter, MockStore, StoreError};
use crate::mock::{Mock, MockType, Workspace};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory implementation of MockStore
///
/// Keeps mocks and workspaces in hash maps behind read/write locks. Useful for
/// testing, development, and single-instance deployments where the
/// configuration is re-applied on start.
#[derive(Default)]
pub struct InMemoryMockStore {
    mocks: RwLock<HashMap<String, Mock>>,
    workspaces: RwLock<HashMap<String, Workspace>>,
}

impl InMemoryMockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored mocks
    pub fn len(&self) -> usize {
        self.mocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mocks.read().is_empty()
    }

    fn sorted(mut mocks: Vec<Mock>) -> Vec<Mock> {
        mocks.sort_by(|a, b| {
            let ka = a.sort_key.unwrap_or(i64::MAX);
            let kb = b.sort_key.unwrap_or(i64::MAX);
            ka.cmp(&kb).then_with(|| a.id.cmp(&b.id))
        });
        mocks
    }

    fn remove_where(&self, predicate: impl Fn(&Mock) -> bool) -> Vec<String> {
        let mut mocks = self.mocks.write();
        let ids: Vec<String> = mocks
            .values()
            .filter(|m| predicate(m))
            .map(|m| m.id.clone())
            .collect();
        for id in &ids {
            mocks.remove(id);
        }
        ids
    }
}

#[async_trait]
impl MockStore for InMemoryMockStore {
    async fn create(&self, mock: Mock) -> Result<(), StoreError> {
        let mut mocks = self.mocks.write();
        if mocks.contains_key(&mock.id) {
            return Err(StoreError::AlreadyExists(format!("mock {}", mock.id)));
        }
        mocks.insert(mock.id.clone(), mock);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Mock, StoreError> {
        self.mocks
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("mock {id}")))
    }

    async fn update(&self, mock: Mock) -> Result<(), StoreError> {
        let mut mocks = self.mocks.write();
        match mocks.get_mut(&mock.id) {
            Some(slot) => {
                *slot = mock;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("mock {}", mock.id))),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.mocks
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("mock {id}")))
    }

    async fn list(&self, filter: &MockFilter) -> Result<Vec<Mock>, StoreError> {
        let matching: Vec<Mock> = self
            .mocks
            .read()
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        Ok(Self::sorted(matching))
    }

    async fn bulk_create(&self, batch: Vec<Mock>) -> Result<(), StoreError> {
        // Single write lock: either every mock lands or none does
        let mut mocks = self.mocks.write();
        if let Some(existing) = batch.iter().find(|m| mocks.contains_key(&m.id)) {
            return Err(StoreError::AlreadyExists(format!("mock {}", existing.id)));
        }
        for mock in batch {
            mocks.insert(mock.id.clone(), mock);
        }
        Ok(())
    }

    async fn delete_by_type(&self, mock_type: MockType) -> Result<Vec<String>, StoreError> {
        Ok(self.remove_where(|m| m.mock_type() == mock_type))
    }

    async fn delete_all(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.remove_where(|_| true))
    }

    async fn create_workspace(&self, workspace: Workspace) -> Result<(), StoreError> {
        let mut workspaces = self.workspaces.write();
        if workspaces.contains_key(&workspace.id) {
            return Err(StoreError::AlreadyExists(format!("workspace {}", workspace.id)));
        }
        workspaces.insert(workspace.id.clone(), workspace);
        Ok(())
    }

    async fn get_workspace(&self, id: &str) -> Result<Workspace, StoreError> {
        self.workspaces
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("workspace {id}")))
    }

    async fn list_workspaces(&self) -> Result<Vec<Workspace>, StoreError> {
        let mut workspaces: Vec<Workspace> = self.workspaces.read().values().cloned().collect();
        workspaces.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(workspaces)
    }

    async fn delete_workspace(&self, id: &str) -> Result<(), StoreError> {
        self.workspaces
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("workspace {id}")))
    }
}
