//! Control-plane synchronizer: keeps the store and the connected engine in step.
//!
//! Every mutation writes the store first and then notifies the engine. The
//! store is authoritative. When the engine refuses a freshly created mock the
//! store write is compensated, so a mock the engine cannot serve is never left
//! behind. Other engine notification failures are logged and counted, and the
//! engine catches up by pulling full state when it reconnects.
//!
//! A mutation moves through these states, each logged at debug level:
//!
//! ```text
//! Received -> Validated -> PortChecked -> {Merged | Persisted} -> EngineNotified -> Done
//!                  \              \                                  \
//!           RejectedValidation  RejectedConflict                   RolledBack
//! ```
//!
//! Route and port checks read a snapshot of the store. Two concurrent requests
//! can both pass the checks before either is persisted; the engine's own bind
//! failure is the backstop for ports. Dropping a request future after the store
//! write but before the engine call leaves the write in place uncompensated.

mod error;

#[cfg(test)]
mod tests;

pub use error::SyncError;

use crate::engine::{EngineError, EngineSlot, EngineStatus};
use crate::merge::{merge_into, MergeResult};
use crate::metrics;
use crate::mock::{new_mock_id, validate_spec, Mock, MockPatch, MockType, Workspace};
use crate::port::{ConflictReason, PortArbiter, PortAvailability, PortConflict};
use crate::routing::{
    check_base_path_assignment, check_route_collision, normalize_base_path, prefix_for_engine,
};
use crate::store::{MockFilter, MockStore, StoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Workspace identifiers the synchronizer needs to know about
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    /// Workspace whose routes are served without a base path
    pub root_workspace_id: String,
    /// Workspace assigned to mocks that name none
    pub default_workspace_id: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            root_workspace_id: "local".to_string(),
            default_workspace_id: "local".to_string(),
        }
    }
}

/// Result of a create
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// Stored as a new mock
    Created(Mock),
    /// Folded into the mock that already owns the port
    Merged { target: Mock, result: MergeResult },
}

/// Result of a bulk create
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub created: Vec<Mock>,
    /// Identifiers deleted before the batch was written
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replaced: Vec<String>,
    /// Engine notification failures; the batch is persisted regardless
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Lifecycle states of a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MutationState {
    Received,
    Validated,
    PortChecked,
    Merged,
    Persisted,
    EngineNotified,
    Done,
    RejectedValidation,
    RejectedConflict,
    RolledBack,
}

impl MutationState {
    fn as_str(&self) -> &'static str {
        match self {
            MutationState::Received => "received",
            MutationState::Validated => "validated",
            MutationState::PortChecked => "port_checked",
            MutationState::Merged => "merged",
            MutationState::Persisted => "persisted",
            MutationState::EngineNotified => "engine_notified",
            MutationState::Done => "done",
            MutationState::RejectedValidation => "rejected_validation",
            MutationState::RejectedConflict => "rejected_conflict",
            MutationState::RolledBack => "rolled_back",
        }
    }
}

fn transition(mock_id: &str, state: MutationState) {
    debug!(mock_id, state = state.as_str(), "Mutation state");
}

/// Record the outcome of a public operation and pass it through
fn observed<T>(operation: &str, ok_label: &str, result: Result<T, SyncError>) -> Result<T, SyncError> {
    let label = match &result {
        Ok(_) => ok_label,
        Err(e) if e.status_code().is_client_error() => "rejected",
        Err(_) => "error",
    };
    metrics::record_mutation(operation, label);
    result
}

/// Coordinates validation, conflict checks, persistence and engine
/// notification for every mock mutation.
pub struct ControlPlaneSynchronizer {
    store: Arc<dyn MockStore>,
    engine: Arc<EngineSlot>,
    ports: PortArbiter,
    settings: SyncSettings,
}

impl ControlPlaneSynchronizer {
    pub fn new(store: Arc<dyn MockStore>, engine: Arc<EngineSlot>, settings: SyncSettings) -> Self {
        let ports = PortArbiter::new(Arc::clone(&store), Arc::clone(&engine));
        Self {
            store,
            engine,
            ports,
            settings,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn engine(&self) -> &Arc<EngineSlot> {
        &self.engine
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a mock, or fold it into the mock that already owns its port.
    pub async fn create(&self, mock: Mock) -> Result<CreateOutcome, SyncError> {
        let result = self.create_inner(mock).await;
        let label = match &result {
            Ok(CreateOutcome::Merged { .. }) => "merged",
            _ => "created",
        };
        observed("create", label, result)
    }

    async fn create_inner(&self, mut mock: Mock) -> Result<CreateOutcome, SyncError> {
        transition(&mock.id, MutationState::Received);
        let now = Utc::now();
        self.normalize(&mut mock, now)?;
        transition(&mock.id, MutationState::Validated);

        // An existing id is rejected before the port check can see its stored
        // copy as a merge target
        if self.store.get(&mock.id).await.is_ok() {
            transition(&mock.id, MutationState::RejectedConflict);
            warn!(mock_id = %mock.id, "Create rejected: id already exists");
            return Err(SyncError::AlreadyExists(format!("mock {}", mock.id)));
        }

        self.check_routes(&mock).await?;

        match self.ports.check_port_availability(&mock, None).await {
            PortAvailability::Free => {}
            PortAvailability::Conflict(conflict) => {
                return Err(self.reject_port(&mock.id, conflict));
            }
            PortAvailability::Merge(target) => {
                transition(&mock.id, MutationState::PortChecked);
                return self.merge_into_target(*target, &mock).await;
            }
        }
        transition(&mock.id, MutationState::PortChecked);

        self.store.create(mock.clone()).await?;
        transition(&mock.id, MutationState::Persisted);

        if let Some(gateway) = self.engine.gateway() {
            let workspace = self.workspace(&mock.workspace_id).await;
            let engine_mock =
                prefix_for_engine(&mock, workspace.as_ref(), &self.settings.root_workspace_id);
            if let Err(e) = gateway.create_mock(&engine_mock).await {
                let port_related = e.is_port_related();
                warn!(mock_id = %mock.id, port_related, "Engine rejected mock: {}", e);
                if port_related {
                    metrics::record_conflict("engine");
                }
                self.rollback_create(&mock.id).await;
                return Err(SyncError::EngineRejected {
                    message: e.message().to_string(),
                    port_related,
                });
            }
            transition(&mock.id, MutationState::EngineNotified);
        }

        transition(&mock.id, MutationState::Done);
        info!(mock_id = %mock.id, mock_type = %mock.mock_type(), workspace_id = %mock.workspace_id, "Mock created");
        Ok(CreateOutcome::Created(mock))
    }

    async fn merge_into_target(
        &self,
        mut target: Mock,
        source: &Mock,
    ) -> Result<CreateOutcome, SyncError> {
        let result = match merge_into(&mut target, source) {
            Ok(result) => result,
            Err(e) => {
                transition(&source.id, MutationState::RejectedConflict);
                warn!(mock_id = %source.id, target_id = %target.id, "Merge rejected: {}", e);
                return Err(e.into());
            }
        };
        transition(&source.id, MutationState::Merged);

        self.store.update(target.clone()).await?;
        transition(&target.id, MutationState::Persisted);

        if let Some(gateway) = self.engine.gateway() {
            let workspace = self.workspace(&target.workspace_id).await;
            let engine_mock =
                prefix_for_engine(&target, workspace.as_ref(), &self.settings.root_workspace_id);
            match gateway.update_mock(&target.id, &engine_mock).await {
                Ok(()) => transition(&target.id, MutationState::EngineNotified),
                Err(e) => self.notify_failed("merge", &target.id, &e),
            }
        }

        transition(&source.id, MutationState::Done);
        info!(
            mock_id = %source.id,
            target_id = %target.id,
            port = target.spec.port(),
            added = ?result.added,
            "Mock merged into existing port owner"
        );
        Ok(CreateOutcome::Merged { target, result })
    }

    /// Replace the mock `id`. Port-related engine failures restore the
    /// previous version.
    pub async fn update(&self, id: &str, mock: Mock) -> Result<Mock, SyncError> {
        observed("update", "ok", self.update_inner(id, mock).await)
    }

    async fn update_inner(&self, id: &str, mut mock: Mock) -> Result<Mock, SyncError> {
        transition(id, MutationState::Received);
        let existing = self.store.get(id).await?;

        mock.id = id.to_string();
        if mock.workspace_id.is_empty() {
            mock.workspace_id = existing.workspace_id.clone();
        }
        if mock.name.is_empty() {
            mock.name = existing.name.clone();
        }
        if mock.sort_key.is_none() {
            mock.sort_key = existing.sort_key;
        }
        mock.created_at = existing.created_at.or(mock.created_at);
        self.normalize(&mut mock, Utc::now())?;
        transition(id, MutationState::Validated);

        self.check_routes(&mock).await?;

        match self.ports.check_port_availability(&mock, Some(id)).await {
            PortAvailability::Free => {}
            PortAvailability::Conflict(conflict) => return Err(self.reject_port(id, conflict)),
            PortAvailability::Merge(target) => {
                let conflict = PortConflict::new(
                    mock.spec.port(),
                    &target,
                    ConflictReason::MergeNotAllowed,
                );
                return Err(self.reject_port(id, conflict));
            }
        }
        transition(id, MutationState::PortChecked);

        self.store.update(mock.clone()).await?;
        transition(id, MutationState::Persisted);

        if let Some(gateway) = self.engine.gateway() {
            let workspace = self.workspace(&mock.workspace_id).await;
            let engine_mock =
                prefix_for_engine(&mock, workspace.as_ref(), &self.settings.root_workspace_id);
            match gateway.update_mock(id, &engine_mock).await {
                Ok(()) => transition(id, MutationState::EngineNotified),
                Err(e) if e.is_port_related() => {
                    warn!(mock_id = id, "Engine could not bind updated mock: {}", e);
                    metrics::record_conflict("engine");
                    self.rollback_update(existing).await;
                    return Err(SyncError::EngineRejected {
                        message: e.message().to_string(),
                        port_related: true,
                    });
                }
                Err(e) => self.notify_failed("update", id, &e),
            }
        }

        transition(id, MutationState::Done);
        info!(mock_id = id, "Mock updated");
        Ok(mock)
    }

    /// Apply a partial update. Never rolled back.
    pub async fn patch(&self, id: &str, patch: MockPatch) -> Result<Mock, SyncError> {
        observed("patch", "ok", self.patch_inner(id, patch).await)
    }

    async fn patch_inner(&self, id: &str, patch: MockPatch) -> Result<Mock, SyncError> {
        let mut mock = self.store.get(id).await?;
        if !patch.apply_to(&mut mock) {
            debug!(mock_id = id, "Empty patch");
            return Ok(mock);
        }
        mock.updated_at = Some(Utc::now());

        self.store.update(mock.clone()).await?;
        transition(id, MutationState::Persisted);

        if let Some(gateway) = self.engine.gateway() {
            let workspace = self.workspace(&mock.workspace_id).await;
            let engine_mock =
                prefix_for_engine(&mock, workspace.as_ref(), &self.settings.root_workspace_id);
            match gateway.update_mock(id, &engine_mock).await {
                Ok(()) => transition(id, MutationState::EngineNotified),
                Err(e) => self.notify_failed("patch", id, &e),
            }
        }

        info!(mock_id = id, "Mock patched");
        Ok(mock)
    }

    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        observed("delete", "ok", self.delete_inner(id).await)
    }

    async fn delete_inner(&self, id: &str) -> Result<(), SyncError> {
        self.store.delete(id).await?;
        self.notify_deleted("delete", &[id.to_string()]).await;
        info!(mock_id = id, "Mock deleted");
        Ok(())
    }

    /// Delete every mock of one type, returning the deleted identifiers.
    pub async fn delete_by_type(&self, mock_type: MockType) -> Result<Vec<String>, SyncError> {
        let result: Result<Vec<String>, SyncError> = async {
            let ids = self.store.delete_by_type(mock_type).await?;
            self.notify_deleted("delete_by_type", &ids).await;
            info!(mock_type = %mock_type, count = ids.len(), "Mocks deleted by type");
            Ok(ids)
        }
        .await;
        observed("delete_by_type", "ok", result)
    }

    /// Delete every mock, returning the deleted identifiers.
    pub async fn delete_all(&self) -> Result<Vec<String>, SyncError> {
        let result: Result<Vec<String>, SyncError> = async {
            let ids = self.store.delete_all().await?;
            self.notify_deleted("delete_all", &ids).await;
            info!(count = ids.len(), "All mocks deleted");
            Ok(ids)
        }
        .await;
        observed("delete_all", "ok", result)
    }

    /// Create a batch of mocks atomically.
    ///
    /// Duplicate identifiers and port conflicts reject the whole batch before
    /// anything is written. With `replace`, mocks already stored under a batch
    /// identifier are deleted first and do not count against the batch's
    /// ports; they are restored if the batch cannot be stored.
    pub async fn bulk_create(
        &self,
        mocks: Vec<Mock>,
        replace: bool,
    ) -> Result<BulkOutcome, SyncError> {
        observed("bulk_create", "created", self.bulk_create_inner(mocks, replace).await)
    }

    async fn bulk_create_inner(
        &self,
        mut mocks: Vec<Mock>,
        replace: bool,
    ) -> Result<BulkOutcome, SyncError> {
        let mut seen = HashSet::new();
        let duplicates: BTreeSet<String> = mocks
            .iter()
            .filter(|m| !m.id.is_empty())
            .filter(|m| !seen.insert(m.id.as_str()))
            .map(|m| m.id.clone())
            .collect();
        if !duplicates.is_empty() {
            warn!(ids = ?duplicates, "Bulk create rejected: duplicate ids");
            return Err(SyncError::DuplicateIds(duplicates.into_iter().collect()));
        }

        let now = Utc::now();
        for (index, mock) in mocks.iter_mut().enumerate() {
            self.normalize(mock, now).map_err(|e| match e {
                SyncError::Validation(msg) => SyncError::Validation(format!("mock {index}: {msg}")),
                other => other,
            })?;
        }

        let conflicts = self.ports.check_bulk_port_conflicts(&mocks, replace).await;
        if !conflicts.is_empty() {
            for conflict in &conflicts {
                metrics::record_conflict(conflict.reason.as_str());
            }
            warn!(count = conflicts.len(), "Bulk create rejected: port conflicts");
            return Err(SyncError::PortConflicts(conflicts));
        }

        let mut outcome = BulkOutcome::default();
        let mut previous = Vec::new();
        if replace {
            for mock in &mocks {
                let existing = match self.store.get(&mock.id).await {
                    Ok(existing) => existing,
                    Err(StoreError::NotFound(_)) => continue,
                    Err(e) => {
                        self.restore_replaced(previous).await;
                        return Err(e.into());
                    }
                };
                match self.store.delete(&mock.id).await {
                    Ok(()) => previous.push(existing),
                    Err(StoreError::NotFound(_)) => {}
                    Err(e) => {
                        self.restore_replaced(previous).await;
                        return Err(e.into());
                    }
                }
            }
        }

        if let Err(e) = self.store.bulk_create(mocks.clone()).await {
            warn!(count = mocks.len(), "Bulk create failed in store: {}", e);
            self.restore_replaced(previous).await;
            return Err(e.into());
        }
        debug!(count = mocks.len(), "Bulk batch persisted");

        // The engine hears about replacements only once the batch is stored
        outcome.replaced = previous.into_iter().map(|m| m.id).collect();
        self.notify_deleted("bulk_replace", &outcome.replaced).await;

        if let Some(gateway) = self.engine.gateway() {
            let workspaces = self.workspace_map().await;
            for mock in &mocks {
                let engine_mock = prefix_for_engine(
                    mock,
                    workspaces.get(&mock.workspace_id),
                    &self.settings.root_workspace_id,
                );
                if let Err(e) = gateway.create_mock(&engine_mock).await {
                    self.notify_failed("bulk_create", &mock.id, &e);
                    outcome.warnings.push(format!("{}: {}", mock.id, e.message()));
                }
            }
        }

        info!(
            count = mocks.len(),
            replaced = outcome.replaced.len(),
            warnings = outcome.warnings.len(),
            "Bulk create completed"
        );
        outcome.created = mocks;
        Ok(outcome)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn get(&self, id: &str) -> Result<Mock, SyncError> {
        Ok(self.store.get(id).await?)
    }

    pub async fn list(&self, filter: &MockFilter) -> Result<Vec<Mock>, SyncError> {
        Ok(self.store.list(filter).await?)
    }

    /// Live status of the connected engine
    pub async fn engine_status(&self) -> Result<EngineStatus, SyncError> {
        let gateway = self
            .engine
            .gateway()
            .ok_or_else(|| SyncError::EngineUnavailable("no engine connected".to_string()))?;
        gateway.status().await.map_err(|e| match e {
            EngineError::Transport(msg) => SyncError::EngineUnavailable(msg),
            other => SyncError::EngineRejected {
                message: other.message().to_string(),
                port_related: false,
            },
        })
    }

    // ========================================================================
    // Workspaces
    // ========================================================================

    /// Register a workspace with a normalized, non-overlapping base path.
    pub async fn create_workspace(&self, mut workspace: Workspace) -> Result<Workspace, SyncError> {
        if workspace.id.trim().is_empty() {
            return Err(SyncError::Validation("workspace id is required".to_string()));
        }
        workspace.base_path =
            normalize_base_path(&workspace.base_path).map_err(SyncError::Validation)?;
        if workspace.id == self.settings.root_workspace_id && !workspace.base_path.is_empty() {
            return Err(SyncError::Validation(format!(
                "root workspace '{}' cannot have a base path",
                workspace.id
            )));
        }
        if workspace.name.is_empty() {
            workspace.name = workspace.id.clone();
        }

        let existing = self.store.list_workspaces().await?;
        check_base_path_assignment(
            &workspace.id,
            &workspace.base_path,
            workspace.engine_id.as_deref(),
            &existing,
        )
        .map_err(SyncError::Validation)?;

        self.store.create_workspace(workspace.clone()).await?;
        info!(workspace_id = %workspace.id, base_path = %workspace.base_path, "Workspace created");
        Ok(workspace)
    }

    pub async fn list_workspaces(&self) -> Result<Vec<Workspace>, SyncError> {
        Ok(self.store.list_workspaces().await?)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Fill in server-assigned fields and validate the spec.
    fn normalize(&self, mock: &mut Mock, now: DateTime<Utc>) -> Result<(), SyncError> {
        if mock.id.is_empty() {
            mock.id = new_mock_id(mock.mock_type());
        }
        if mock.name.is_empty() {
            mock.name = mock.id.clone();
        }
        if mock.workspace_id.is_empty() {
            mock.workspace_id = self.settings.default_workspace_id.clone();
        }
        mock.created_at.get_or_insert(now);
        mock.updated_at = Some(now);
        mock.sort_key.get_or_insert(-now.timestamp_millis());

        if let Err(msg) = validate_spec(mock) {
            transition(&mock.id, MutationState::RejectedValidation);
            return Err(SyncError::Validation(msg));
        }
        Ok(())
    }

    /// Reject route collisions against the persisted mocks. Skipped when the
    /// store cannot be listed.
    async fn check_routes(&self, mock: &Mock) -> Result<(), SyncError> {
        if !mock.mock_type().is_path_addressed() {
            return Ok(());
        }
        let existing = match self.store.list(&MockFilter::default()).await {
            Ok(mocks) => mocks,
            Err(e) => {
                warn!(mock_id = %mock.id, "Skipping route check, cannot list mocks: {}", e);
                return Ok(());
            }
        };
        let workspaces = self.workspace_map().await;

        let collision = check_route_collision(
            mock,
            workspaces.get(&mock.workspace_id),
            &existing,
            &workspaces,
            &self.settings.root_workspace_id,
        );
        match collision {
            None => Ok(()),
            Some(collision) => {
                transition(&mock.id, MutationState::RejectedConflict);
                metrics::record_conflict(collision.kind.as_str());
                warn!(mock_id = %mock.id, path = %collision.effective_path, "Route collision: {}", collision);
                Err(SyncError::RouteCollision(collision))
            }
        }
    }

    fn reject_port(&self, mock_id: &str, conflict: PortConflict) -> SyncError {
        transition(mock_id, MutationState::RejectedConflict);
        metrics::record_conflict(conflict.reason.as_str());
        warn!(mock_id, port = conflict.port, "Port conflict: {}", conflict);
        SyncError::PortConflict(conflict)
    }

    async fn workspace(&self, id: &str) -> Option<Workspace> {
        self.store.get_workspace(id).await.ok()
    }

    async fn workspace_map(&self) -> HashMap<String, Workspace> {
        match self.store.list_workspaces().await {
            Ok(workspaces) => workspaces.into_iter().map(|ws| (ws.id.clone(), ws)).collect(),
            Err(e) => {
                warn!("Cannot list workspaces: {}", e);
                HashMap::new()
            }
        }
    }

    async fn rollback_create(&self, mock_id: &str) {
        match self.store.delete(mock_id).await {
            Ok(()) => {
                metrics::record_rollback("create", true);
                transition(mock_id, MutationState::RolledBack);
                info!(mock_id, "Rolled back create after engine rejection");
            }
            Err(e) => {
                metrics::record_rollback("create", false);
                error!(mock_id, "Failed to roll back create: {}", e);
            }
        }
    }

    async fn rollback_update(&self, previous: Mock) {
        let mock_id = previous.id.clone();
        match self.store.update(previous).await {
            Ok(()) => {
                metrics::record_rollback("update", true);
                transition(&mock_id, MutationState::RolledBack);
                info!(mock_id = %mock_id, "Restored previous mock after engine rejection");
            }
            Err(e) => {
                metrics::record_rollback("update", false);
                error!(mock_id = %mock_id, "Failed to restore previous mock: {}", e);
            }
        }
    }

    /// Put back mocks deleted by a bulk replace whose batch never landed.
    async fn restore_replaced(&self, previous: Vec<Mock>) {
        for mock in previous {
            let mock_id = mock.id.clone();
            match self.store.create(mock).await {
                Ok(()) => {
                    metrics::record_rollback("bulk_replace", true);
                    transition(&mock_id, MutationState::RolledBack);
                    info!(mock_id = %mock_id, "Restored replaced mock after failed bulk create");
                }
                Err(e) => {
                    metrics::record_rollback("bulk_replace", false);
                    error!(mock_id = %mock_id, "Failed to restore replaced mock: {}", e);
                }
            }
        }
    }

    async fn notify_deleted(&self, operation: &str, ids: &[String]) {
        let Some(gateway) = self.engine.gateway() else {
            return;
        };
        for id in ids {
            match gateway.delete_mock(id).await {
                Ok(()) | Err(EngineError::NotFound(_)) => {}
                Err(e) => self.notify_failed(operation, id, &e),
            }
        }
    }

    fn notify_failed(&self, operation: &str, mock_id: &str, err: &EngineError) {
        metrics::record_engine_notify_failure(operation);
        warn!(mock_id, operation, "Engine notification failed: {}", err);
    }
}
