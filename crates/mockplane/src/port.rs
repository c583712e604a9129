//! Port arbitration for mocks that own a dedicated listener port.
//!
//! gRPC and MQTT mocks bind their own port. Two such mocks may only share a
//! port when they speak the same protocol *and* live in the same workspace, in
//! which case the newer one is folded into the older one (several services on
//! one gRPC server, several topics on one broker). Everything else is a
//! conflict.
//!
//! The comparison scope is the mock's own workspace, widened to every
//! workspace served by the same engine when that engine is shared, since those
//! workspaces share one port space.

use crate::engine::EngineSlot;
use crate::mock::{Mock, MockType};
use crate::store::{MockFilter, MockStore};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a port claim was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictReason {
    /// Another protocol already owns the port
    CrossProtocol,
    /// Same protocol, but in another workspace
    CrossWorkspace,
    /// A merge target exists but merging is not allowed for this operation
    MergeNotAllowed,
    /// An earlier entry of the same batch claims the port
    DuplicateInBatch,
}

impl ConflictReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictReason::CrossProtocol => "crossProtocol",
            ConflictReason::CrossWorkspace => "crossWorkspace",
            ConflictReason::MergeNotAllowed => "mergeNotAllowed",
            ConflictReason::DuplicateInBatch => "duplicateInBatch",
        }
    }
}

/// A blocking port collision
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortConflict {
    pub port: u16,
    pub conflicting_mock_id: String,
    pub conflicting_mock_name: String,
    pub conflicting_type: MockType,
    pub conflicting_workspace_id: String,
    pub reason: ConflictReason,
    /// Mock whose claim was refused (set for batch checks)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_id: Option<String>,
}

impl PortConflict {
    pub fn new(port: u16, existing: &Mock, reason: ConflictReason) -> Self {
        Self {
            port,
            conflicting_mock_id: existing.id.clone(),
            conflicting_mock_name: existing.display_name().to_string(),
            conflicting_type: existing.mock_type(),
            conflicting_workspace_id: existing.workspace_id.clone(),
            reason,
            mock_id: None,
        }
    }

    fn for_mock(mut self, mock_id: &str) -> Self {
        self.mock_id = Some(mock_id.to_string());
        self
    }
}

impl fmt::Display for PortConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owner = format!(
            "{} mock '{}' ({})",
            self.conflicting_type, self.conflicting_mock_name, self.conflicting_mock_id
        );
        match self.reason {
            ConflictReason::CrossProtocol => write!(
                f,
                "port {} is already used by {}; ports cannot be shared across protocols",
                self.port, owner
            ),
            ConflictReason::CrossWorkspace => write!(
                f,
                "port {} is already used by {} in workspace '{}'; ports are exclusive per workspace",
                self.port, owner, self.conflicting_workspace_id
            ),
            ConflictReason::MergeNotAllowed => write!(
                f,
                "port {} is already used by {}; define all resources for this port in that mock",
                self.port, owner
            ),
            ConflictReason::DuplicateInBatch => write!(
                f,
                "port {} is already claimed by {} earlier in the same batch",
                self.port, owner
            ),
        }
    }
}

/// Outcome of a port availability check
#[derive(Debug, Clone, PartialEq)]
pub enum PortAvailability {
    /// No dedicated port, or nobody else holds it
    Free,
    /// Same protocol and workspace already on the port; fold into this mock
    Merge(Box<Mock>),
    /// Port held by a mock it cannot be shared with
    Conflict(PortConflict),
}

/// Dedicated port of a gRPC/MQTT mock, 0 for everything else.
pub fn get_port(mock: &Mock) -> u16 {
    mock.spec.port()
}

/// Decides whether a mock may take its port.
pub struct PortArbiter {
    store: Arc<dyn MockStore>,
    engine: Arc<EngineSlot>,
}

impl PortArbiter {
    pub fn new(store: Arc<dyn MockStore>, engine: Arc<EngineSlot>) -> Self {
        Self { store, engine }
    }

    /// Check whether `mock` can take its port, ignoring the mock `exclude_id`.
    ///
    /// Failure to enumerate existing mocks never blocks: the engine will report
    /// a real bind failure when it tries to serve the port.
    pub async fn check_port_availability(
        &self,
        mock: &Mock,
        exclude_id: Option<&str>,
    ) -> PortAvailability {
        let excluded: BTreeSet<&str> = exclude_id.into_iter().collect();
        self.availability_excluding(mock, &excluded).await
    }

    async fn availability_excluding(
        &self,
        mock: &Mock,
        excluded: &BTreeSet<&str>,
    ) -> PortAvailability {
        let port = get_port(mock);
        if port == 0 {
            return PortAvailability::Free;
        }

        let candidates = self.mocks_in_scope(&mock.workspace_id).await;
        let on_port: Vec<&Mock> = candidates
            .iter()
            .filter(|m| !excluded.contains(m.id.as_str()))
            .filter(|m| get_port(m) == port)
            .collect();

        let mut merge_target = None;
        for existing in on_port {
            if existing.mock_type() != mock.mock_type() {
                debug!(port, existing = %existing.id, "Cross-protocol port conflict");
                return PortAvailability::Conflict(PortConflict::new(
                    port,
                    existing,
                    ConflictReason::CrossProtocol,
                ));
            }
            if existing.workspace_id != mock.workspace_id {
                debug!(port, existing = %existing.id, "Cross-workspace port conflict");
                return PortAvailability::Conflict(PortConflict::new(
                    port,
                    existing,
                    ConflictReason::CrossWorkspace,
                ));
            }
            merge_target.get_or_insert(existing);
        }

        match merge_target {
            Some(target) => PortAvailability::Merge(Box::new(target.clone())),
            None => PortAvailability::Free,
        }
    }

    /// Port conflicts for a batch. One port per batch, first entry wins; the
    /// winners are also checked against persisted mocks, where a merge target
    /// counts as a conflict.
    ///
    /// With `replacing`, persisted mocks that share an id with any batch entry
    /// are about to be replaced and are left out of the comparison.
    pub async fn check_bulk_port_conflicts(
        &self,
        mocks: &[Mock],
        replacing: bool,
    ) -> Vec<PortConflict> {
        let batch_ids: BTreeSet<&str> = mocks.iter().map(|m| m.id.as_str()).collect();
        let mut conflicts = Vec::new();
        let mut claimed: HashMap<u16, &Mock> = HashMap::new();

        for mock in mocks {
            let port = get_port(mock);
            if port == 0 {
                continue;
            }
            if let Some(first) = claimed.get(&port) {
                conflicts.push(
                    PortConflict::new(port, first, ConflictReason::DuplicateInBatch)
                        .for_mock(&mock.id),
                );
                continue;
            }
            claimed.insert(port, mock);

            let excluded = if replacing {
                batch_ids.clone()
            } else {
                BTreeSet::from([mock.id.as_str()])
            };
            match self.availability_excluding(mock, &excluded).await {
                PortAvailability::Free => {}
                PortAvailability::Conflict(conflict) => conflicts.push(conflict.for_mock(&mock.id)),
                PortAvailability::Merge(target) => conflicts.push(
                    PortConflict::new(port, &target, ConflictReason::MergeNotAllowed)
                        .for_mock(&mock.id),
                ),
            }
        }

        conflicts
    }

    /// Workspaces sharing a port space with `workspace_id`.
    async fn scope(&self, workspace_id: &str) -> BTreeSet<String> {
        let mut scope = BTreeSet::from([workspace_id.to_string()]);

        let engine_id = match self.store.get_workspace(workspace_id).await {
            Ok(ws) => ws.engine_id,
            Err(_) => None,
        };
        let Some(engine_id) = engine_id else {
            return scope;
        };

        match self.store.list_workspaces().await {
            Ok(workspaces) => scope.extend(
                workspaces
                    .into_iter()
                    .filter(|ws| ws.engine_id.as_deref() == Some(engine_id.as_str()))
                    .map(|ws| ws.id),
            ),
            Err(e) => warn!(workspace_id, "Could not list sibling workspaces: {}", e),
        }
        scope
    }

    /// Mocks visible to the port comparison. Store first, engine as fallback,
    /// nothing if both are unreachable.
    async fn mocks_in_scope(&self, workspace_id: &str) -> Vec<Mock> {
        let scope = self.scope(workspace_id).await;

        let mut from_store = Vec::new();
        let mut store_failed = false;
        for ws in &scope {
            match self.store.list(&MockFilter::workspace(ws.clone())).await {
                Ok(mocks) => from_store.extend(mocks),
                Err(e) => {
                    warn!(workspace_id = %ws, "Port check could not list mocks from store: {}", e);
                    store_failed = true;
                    break;
                }
            }
        }
        if !store_failed {
            return from_store;
        }

        let Some(gateway) = self.engine.gateway() else {
            return Vec::new();
        };
        match gateway.list_mocks().await {
            Ok(mocks) => mocks
                .into_iter()
                .filter(|m| scope.contains(&m.workspace_id))
                .collect(),
            Err(e) => {
                warn!("Port check could not list mocks from engine: {}", e);
                Vec::new()
            }
        }
    }
}
