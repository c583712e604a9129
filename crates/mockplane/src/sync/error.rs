use crate::merge::MergeError;
use crate::port::PortConflict;
use crate::routing::RouteCollision;
use crate::store::StoreError;
use hyper::StatusCode;
use serde_json::json;
use thiserror::Error;

/// Errors from control-plane mutations and reads
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("Invalid mock: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("Duplicate mock ids in batch: {}", .0.join(", "))]
    DuplicateIds(Vec<String>),

    #[error("{0}")]
    PortConflict(PortConflict),

    #[error("{} port conflict(s) in batch", .0.len())]
    PortConflicts(Vec<PortConflict>),

    #[error("{0}")]
    RouteCollision(RouteCollision),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Store(StoreError),

    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Engine rejected mock: {message}")]
    EngineRejected { message: String, port_related: bool },
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => SyncError::NotFound(what),
            StoreError::AlreadyExists(what) => SyncError::AlreadyExists(what),
            other => SyncError::Store(other),
        }
    }
}

impl SyncError {
    /// HTTP status for the admin API
    pub fn status_code(&self) -> StatusCode {
        match self {
            SyncError::Validation(_) | SyncError::DuplicateIds(_) => StatusCode::BAD_REQUEST,
            SyncError::NotFound(_) => StatusCode::NOT_FOUND,
            SyncError::AlreadyExists(_)
            | SyncError::PortConflict(_)
            | SyncError::PortConflicts(_)
            | SyncError::RouteCollision(_) => StatusCode::CONFLICT,
            SyncError::Merge(MergeError::Incompatible { .. }) => StatusCode::BAD_REQUEST,
            SyncError::Merge(_) => StatusCode::CONFLICT,
            SyncError::Store(_) | SyncError::EngineUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SyncError::EngineRejected { port_related, .. } => {
                if *port_related {
                    StatusCode::CONFLICT
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
        }
    }

    /// Machine-readable error code for the admin API
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::Validation(_) => "validation_error",
            SyncError::NotFound(_) => "not_found",
            SyncError::AlreadyExists(_) => "already_exists",
            SyncError::DuplicateIds(_) => "duplicate_id",
            SyncError::PortConflict(_) | SyncError::PortConflicts(_) => "port_conflict",
            SyncError::RouteCollision(_) => "route_conflict",
            SyncError::Merge(MergeError::ServiceConflict { .. }) => "service_conflict",
            SyncError::Merge(MergeError::TopicConflict { .. }) => "topic_conflict",
            SyncError::Merge(MergeError::Incompatible { .. }) => "validation_error",
            SyncError::Store(_) => "store_unavailable",
            SyncError::EngineUnavailable(_) => "engine_unavailable",
            SyncError::EngineRejected { port_related, .. } => {
                if *port_related {
                    "port_conflict"
                } else {
                    "engine_rejected"
                }
            }
        }
    }

    /// Structured details for the error body's `conflicts` field
    pub fn conflicts(&self) -> Option<serde_json::Value> {
        match self {
            SyncError::PortConflict(conflict) => Some(json!([conflict])),
            SyncError::PortConflicts(conflicts) => Some(json!(conflicts)),
            SyncError::RouteCollision(collision) => Some(json!([collision])),
            SyncError::DuplicateIds(ids) => Some(json!(ids)),
            SyncError::Merge(MergeError::ServiceConflict { service, method }) => {
                Some(json!([{ "service": service, "method": method }]))
            }
            SyncError::Merge(MergeError::TopicConflict { topic }) => {
                Some(json!([{ "topic": topic }]))
            }
            _ => None,
        }
    }
}
