//! Gateway to the data-plane engine that actually serves mocks.
//!
//! The engine may be absent at any time. Mutations then succeed store-only and
//! the engine is expected to pull the full mock set from the store when it
//! (re)connects. Only read paths that need live engine state fail with
//! "engine unavailable".

mod client;
mod slot;

pub use client::HttpEngineClient;
pub use slot::{ConnectedEngine, EngineSlot};

use crate::mock::Mock;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Substrings of engine errors that indicate a listener/port problem
const PORT_ERROR_MARKERS: &[&str] = &[
    "address already in use",
    "bind:",
    "permission denied",
    "eaddrinuse",
];

/// Errors reported by an engine gateway
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("engine transport error: {0}")]
    Transport(String),
    #[error("engine rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("mock {0} not found on engine")]
    NotFound(String),
}

impl EngineError {
    pub fn message(&self) -> &str {
        match self {
            EngineError::Transport(msg) => msg,
            EngineError::Rejected { message, .. } => message,
            EngineError::NotFound(id) => id,
        }
    }

    /// Heuristic: does this failure come from binding the mock's port?
    pub fn is_port_related(&self) -> bool {
        if matches!(self, EngineError::NotFound(_)) {
            return false;
        }
        is_port_error_message(self.message())
    }
}

/// Classify an engine error message as a port/bind failure.
pub fn is_port_error_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    PORT_ERROR_MARKERS.iter().any(|m| lower.contains(m))
        || (lower.contains("port") && lower.contains("in use"))
}

/// Engine health as reported by the engine itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub mock_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u64>,
}

/// Operations the control plane needs from a connected engine.
#[async_trait]
pub trait EngineGateway: Send + Sync {
    async fn create_mock(&self, mock: &Mock) -> Result<(), EngineError>;

    async fn update_mock(&self, id: &str, mock: &Mock) -> Result<(), EngineError>;

    async fn delete_mock(&self, id: &str) -> Result<(), EngineError>;

    async fn get_mock(&self, id: &str) -> Result<Mock, EngineError>;

    async fn list_mocks(&self) -> Result<Vec<Mock>, EngineError>;

    async fn status(&self) -> Result<EngineStatus, EngineError>;
}
