//! Workspace identifiers and workspaces created at startup.

use crate::mock::Workspace;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspacesConfig {
    /// Workspace served without a base path
    #[serde(default = "default_workspace_id")]
    pub root_id: String,
    /// Workspace for mocks that do not name one
    #[serde(default = "default_workspace_id")]
    pub default_id: String,
    /// Workspaces registered on startup
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seed: Vec<Workspace>,
}

fn default_workspace_id() -> String {
    "local".to_string()
}

impl Default for WorkspacesConfig {
    fn default() -> Self {
        Self {
            root_id: default_workspace_id(),
            default_id: default_workspace_id(),
            seed: Vec::new(),
        }
    }
}
