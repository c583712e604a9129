//! Configuration for the mockplane control plane.

mod listen;
mod workspaces;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use listen::{AdminConfig, EngineConfig};
pub use workspaces::WorkspacesConfig;

use crate::routing::normalize_base_path;
use crate::sync::SyncSettings;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub workspaces: WorkspacesConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.admin.port == 0 {
            anyhow::bail!("admin.port must be non-zero");
        }

        if let Some(url) = &self.engine.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!(
                    "Unsupported engine URL: '{}'. Expected an http:// or https:// URL",
                    url
                );
            }
        }
        if self.engine.timeout_ms == 0 {
            anyhow::bail!("engine.timeoutMs must be greater than zero");
        }

        if self.workspaces.root_id.trim().is_empty() {
            anyhow::bail!("workspaces.rootId must not be empty");
        }
        if self.workspaces.default_id.trim().is_empty() {
            anyhow::bail!("workspaces.defaultId must not be empty");
        }

        let mut seen = std::collections::HashSet::new();
        for ws in &self.workspaces.seed {
            if ws.id.trim().is_empty() {
                anyhow::bail!("Seeded workspaces need an id");
            }
            if !seen.insert(ws.id.as_str()) {
                anyhow::bail!("Workspace '{}' is seeded more than once", ws.id);
            }
            let base = normalize_base_path(&ws.base_path)
                .map_err(|e| anyhow::anyhow!("Workspace '{}': {}", ws.id, e))?;
            if ws.id == self.workspaces.root_id && !base.is_empty() {
                anyhow::bail!("Root workspace '{}' cannot have a base path", ws.id);
            }
        }

        Ok(())
    }

    /// Workspace settings for the synchronizer
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            root_workspace_id: self.workspaces.root_id.clone(),
            default_workspace_id: self.workspaces.default_id.clone(),
        }
    }
}
