//! Route collision and namespace shadowing detection across workspaces.
//!
//! Two independent checks run against the effective (base-path-prefixed)
//! routes of all existing mocks:
//!
//! - **Exact collisions**: two mocks in different workspaces resolve to the
//!   same method and effective path. Duplicates inside one workspace are left
//!   to the engine's priority ordering.
//! - **Namespace shadowing**: a root-workspace route that lands inside a
//!   non-root workspace's base path would intercept that workspace's traffic.
//!   Wildcard and parameter segments count, since they match anything at
//!   runtime. This is a raw string check on the route as written.

use super::path::{effective_path, path_invades};
use crate::mock::{Mock, Workspace};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Kind of route collision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CollisionKind {
    /// Same method and effective path in another workspace
    Exact,
    /// Root-workspace route inside a workspace's base path
    NamespaceShadow,
}

impl CollisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionKind::Exact => "exact",
            CollisionKind::NamespaceShadow => "namespaceShadow",
        }
    }
}

/// Two routes, or a route and a workspace namespace, that would overlap.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCollision {
    pub kind: CollisionKind,
    pub method: String,
    pub effective_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_mock_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_mock_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    pub message: String,
}

impl fmt::Display for RouteCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Check `new_mock` against `existing_mocks` for route collisions.
///
/// Returns `None` for mocks that are not path-addressed or lack a method or
/// literal path. A mock whose own identifier already sits at the same
/// effective path is an idempotent update and never collides.
pub fn check_route_collision(
    new_mock: &Mock,
    new_workspace: Option<&Workspace>,
    existing_mocks: &[Mock],
    workspaces: &HashMap<String, Workspace>,
    root_workspace_id: &str,
) -> Option<RouteCollision> {
    let (method, path) = new_mock.route()?;
    if method.is_empty() || path.is_empty() {
        return None;
    }

    let new_ws_id = new_mock.workspace_id.as_str();
    let new_effective = effective_path(path, new_ws_id, new_workspace, root_workspace_id);

    let effective_of = |mock: &Mock| -> Option<(String, String)> {
        let (m, p) = mock.route()?;
        if p.is_empty() {
            return None;
        }
        let ws = workspaces.get(&mock.workspace_id);
        Some((
            m.to_string(),
            effective_path(p, &mock.workspace_id, ws, root_workspace_id),
        ))
    };

    if !new_mock.id.is_empty() {
        let unchanged = existing_mocks
            .iter()
            .filter(|m| m.id == new_mock.id)
            .filter_map(|m| effective_of(m))
            .any(|(_, eff)| eff == new_effective);
        if unchanged {
            return None;
        }
    }

    for existing in existing_mocks.iter().filter(|m| m.id != new_mock.id) {
        if existing.workspace_id == new_ws_id {
            continue;
        }
        let Some((existing_method, existing_effective)) = effective_of(existing) else {
            continue;
        };
        if existing_method.eq_ignore_ascii_case(method) && existing_effective == new_effective {
            return Some(RouteCollision {
                kind: CollisionKind::Exact,
                method: method.to_string(),
                effective_path: new_effective.clone(),
                existing_mock_id: Some(existing.id.clone()),
                existing_mock_name: Some(existing.display_name().to_string()),
                existing_workspace_id: Some(existing.workspace_id.clone()),
                base_path: None,
                message: format!(
                    "{} {} collides with mock '{}' in workspace '{}'",
                    method.to_ascii_uppercase(),
                    new_effective,
                    existing.display_name(),
                    existing.workspace_id
                ),
            });
        }
    }

    if new_ws_id == root_workspace_id {
        // The new root route must stay out of every workspace namespace
        let mut namespaces: Vec<&Workspace> = workspaces
            .values()
            .filter(|ws| ws.id != root_workspace_id && !ws.base_path.is_empty())
            .collect();
        namespaces.sort_by(|a, b| a.id.cmp(&b.id));

        if let Some(ws) = namespaces
            .into_iter()
            .find(|ws| path_invades(&new_effective, &ws.base_path))
        {
            return Some(RouteCollision {
                kind: CollisionKind::NamespaceShadow,
                method: method.to_string(),
                effective_path: new_effective.clone(),
                existing_mock_id: None,
                existing_mock_name: None,
                existing_workspace_id: Some(ws.id.clone()),
                base_path: Some(ws.base_path.clone()),
                message: format!(
                    "{} would shadow the namespace of workspace '{}' ({})",
                    new_effective, ws.id, ws.base_path
                ),
            });
        }
    } else if let Some(base) = new_workspace
        .map(|ws| ws.base_path.as_str())
        .filter(|base| !base.is_empty())
    {
        // The new mock's namespace must not already be claimed by a root route
        let root_mocks = existing_mocks
            .iter()
            .filter(|m| m.id != new_mock.id && m.workspace_id == root_workspace_id);
        for existing in root_mocks {
            let Some((existing_method, existing_effective)) = effective_of(existing) else {
                continue;
            };
            if path_invades(&existing_effective, base) {
                return Some(RouteCollision {
                    kind: CollisionKind::NamespaceShadow,
                    method: existing_method,
                    effective_path: existing_effective.clone(),
                    existing_mock_id: Some(existing.id.clone()),
                    existing_mock_name: Some(existing.display_name().to_string()),
                    existing_workspace_id: Some(existing.workspace_id.clone()),
                    base_path: Some(base.to_string()),
                    message: format!(
                        "root mock '{}' at {} shadows the namespace {} of workspace '{}'",
                        existing.display_name(),
                        existing_effective,
                        base,
                        new_ws_id
                    ),
                });
            }
        }
    }

    None
}
