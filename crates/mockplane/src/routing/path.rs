//! Base-path arithmetic for workspace-scoped routes.

use crate::mock::Workspace;

/// Externally observable path of `path` when served from `workspace_id`.
///
/// The root workspace and workspaces without a base path serve paths as-is.
/// Otherwise the base path is prepended with exactly one `/` between the two.
pub fn effective_path(
    path: &str,
    workspace_id: &str,
    workspace: Option<&Workspace>,
    root_workspace_id: &str,
) -> String {
    if workspace_id == root_workspace_id {
        return path.to_string();
    }
    match workspace.map(|ws| ws.base_path.as_str()) {
        Some(base) if !base.is_empty() => join_base_path(base, path),
        _ => path.to_string(),
    }
}

/// Join a base path and a route path without doubling or dropping the `/`.
pub(crate) fn join_base_path(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let rest = path.trim_start_matches('/');
    if rest.is_empty() && !path.ends_with('/') {
        return base.to_string();
    }
    format!("{base}/{rest}")
}

/// Whether `path` lives inside the namespace rooted at `base_path`.
///
/// Segment-aware: `/payment-apiv2` is not inside `/payment-api`.
pub fn path_invades(path: &str, base_path: &str) -> bool {
    if base_path.is_empty() {
        return false;
    }
    match path.strip_prefix(base_path) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Normalize a user-supplied workspace base path.
///
/// `""` and `"/"` mean "no base path". Otherwise the result has a leading `/`,
/// no trailing `/`, no empty segments and no query or fragment characters.
pub fn normalize_base_path(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.contains('?') || trimmed.contains('#') {
        return Err(format!(
            "base path must not contain query or fragment characters: {trimmed}"
        ));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(format!("base path must not contain whitespace: {trimmed}"));
    }

    let inner = trimmed.trim_start_matches('/').trim_end_matches('/');
    if inner.is_empty() {
        return Ok(String::new());
    }
    if inner.split('/').any(str::is_empty) {
        return Err(format!("base path must not contain empty segments: {trimmed}"));
    }
    if inner.split('/').any(|seg| seg == "." || seg == "..") {
        return Err(format!("base path must not contain dot segments: {trimmed}"));
    }
    Ok(format!("/{inner}"))
}

/// Reject a base path that would overlap another workspace's namespace on the
/// same engine (equal, or one a segment prefix of the other).
pub fn check_base_path_assignment(
    workspace_id: &str,
    base_path: &str,
    engine_id: Option<&str>,
    workspaces: &[Workspace],
) -> Result<(), String> {
    if base_path.is_empty() {
        return Ok(());
    }
    for other in workspaces {
        if other.id == workspace_id || other.base_path.is_empty() {
            continue;
        }
        if other.engine_id.as_deref() != engine_id {
            continue;
        }
        if path_invades(base_path, &other.base_path) || path_invades(&other.base_path, base_path)
        {
            return Err(format!(
                "base path '{}' overlaps workspace '{}' ({})",
                base_path, other.id, other.base_path
            ));
        }
    }
    Ok(())
}
