//! Copy-on-write rewriting of mocks into their engine-facing form.

use super::path::{effective_path, join_base_path};
use crate::mock::{Mock, MockSpec, Workspace};
use std::borrow::Cow;

/// The mock as the engine should see it, with the workspace base path applied
/// to every path-bearing field.
///
/// Borrowed when nothing needs rewriting: root workspace, no base path, or a
/// mock that is not path-addressed. The input is never mutated.
pub fn prefix_for_engine<'a>(
    mock: &'a Mock,
    workspace: Option<&Workspace>,
    root_workspace_id: &str,
) -> Cow<'a, Mock> {
    if mock.workspace_id == root_workspace_id || !mock.mock_type().is_path_addressed() {
        return Cow::Borrowed(mock);
    }
    let Some(ws) = workspace.filter(|ws| !ws.base_path.is_empty()) else {
        return Cow::Borrowed(mock);
    };

    let prefix = |path: &str| effective_path(path, &mock.workspace_id, Some(ws), root_workspace_id);

    let spec = match &mock.spec {
        MockSpec::Http { http } => {
            let mut http = http.clone();
            if !http.matcher.path.is_empty() {
                http.matcher.path = prefix(&http.matcher.path);
            }
            http.matcher.path_pattern = http
                .matcher
                .path_pattern
                .as_deref()
                .map(|pattern| prefix_pattern(pattern, &ws.base_path));
            MockSpec::Http { http }
        }
        MockSpec::WebSocket { websocket } => {
            let mut websocket = websocket.clone();
            websocket.path = prefix(&websocket.path);
            MockSpec::WebSocket { websocket }
        }
        MockSpec::GraphQL { graphql } => {
            let mut graphql = graphql.clone();
            graphql.path = prefix(&graphql.path);
            MockSpec::GraphQL { graphql }
        }
        MockSpec::Soap { soap } => {
            let mut soap = soap.clone();
            soap.path = prefix(&soap.path);
            MockSpec::Soap { soap }
        }
        MockSpec::Grpc { .. } | MockSpec::Mqtt { .. } | MockSpec::OAuth { .. } => {
            return Cow::Borrowed(mock)
        }
    };

    Cow::Owned(Mock {
        spec,
        ..mock.clone()
    })
}

/// Insert the base path as a literal prefix of a regex path pattern, after a
/// leading `^` anchor when there is one.
fn prefix_pattern(pattern: &str, base_path: &str) -> String {
    match pattern.strip_prefix('^') {
        Some(rest) => format!("^{}", join_base_path(base_path, rest)),
        None => join_base_path(base_path, pattern),
    }
}
