//! Workspace handlers.

use crate::admin_api::types::*;
use crate::mock::Workspace;
use crate::sync::ControlPlaneSynchronizer;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use std::fmt::Display;
use std::sync::Arc;

/// GET /workspaces - List workspaces
pub async fn handle_list(sync: Arc<ControlPlaneSynchronizer>) -> Response<Full<Bytes>> {
    match sync.list_workspaces().await {
        Ok(workspaces) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "workspaces": workspaces }),
        ),
        Err(e) => sync_error_response(&e),
    }
}

/// POST /workspaces - Create a workspace
pub async fn handle_create<B>(
    req: Request<B>,
    sync: Arc<ControlPlaneSynchronizer>,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Display,
{
    let workspace: Workspace = match read_json(req, "workspace").await {
        Ok(ws) => ws,
        Err(resp) => return resp,
    };

    match sync.create_workspace(workspace).await {
        Ok(created) => json_response(StatusCode::CREATED, &created),
        Err(e) => sync_error_response(&e),
    }
}
