//! Route dispatch logic for the Admin API.

use crate::admin_api::handlers::{mocks, system, workspaces};
use crate::admin_api::types::{method_not_allowed, not_found};
use crate::sync::ControlPlaneSynchronizer;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Method, Request, Response};
use std::fmt::Display;
use std::sync::Arc;
use tracing::debug;

/// Parsed admin route, independent of the HTTP method
#[derive(Debug, PartialEq)]
enum AdminRoute {
    /// GET /
    Root,
    /// GET /health
    Health,
    /// GET /metrics
    Metrics,
    /// GET /engine/status
    EngineStatus,
    /// GET/POST/DELETE /mocks
    Mocks,
    /// POST /mocks/bulk
    MocksBulk,
    /// GET/PUT/PATCH/DELETE /mocks/:id
    Mock(String),
    /// GET/POST /workspaces
    Workspaces,
}

impl AdminRoute {
    fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').skip(1).collect();
        match segments.as_slice() {
            [] => Some(AdminRoute::Root),
            ["health"] => Some(AdminRoute::Health),
            ["metrics"] => Some(AdminRoute::Metrics),
            ["engine", "status"] => Some(AdminRoute::EngineStatus),
            ["mocks"] => Some(AdminRoute::Mocks),
            ["mocks", "bulk"] => Some(AdminRoute::MocksBulk),
            ["mocks", id] if !id.is_empty() => Some(AdminRoute::Mock(
                urlencoding::decode(id)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| id.to_string()),
            )),
            ["workspaces"] => Some(AdminRoute::Workspaces),
            _ => None,
        }
    }
}

/// Main request router
pub async fn route_request<B>(
    req: Request<B>,
    sync: Arc<ControlPlaneSynchronizer>,
) -> Result<Response<Full<Bytes>>, hyper::Error>
where
    B: Body,
    B::Error: Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|s| s.to_string());
    let base_url = get_base_url(&req);

    debug!("Admin API: {} {}", method, path);

    let response = route_by_path(&method, &path, query.as_deref(), req, &base_url, sync).await;
    Ok(response)
}

/// Extract base URL from request headers for resource links
fn get_base_url<B>(req: &Request<B>) -> String {
    if let Some(host) = req.headers().get("host") {
        if let Ok(host_str) = host.to_str() {
            return format!("http://{}", host_str);
        }
    }
    "http://localhost:4290".to_string()
}

/// Route based on path
async fn route_by_path<B>(
    method: &Method,
    path: &str,
    query: Option<&str>,
    req: Request<B>,
    base_url: &str,
    sync: Arc<ControlPlaneSynchronizer>,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Display,
{
    let Some(route) = AdminRoute::parse(path) else {
        return not_found();
    };

    match (method, route) {
        (&Method::GET, AdminRoute::Root) => system::handle_root(base_url),
        (&Method::GET, AdminRoute::Health) => system::handle_health(sync),
        (&Method::GET, AdminRoute::Metrics) => system::handle_metrics(),
        (&Method::GET, AdminRoute::EngineStatus) => system::handle_engine_status(sync).await,

        // /mocks
        (&Method::GET, AdminRoute::Mocks) => mocks::handle_list(sync, query).await,
        (&Method::POST, AdminRoute::Mocks) => mocks::handle_create(req, sync).await,
        (&Method::DELETE, AdminRoute::Mocks) => mocks::handle_delete_all(sync, query).await,

        // /mocks/bulk
        (&Method::POST, AdminRoute::MocksBulk) => mocks::handle_bulk(req, query, sync).await,

        // /mocks/:id
        (&Method::GET, AdminRoute::Mock(id)) => mocks::handle_get(&id, sync).await,
        (&Method::PUT, AdminRoute::Mock(id)) => mocks::handle_update(&id, req, sync).await,
        (&Method::PATCH, AdminRoute::Mock(id)) => mocks::handle_patch(&id, req, sync).await,
        (&Method::DELETE, AdminRoute::Mock(id)) => mocks::handle_delete(&id, sync).await,

        // /workspaces
        (&Method::GET, AdminRoute::Workspaces) => workspaces::handle_list(sync).await,
        (&Method::POST, AdminRoute::Workspaces) => workspaces::handle_create(req, sync).await,

        _ => method_not_allowed(),
    }
}
