//! System handlers: root links, health, metrics, engine status.

use crate::admin_api::types::*;
use crate::metrics::collect_metrics;
use crate::sync::ControlPlaneSynchronizer;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use std::sync::Arc;

/// GET / - Links to the API resources
pub fn handle_root(base_url: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "_links": {
            "mocks": {"href": format!("{}/mocks", base_url)},
            "workspaces": {"href": format!("{}/workspaces", base_url)},
            "engine": {"href": format!("{}/engine/status", base_url)},
            "health": {"href": format!("{}/health", base_url)},
            "metrics": {"href": format!("{}/metrics", base_url)}
        }
    });
    json_response(StatusCode::OK, &body)
}

/// GET /health - Health check
pub fn handle_health(sync: Arc<ControlPlaneSynchronizer>) -> Response<Full<Bytes>> {
    let engine = sync.engine().current();
    let body = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "engineConnected": engine.is_some(),
        "engineId": engine.as_ref().map(|e| e.engine_id.clone()),
        "engineConnectedAt": engine.as_ref().map(|e| e.connected_at),
    });
    json_response(StatusCode::OK, &body)
}

/// GET /metrics - Prometheus metrics
pub fn handle_metrics() -> Response<Full<Bytes>> {
    build_response_with_headers(
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        collect_metrics(),
    )
}

/// GET /engine/status - Live engine status, 503 without an engine
pub async fn handle_engine_status(sync: Arc<ControlPlaneSynchronizer>) -> Response<Full<Bytes>> {
    match sync.engine_status().await {
        Ok(status) => json_response(StatusCode::OK, &status),
        Err(e) => sync_error_response(&e),
    }
}
