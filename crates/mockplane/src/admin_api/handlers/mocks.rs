//! Mock CRUD handlers.

use crate::admin_api::types::*;
use crate::mock::{Mock, MockPatch, MockType};
use crate::sync::{ControlPlaneSynchronizer, CreateOutcome};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::fmt::Display;
use std::sync::Arc;
use tracing::info;

/// Bulk payload: a bare array or `{"mocks": [...]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BulkRequest {
    Wrapped { mocks: Vec<Mock> },
    Bare(Vec<Mock>),
}

/// GET /mocks - List mocks, filtered by query parameters
pub async fn handle_list(
    sync: Arc<ControlPlaneSynchronizer>,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    let filter = match QueryParams::parse(query).mock_filter() {
        Ok(f) => f,
        Err(e) => return bad_request(&e),
    };

    match sync.list(&filter).await {
        Ok(mocks) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "mocks": mocks, "count": mocks.len() }),
        ),
        Err(e) => sync_error_response(&e),
    }
}

/// POST /mocks - Create a mock (201), or merge it into its port owner (200)
pub async fn handle_create<B>(
    req: Request<B>,
    sync: Arc<ControlPlaneSynchronizer>,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Display,
{
    let mock: Mock = match read_json(req, "mock").await {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    match sync.create(mock).await {
        Ok(CreateOutcome::Created(mock)) => json_response(StatusCode::CREATED, &mock),
        Ok(CreateOutcome::Merged { target, result }) => json_response(
            StatusCode::OK,
            &serde_json::json!({
                "merged": true,
                "targetId": result.target_id,
                "added": result.added,
                "total": result.total,
                "mock": target,
            }),
        ),
        Err(e) => sync_error_response(&e),
    }
}

/// DELETE /mocks - Delete all mocks, or only those of `?type=`
pub async fn handle_delete_all(
    sync: Arc<ControlPlaneSynchronizer>,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    let params = QueryParams::parse(query);
    let result = match params.get("type").filter(|t| !t.is_empty()) {
        Some(raw) => match raw.parse::<MockType>() {
            Ok(mock_type) => sync.delete_by_type(mock_type).await,
            Err(e) => return bad_request(&e),
        },
        None => sync.delete_all().await,
    };

    match result {
        Ok(deleted) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "count": deleted.len(), "deleted": deleted }),
        ),
        Err(e) => sync_error_response(&e),
    }
}

/// POST /mocks/bulk - Create a batch atomically, `?replace=true` to overwrite
pub async fn handle_bulk<B>(
    req: Request<B>,
    query: Option<&str>,
    sync: Arc<ControlPlaneSynchronizer>,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Display,
{
    let replace = QueryParams::parse(query).flag("replace");
    let batch: BulkRequest = match read_json(req, "bulk").await {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let mocks = match batch {
        BulkRequest::Wrapped { mocks } | BulkRequest::Bare(mocks) => mocks,
    };
    if mocks.is_empty() {
        return bad_request("Bulk request contains no mocks");
    }

    match sync.bulk_create(mocks, replace).await {
        Ok(outcome) => {
            info!(count = outcome.created.len(), replace, "Bulk create via admin API");
            json_response(StatusCode::CREATED, &outcome)
        }
        Err(e) => sync_error_response(&e),
    }
}

/// GET /mocks/{id}
pub async fn handle_get(id: &str, sync: Arc<ControlPlaneSynchronizer>) -> Response<Full<Bytes>> {
    match sync.get(id).await {
        Ok(mock) => json_response(StatusCode::OK, &mock),
        Err(e) => sync_error_response(&e),
    }
}

/// PUT /mocks/{id} - Replace a mock
pub async fn handle_update<B>(
    id: &str,
    req: Request<B>,
    sync: Arc<ControlPlaneSynchronizer>,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Display,
{
    let mock: Mock = match read_json(req, "mock").await {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    match sync.update(id, mock).await {
        Ok(updated) => json_response(StatusCode::OK, &updated),
        Err(e) => sync_error_response(&e),
    }
}

/// PATCH /mocks/{id} - Partial update of metadata fields
pub async fn handle_patch<B>(
    id: &str,
    req: Request<B>,
    sync: Arc<ControlPlaneSynchronizer>,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Display,
{
    let patch: MockPatch = match read_json(req, "patch").await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match sync.patch(id, patch).await {
        Ok(patched) => json_response(StatusCode::OK, &patched),
        Err(e) => sync_error_response(&e),
    }
}

/// DELETE /mocks/{id}
pub async fn handle_delete(id: &str, sync: Arc<ControlPlaneSynchronizer>) -> Response<Full<Bytes>> {
    match sync.delete(id).await {
        Ok(()) => build_response(StatusCode::NO_CONTENT, Bytes::new()),
        Err(e) => sync_error_response(&e),
    }
}
