//! Response helpers and request parsing for the Admin API.

use crate::mock::MockType;
use crate::store::MockFilter;
use crate::sync::SyncError;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<serde_json::Value>,
}

/// Query string parameters, percent-decoded
#[derive(Debug, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse query parameters from query string
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .unwrap_or_default()
            .split('&')
            .filter(|param| !param.is_empty())
            .map(|param| {
                let (key, value) = param.split_once('=').unwrap_or((param, ""));
                (decode(key), decode(value))
            })
            .collect();
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `true` only for `key=true` (or a bare `key`)
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some("true") | Some(""))
    }

    /// Build a mock list filter from `type`, `workspaceId`, `parentId`,
    /// `enabled` and `search`.
    pub fn mock_filter(&self) -> Result<MockFilter, String> {
        let mock_type = self
            .get("type")
            .filter(|t| !t.is_empty())
            .map(str::parse::<MockType>)
            .transpose()?;
        let enabled = match self.get("enabled") {
            None | Some("") => None,
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(other) => return Err(format!("invalid enabled filter: {other}")),
        };
        let owned = |key: &str| self.get(key).filter(|v| !v.is_empty()).map(str::to_string);
        Ok(MockFilter {
            mock_type,
            parent_id: owned("parentId"),
            enabled,
            workspace_id: owned("workspaceId"),
            search: owned("search"),
        })
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

// =============================================================================
// Response helper functions
// =============================================================================

/// Create a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string_pretty(body).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(status, [("Content-Type", "application/json")], json)
}

/// Build an HTTP response with the given status and body.
pub fn build_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Build an HTTP response with headers.
///
/// Falls back to a bare 500 body if the builder rejects a header.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Create an error response
pub fn error_response(status: StatusCode, code: &str, message: &str) -> Response<Full<Bytes>> {
    let error = ErrorResponse {
        error: code.to_string(),
        message: message.to_string(),
        conflicts: None,
    };
    json_response(status, &error)
}

/// Map a control-plane error to its status, code and conflict details
pub fn sync_error_response(err: &SyncError) -> Response<Full<Bytes>> {
    let error = ErrorResponse {
        error: err.code().to_string(),
        message: err.to_string(),
        conflicts: err.conflicts(),
    };
    json_response(err.status_code(), &error)
}

/// Create a bad request response
pub fn bad_request(message: &str) -> Response<Full<Bytes>> {
    error_response(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// Create a not found response
pub fn not_found() -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_FOUND, "not_found", "Not Found")
}

/// Create a method not allowed response
pub fn method_not_allowed() -> Response<Full<Bytes>> {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "method_not_allowed",
        "Method Not Allowed",
    )
}

/// Collect request body into bytes
pub async fn collect_body<B>(req: Request<B>) -> Result<Bytes, String>
where
    B: Body,
    B::Error: Display,
{
    use http_body_util::BodyExt;
    req.into_body()
        .collect()
        .await
        .map(|c| c.to_bytes())
        .map_err(|e| format!("Failed to read request body: {e}"))
}

/// Read and deserialize a JSON request body, or produce the 400 to return
pub async fn read_json<T, B>(req: Request<B>, what: &str) -> Result<T, Response<Full<Bytes>>>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Display,
{
    let body = collect_body(req).await.map_err(|e| bad_request(&e))?;
    serde_json::from_slice(&body).map_err(|e| bad_request(&format!("Invalid {what} JSON: {e}")))
}
