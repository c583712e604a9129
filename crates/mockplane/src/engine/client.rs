//! HTTP client for the engine's admin API.

use super::{EngineError, EngineGateway, EngineStatus};
use crate::mock::Mock;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Error body returned by the engine
#[derive(Debug, Deserialize)]
struct EngineErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Response wrapper for the engine's mock list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MockList {
    Wrapped { mocks: Vec<Mock> },
    Bare(Vec<Mock>),
}

/// Engine gateway over the engine's HTTP admin API
pub struct HttpEngineClient {
    client: Client,
    base_url: String,
}

impl HttpEngineClient {
    /// Create a client for the engine at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn mock_url(&self, id: &str) -> String {
        format!("{}/mocks/{}", self.base_url, id)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, EngineError> {
        let resp = request.send().await.map_err(transport_error)?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(self.handle_error(resp).await)
        }
    }

    /// Turn a non-success response into an engine error
    async fn handle_error(&self, resp: Response) -> EngineError {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<EngineErrorBody>(&text)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .unwrap_or_else(|| {
                if text.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                } else {
                    text
                }
            });
        EngineError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

fn transport_error(err: reqwest::Error) -> EngineError {
    if err.is_connect() {
        EngineError::Transport(format!("cannot connect to engine: {err}"))
    } else if err.is_timeout() {
        EngineError::Transport(format!("engine request timed out: {err}"))
    } else {
        EngineError::Transport(err.to_string())
    }
}

#[async_trait]
impl EngineGateway for HttpEngineClient {
    async fn create_mock(&self, mock: &Mock) -> Result<(), EngineError> {
        let url = format!("{}/mocks", self.base_url);
        self.send(self.client.post(&url).json(mock)).await?;
        Ok(())
    }

    async fn update_mock(&self, id: &str, mock: &Mock) -> Result<(), EngineError> {
        self.send(self.client.put(self.mock_url(id)).json(mock))
            .await?;
        Ok(())
    }

    async fn delete_mock(&self, id: &str) -> Result<(), EngineError> {
        match self.send(self.client.delete(self.mock_url(id))).await {
            Err(EngineError::Rejected { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(EngineError::NotFound(id.to_string()))
            }
            other => other.map(|_| ()),
        }
    }

    async fn get_mock(&self, id: &str) -> Result<Mock, EngineError> {
        let resp = match self.send(self.client.get(self.mock_url(id))).await {
            Err(EngineError::Rejected { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                return Err(EngineError::NotFound(id.to_string()))
            }
            other => other?,
        };
        resp.json()
            .await
            .map_err(|e| EngineError::Transport(format!("failed to parse engine mock: {e}")))
    }

    async fn list_mocks(&self) -> Result<Vec<Mock>, EngineError> {
        let url = format!("{}/mocks", self.base_url);
        let resp = self.send(self.client.get(&url)).await?;
        let list: MockList = resp
            .json()
            .await
            .map_err(|e| EngineError::Transport(format!("failed to parse engine mocks: {e}")))?;
        Ok(match list {
            MockList::Wrapped { mocks } | MockList::Bare(mocks) => mocks,
        })
    }

    async fn status(&self) -> Result<EngineStatus, EngineError> {
        let url = format!("{}/status", self.base_url);
        let resp = self.send(self.client.get(&url)).await?;
        resp.json()
            .await
            .map_err(|e| EngineError::Transport(format!("failed to parse engine status: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_trimmed() {
        let client = HttpEngineClient::new("http://127.0.0.1:4280/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:4280");
        assert_eq!(client.mock_url("http_a"), "http://127.0.0.1:4280/mocks/http_a");
    }

    #[test]
    fn test_mock_list_accepts_both_shapes() {
        let wrapped: MockList = serde_json::from_str(r#"{"mocks": []}"#).unwrap();
        assert!(matches!(wrapped, MockList::Wrapped { mocks } if mocks.is_empty()));
        let bare: MockList = serde_json::from_str("[]").unwrap();
        assert!(matches!(bare, MockList::Bare(mocks) if mocks.is_empty()));
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let client = HttpEngineClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = client.list_mocks().await.unwrap_err();
        assert!(matches!(err, EngineError::Transport(_)));
    }
}
