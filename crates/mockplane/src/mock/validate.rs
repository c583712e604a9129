//! Structural validation of mock specifications.
//!
//! Only shape is checked here. Matchers, proto files and payloads are the
//! engine's business.

use super::types::{Mock, MockSpec};

/// Check that the protocol spec carries the fields its type needs.
pub fn validate_spec(mock: &Mock) -> Result<(), String> {
    match &mock.spec {
        MockSpec::Http { http } => {
            if http.matcher.method.trim().is_empty() {
                return Err("http.matcher.method is required".to_string());
            }
            if http.matcher.path.is_empty() && http.matcher.path_pattern.is_none() {
                return Err("http.matcher.path or http.matcher.pathPattern is required".to_string());
            }
            if !http.matcher.path.is_empty() {
                check_path("http.matcher.path", &http.matcher.path)?;
            }
            Ok(())
        }
        MockSpec::WebSocket { websocket } => check_path("websocket.path", &websocket.path),
        MockSpec::GraphQL { graphql } => check_path("graphql.path", &graphql.path),
        MockSpec::Soap { soap } => check_path("soap.path", &soap.path),
        MockSpec::Grpc { grpc } => {
            if grpc.port == 0 {
                return Err("grpc.port is required".to_string());
            }
            if grpc.services.is_empty() {
                return Err("grpc.services must define at least one service".to_string());
            }
            if grpc.services.keys().any(|name| name.trim().is_empty()) {
                return Err("grpc service names must not be empty".to_string());
            }
            Ok(())
        }
        MockSpec::Mqtt { mqtt } => {
            if mqtt.port == 0 {
                return Err("mqtt.port is required".to_string());
            }
            if mqtt.topics.is_empty() {
                return Err("mqtt.topics must define at least one topic".to_string());
            }
            if mqtt.topics.iter().any(|t| t.topic.trim().is_empty()) {
                return Err("mqtt topic names must not be empty".to_string());
            }
            if let Some(t) = mqtt.topics.iter().find(|t| t.qos > 2) {
                return Err(format!("mqtt topic '{}' has invalid qos {}", t.topic, t.qos));
            }
            Ok(())
        }
        MockSpec::OAuth { oauth } => {
            if oauth.issuer.trim().is_empty() {
                Err("oauth.issuer is required".to_string())
            } else {
                Ok(())
            }
        }
    }
}

fn check_path(field: &str, path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err(format!("{field} is required"));
    }
    if !path.starts_with('/') {
        return Err(format!("{field} must start with '/': {path}"));
    }
    Ok(())
}
