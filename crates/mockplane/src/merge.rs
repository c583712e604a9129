//! Folding a new gRPC or MQTT mock into the mock that already owns its port.
//!
//! Merges mutate the target in place and stop at the first conflict. Entries
//! merged before the conflict stay in the target, so callers must discard the
//! target on error and never persist it.

use crate::mock::{GrpcSpec, Mock, MockSpec, MockType, MqttSpec};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

/// What a successful merge changed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResult {
    pub target_id: String,
    /// Entries contributed by the source (`service/method` or topic)
    pub added: Vec<String>,
    /// All entries of the target after the merge
    pub total: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MergeError {
    #[error("method {service}/{method} is already defined on this port")]
    ServiceConflict { service: String, method: String },

    #[error("topic '{topic}' is already defined on this port")]
    TopicConflict { topic: String },

    #[error("cannot merge a {source_type} mock into a {target_type} mock")]
    Incompatible {
        target_type: MockType,
        source_type: MockType,
    },
}

/// Merge the services of `source` into `target`.
pub fn merge_grpc(target: &mut GrpcSpec, source: &GrpcSpec) -> Result<Vec<String>, MergeError> {
    let mut added = Vec::new();

    for (service_name, service) in &source.services {
        let Some(existing) = target.services.get_mut(service_name) else {
            added.extend(
                service
                    .methods
                    .keys()
                    .map(|method| format!("{service_name}/{method}")),
            );
            target
                .services
                .insert(service_name.clone(), service.clone());
            continue;
        };

        for (method_name, method) in &service.methods {
            if existing.methods.contains_key(method_name) {
                return Err(MergeError::ServiceConflict {
                    service: service_name.clone(),
                    method: method_name.clone(),
                });
            }
            existing.methods.insert(method_name.clone(), method.clone());
            added.push(format!("{service_name}/{method_name}"));
        }
    }

    extend_unique(&mut target.proto_files, &source.proto_files);
    extend_unique(&mut target.import_paths, &source.import_paths);

    Ok(added)
}

/// Append the topics of `source` to `target`.
pub fn merge_mqtt(target: &mut MqttSpec, source: &MqttSpec) -> Result<Vec<String>, MergeError> {
    let mut added = Vec::new();

    for topic in &source.topics {
        if target.topics.iter().any(|t| t.topic == topic.topic) {
            return Err(MergeError::TopicConflict {
                topic: topic.topic.clone(),
            });
        }
        target.topics.push(topic.clone());
        added.push(topic.topic.clone());
    }

    Ok(added)
}

/// Merge `source` into `target` by protocol and stamp the target's update time.
pub fn merge_into(target: &mut Mock, source: &Mock) -> Result<MergeResult, MergeError> {
    let added = match (&mut target.spec, &source.spec) {
        (MockSpec::Grpc { grpc: into }, MockSpec::Grpc { grpc: from }) => merge_grpc(into, from)?,
        (MockSpec::Mqtt { mqtt: into }, MockSpec::Mqtt { mqtt: from }) => merge_mqtt(into, from)?,
        _ => {
            return Err(MergeError::Incompatible {
                target_type: target.mock_type(),
                source_type: source.mock_type(),
            })
        }
    };

    target.updated_at = Some(Utc::now());

    Ok(MergeResult {
        target_id: target.id.clone(),
        added,
        total: entries(target),
    })
}

/// Mergeable entries of a mock: `service/method` pairs or topics.
pub fn entries(mock: &Mock) -> Vec<String> {
    match &mock.spec {
        MockSpec::Grpc { grpc } => grpc
            .services
            .iter()
            .flat_map(|(service, s)| s.methods.keys().map(move |m| format!("{service}/{m}")))
            .collect(),
        MockSpec::Mqtt { mqtt } => mqtt.topics.iter().map(|t| t.topic.clone()).collect(),
        _ => Vec::new(),
    }
}

fn extend_unique(into: &mut Vec<String>, from: &[String]) {
    for item in from {
        if !into.contains(item) {
            into.push(item.clone());
        }
    }
}
