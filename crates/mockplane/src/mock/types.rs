//! Type definitions for mocks and workspaces.
//!
//! A mock's protocol type and its protocol-specific specification are a single
//! tagged union ([`MockSpec`]), so a mock can never carry a spec that does not
//! match its declared type. On the wire this is `{"type": "http", "http": {...}}`.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Length of the random suffix in generated mock identifiers.
const ID_SUFFIX_LEN: usize = 16;

// ============================================================================
// Mock Types
// ============================================================================

/// Protocol type of a mock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MockType {
    Http,
    WebSocket,
    GraphQL,
    Grpc,
    Soap,
    Mqtt,
    OAuth,
}

impl MockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MockType::Http => "http",
            MockType::WebSocket => "websocket",
            MockType::GraphQL => "graphql",
            MockType::Grpc => "grpc",
            MockType::Soap => "soap",
            MockType::Mqtt => "mqtt",
            MockType::OAuth => "oauth",
        }
    }

    /// Types whose externally observable address is a request path.
    pub fn is_path_addressed(&self) -> bool {
        matches!(
            self,
            MockType::Http | MockType::WebSocket | MockType::GraphQL | MockType::Soap
        )
    }

    /// Types that own a dedicated listener port.
    pub fn uses_dedicated_port(&self) -> bool {
        matches!(self, MockType::Grpc | MockType::Mqtt)
    }
}

impl fmt::Display for MockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(MockType::Http),
            "websocket" => Ok(MockType::WebSocket),
            "graphql" => Ok(MockType::GraphQL),
            "grpc" => Ok(MockType::Grpc),
            "soap" => Ok(MockType::Soap),
            "mqtt" => Ok(MockType::Mqtt),
            "oauth" => Ok(MockType::OAuth),
            other => Err(format!("unknown mock type: {other}")),
        }
    }
}

/// Generate a type-prefixed identifier such as `http_k3v9...`
pub fn new_mock_id(mock_type: MockType) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{}_{}", mock_type.as_str(), suffix)
}

/// A mock definition as stored by the control plane and served by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mock {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub workspace_id: String,
    /// Folder the mock is organized under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Absent means enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Ordering key, more negative sorts first (newest-first by default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<i64>,
    #[serde(flatten)]
    pub spec: MockSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Mock {
    /// Build a mock with only the spec set; everything else is left for the
    /// control plane to assign.
    pub fn new(spec: MockSpec) -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: None,
            workspace_id: String::new(),
            parent_id: None,
            enabled: None,
            sort_key: None,
            spec,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn in_workspace(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = workspace_id.into();
        self
    }

    pub fn mock_type(&self) -> MockType {
        self.spec.mock_type()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Method and literal path of a path-addressed mock.
    pub fn route(&self) -> Option<(&str, &str)> {
        self.spec.route()
    }

    /// Name used in conflict reports, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Protocol-specific specification, tagged by the mock type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MockSpec {
    Http { http: HttpSpec },
    WebSocket { websocket: WebSocketSpec },
    GraphQL { graphql: GraphQLSpec },
    Grpc { grpc: GrpcSpec },
    Soap { soap: SoapSpec },
    Mqtt { mqtt: MqttSpec },
    OAuth { oauth: OAuthSpec },
}

impl MockSpec {
    pub fn mock_type(&self) -> MockType {
        match self {
            MockSpec::Http { .. } => MockType::Http,
            MockSpec::WebSocket { .. } => MockType::WebSocket,
            MockSpec::GraphQL { .. } => MockType::GraphQL,
            MockSpec::Grpc { .. } => MockType::Grpc,
            MockSpec::Soap { .. } => MockType::Soap,
            MockSpec::Mqtt { .. } => MockType::Mqtt,
            MockSpec::OAuth { .. } => MockType::OAuth,
        }
    }

    /// Route method and path. WebSocket upgrades are GETs, GraphQL and SOAP
    /// endpoints are POSTs.
    pub fn route(&self) -> Option<(&str, &str)> {
        match self {
            MockSpec::Http { http } => Some((&http.matcher.method, &http.matcher.path)),
            MockSpec::WebSocket { websocket } => Some(("GET", &websocket.path)),
            MockSpec::GraphQL { graphql } => Some(("POST", &graphql.path)),
            MockSpec::Soap { soap } => Some(("POST", &soap.path)),
            MockSpec::Grpc { .. } | MockSpec::Mqtt { .. } | MockSpec::OAuth { .. } => None,
        }
    }

    /// Dedicated listener port, 0 when unset or not applicable.
    pub fn port(&self) -> u16 {
        match self {
            MockSpec::Grpc { grpc } => grpc.port,
            MockSpec::Mqtt { mqtt } => mqtt.port,
            _ => 0,
        }
    }
}

// ============================================================================
// Protocol Specs
// ============================================================================

/// HTTP mock: request matcher plus canned response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpSpec {
    #[serde(default)]
    pub priority: i32,
    pub matcher: HttpMatcher,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
}

/// Request matcher for HTTP mocks. Evaluated by the engine, only the method
/// and path fields matter to the control plane.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpMatcher {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub path: String,
    /// Regex alternative to `path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub query_params: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketSpec {
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subprotocols: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matchers: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLSpec {
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolvers: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoapSpec {
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wsdl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<serde_json::Value>,
}

/// gRPC server mock. Several services can share one server port.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcSpec {
    #[serde(default)]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proto_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub import_paths: Vec<String>,
    #[serde(default)]
    pub services: BTreeMap<String, GrpcService>,
    #[serde(default)]
    pub reflection: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcService {
    #[serde(default)]
    pub methods: BTreeMap<String, GrpcMethod>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcMethod {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

/// MQTT broker mock. Several topics can share one broker port.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MqttSpec {
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub topics: Vec<MqttTopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MqttTopic {
    pub topic: String,
    #[serde(default)]
    pub qos: u8,
    #[serde(default)]
    pub retain: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<serde_json::Value>,
}

/// Issuer-based OAuth/OIDC provider mock, addressed by issuer URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthSpec {
    #[serde(default)]
    pub issuer: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clients: Vec<serde_json::Value>,
}

// ============================================================================
// Workspaces
// ============================================================================

/// A routing namespace. Non-root workspaces nest their routes under `base_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_path: String,
    /// Engine this workspace is served by; workspaces sharing an engine share
    /// its port space
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_id: Option<String>,
}

impl Workspace {
    pub fn new(id: impl Into<String>, base_path: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            base_path: base_path.into(),
            engine_id: None,
        }
    }

    pub fn on_engine(mut self, engine_id: impl Into<String>) -> Self {
        self.engine_id = Some(engine_id.into());
        self
    }
}
