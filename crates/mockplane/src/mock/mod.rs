//! Mock and workspace data model.
//!
//! - `types`: mocks, protocol specs and workspaces
//! - `patch`: typed partial updates
//! - `validate`: structural checks on protocol specs

mod patch;
mod types;
mod validate;

pub use patch::MockPatch;
pub use types::{
    new_mock_id, GraphQLSpec, GrpcMethod, GrpcService, GrpcSpec, HttpMatcher, HttpSpec, Mock,
    MockSpec, MockType, MqttSpec, MqttTopic, OAuthSpec, SoapSpec, WebSocketSpec, Workspace,
};
pub use validate::validate_spec;
