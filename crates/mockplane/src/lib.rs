//! Mockplane: control plane for a multi-protocol mock server.
//!
//! Mocks are stored in a [`store::MockStore`] and pushed to a data-plane engine
//! through an [`engine::EngineGateway`]. The [`sync::ControlPlaneSynchronizer`]
//! keeps the two in step, arbitrating dedicated ports ([`port`]), merging
//! mocks that share a port ([`merge`]) and keeping workspace routes apart
//! ([`routing`]).

pub mod admin_api;
pub mod config;
pub mod engine;
pub mod merge;
pub mod metrics;
pub mod mock;
pub mod port;
pub mod routing;
pub mod store;
pub mod sync;

#[cfg(test)]
mod test_support;
