//! Admin REST API for the control plane.
//!
//! This module provides:
//! - Creating, updating, patching and deleting mocks, singly or in bulk
//! - Listing and creating workspaces
//! - Engine status, health and metrics endpoints
//!
//! The API listens on a configurable port (default: 4290).

mod handlers;
mod router;
mod server;
mod types;

pub use router::route_request;
pub use server::AdminApiServer;
