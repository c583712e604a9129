//! Request handlers, grouped by resource.

pub mod mocks;
pub mod system;
pub mod workspaces;
