//! Workspace-scoped request routing.
//!
//! Pure functions, no I/O:
//!
//! - `path`: effective paths, namespace containment, base path normalization
//! - `prefix`: engine-facing copies of mocks with base paths applied
//! - `collision`: exact route collisions and namespace shadowing

mod collision;
mod path;
mod prefix;

pub use collision::{check_route_collision, CollisionKind, RouteCollision};
pub use path::{check_base_path_assignment, effective_path, normalize_base_path, path_invades};
pub use prefix::prefix_for_engine;
