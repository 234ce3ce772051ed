//! Role domain entities.

pub mod model;
pub mod status;

pub use model::{Role, RolePermission};
pub use status::RoleStatus;
