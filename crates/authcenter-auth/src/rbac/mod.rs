//! Role-based access control: permission aggregation and access checks.

pub mod resolver;

pub use resolver::{PermissionResolver, ResolvedAccess};
