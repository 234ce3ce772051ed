//! Permission domain entities.

pub mod model;

pub use model::{Permission, permission_key};
