//! # authcenter-database
//!
//! Collaborator interfaces for principal, role and session persistence,
//! with PostgreSQL adapters for production and in-memory adapters for
//! tests and single-node deployments.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use connection::{DatabasePool, SchemaState};
pub use repositories::{RoleRepository, SessionRepository, UserRepository};
