//! # authcenter-core
//!
//! Core crate for AuthCenter. Contains configuration schemas, the unified
//! error system, deadline helpers, and collaborator traits that need no
//! domain entities.
//!
//! This crate has **no** internal dependencies on other AuthCenter crates.

pub mod config;
pub mod deadline;
pub mod error;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
